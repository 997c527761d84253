//! SyntaxKind enum - all token and node kinds in the quill syntax tree.

use std::fmt;

/// The kind of a syntax token or node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SyntaxKind {
    // ========================================================================
    // Tokens
    // ========================================================================
    Unknown,
    EndOfFileToken,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    Identifier,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    CommaToken,
    ColonToken,
    QuestionToken,

    // Operators
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    PercentToken,
    AsteriskAsteriskToken,
    SlashSlashToken,
    AmpersandToken,
    BarToken,
    CaretToken,
    TildeToken,
    ExclamationToken,
    AmpersandAmpersandToken,
    BarBarToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    LessThanToken,
    LessThanEqualsToken,
    GreaterThanToken,
    GreaterThanEqualsToken,
    PlusPlusToken,
    MinusMinusToken,

    // Assignment
    EqualsToken,
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    SlashEqualsToken,
    PercentEqualsToken,
    AmpersandEqualsToken,
    BarEqualsToken,
    CaretEqualsToken,

    // Keywords
    FnKeyword,
    VarKeyword,
    LetKeyword,
    IfKeyword,
    ElseKeyword,
    WhileKeyword,
    DoKeyword,
    ForKeyword,
    BreakKeyword,
    ContinueKeyword,
    ReturnKeyword,
    TrueKeyword,
    FalseKeyword,
    NewKeyword,

    // ========================================================================
    // Nodes
    // ========================================================================
    CompilationUnit,
    FunctionDeclaration,
    Parameter,
    TypeClause,
    GlobalStatement,

    // Statements
    Block,
    VariableDeclaration,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    BreakStatement,
    ContinueStatement,
    ReturnStatement,
    ExpressionStatement,

    // Expressions
    LiteralExpression,
    NameExpression,
    ParenthesizedExpression,
    UnaryExpression,
    BinaryExpression,
    AssignmentExpression,
    PostfixExpression,
    CallExpression,
    TernaryExpression,
    ArrayCreationExpression,
}

impl SyntaxKind {
    /// The fixed source text of a punctuation or operator token.
    pub fn punctuation_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::OpenBraceToken => "{",
            SyntaxKind::CloseBraceToken => "}",
            SyntaxKind::OpenParenToken => "(",
            SyntaxKind::CloseParenToken => ")",
            SyntaxKind::OpenBracketToken => "[",
            SyntaxKind::CloseBracketToken => "]",
            SyntaxKind::CommaToken => ",",
            SyntaxKind::ColonToken => ":",
            SyntaxKind::QuestionToken => "?",
            SyntaxKind::PlusToken => "+",
            SyntaxKind::MinusToken => "-",
            SyntaxKind::AsteriskToken => "*",
            SyntaxKind::SlashToken => "/",
            SyntaxKind::PercentToken => "%",
            SyntaxKind::AsteriskAsteriskToken => "**",
            SyntaxKind::SlashSlashToken => "//",
            SyntaxKind::AmpersandToken => "&",
            SyntaxKind::BarToken => "|",
            SyntaxKind::CaretToken => "^",
            SyntaxKind::TildeToken => "~",
            SyntaxKind::ExclamationToken => "!",
            SyntaxKind::AmpersandAmpersandToken => "&&",
            SyntaxKind::BarBarToken => "||",
            SyntaxKind::EqualsEqualsToken => "==",
            SyntaxKind::ExclamationEqualsToken => "!=",
            SyntaxKind::LessThanToken => "<",
            SyntaxKind::LessThanEqualsToken => "<=",
            SyntaxKind::GreaterThanToken => ">",
            SyntaxKind::GreaterThanEqualsToken => ">=",
            SyntaxKind::PlusPlusToken => "++",
            SyntaxKind::MinusMinusToken => "--",
            SyntaxKind::EqualsToken => "=",
            SyntaxKind::PlusEqualsToken => "+=",
            SyntaxKind::MinusEqualsToken => "-=",
            SyntaxKind::AsteriskEqualsToken => "*=",
            SyntaxKind::SlashEqualsToken => "/=",
            SyntaxKind::PercentEqualsToken => "%=",
            SyntaxKind::AmpersandEqualsToken => "&=",
            SyntaxKind::BarEqualsToken => "|=",
            SyntaxKind::CaretEqualsToken => "^=",
            _ => return None,
        };
        Some(text)
    }

    /// The source text of a keyword token.
    pub fn keyword_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::FnKeyword => "fn",
            SyntaxKind::VarKeyword => "var",
            SyntaxKind::LetKeyword => "let",
            SyntaxKind::IfKeyword => "if",
            SyntaxKind::ElseKeyword => "else",
            SyntaxKind::WhileKeyword => "while",
            SyntaxKind::DoKeyword => "do",
            SyntaxKind::ForKeyword => "for",
            SyntaxKind::BreakKeyword => "break",
            SyntaxKind::ContinueKeyword => "continue",
            SyntaxKind::ReturnKeyword => "return",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::NewKeyword => "new",
            _ => return None,
        };
        Some(text)
    }

    /// Look up the keyword kind for an identifier-shaped word.
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text {
            "fn" => SyntaxKind::FnKeyword,
            "var" => SyntaxKind::VarKeyword,
            "let" => SyntaxKind::LetKeyword,
            "if" => SyntaxKind::IfKeyword,
            "else" => SyntaxKind::ElseKeyword,
            "while" => SyntaxKind::WhileKeyword,
            "do" => SyntaxKind::DoKeyword,
            "for" => SyntaxKind::ForKeyword,
            "break" => SyntaxKind::BreakKeyword,
            "continue" => SyntaxKind::ContinueKeyword,
            "return" => SyntaxKind::ReturnKeyword,
            "true" => SyntaxKind::TrueKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "new" => SyntaxKind::NewKeyword,
            _ => return None,
        };
        Some(kind)
    }

    /// Fixed text of the token, if it has one.
    pub fn text(self) -> Option<&'static str> {
        self.punctuation_text().or_else(|| self.keyword_text())
    }

    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::FnKeyword && self <= SyntaxKind::NewKeyword
    }

    /// Whether this token is `=` or one of the compound assignment operators.
    pub fn is_assignment_operator(self) -> bool {
        self >= SyntaxKind::EqualsToken && self <= SyntaxKind::CaretEqualsToken
    }

    /// For a compound assignment token, the binary operator it applies.
    pub fn compound_assignment_operator(self) -> Option<SyntaxKind> {
        let op = match self {
            SyntaxKind::PlusEqualsToken => SyntaxKind::PlusToken,
            SyntaxKind::MinusEqualsToken => SyntaxKind::MinusToken,
            SyntaxKind::AsteriskEqualsToken => SyntaxKind::AsteriskToken,
            SyntaxKind::SlashEqualsToken => SyntaxKind::SlashToken,
            SyntaxKind::PercentEqualsToken => SyntaxKind::PercentToken,
            SyntaxKind::AmpersandEqualsToken => SyntaxKind::AmpersandToken,
            SyntaxKind::BarEqualsToken => SyntaxKind::BarToken,
            SyntaxKind::CaretEqualsToken => SyntaxKind::CaretToken,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{}", text),
            None => match self {
                SyntaxKind::EndOfFileToken => write!(f, "end of file"),
                SyntaxKind::IntegerLiteral | SyntaxKind::FloatLiteral => write!(f, "number"),
                SyntaxKind::StringLiteral => write!(f, "string"),
                SyntaxKind::Identifier => write!(f, "identifier"),
                other => write!(f, "{:?}", other),
            },
        }
    }
}
