//! The quill parser implementation.
//!
//! A recursive descent parser. It consumes tokens from the scanner and
//! builds an arena-allocated syntax tree. Nodes that had to be built around
//! missing or malformed tokens are flagged with `THIS_NODE_HAS_ERROR`.

use bumpalo::Bump;
use quill_core::arena::alloc_vec_in;
use quill_core::text::{TextPos, TextSpan};
use quill_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use quill_scanner::Scanner;
use quill_syntax::node::*;
use quill_syntax::{NodeFlags, SyntaxKind, TokenFlags};

use crate::precedence::{
    get_binary_operator_precedence, is_right_associative, is_unary_operator, OperatorPrecedence,
};
use crate::utilities::can_start_expression;

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Parse `text` into a compilation unit allocated in `arena`.
pub fn parse_text<'a>(
    arena: &'a Bump,
    file_name: &str,
    text: &str,
) -> (CompilationUnit<'a>, DiagnosticCollection) {
    Parser::new(arena, file_name, text).parse_compilation_unit()
}

/// The parser produces a CompilationUnit from quill source text.
pub struct Parser<'a> {
    arena: &'a Bump,
    scanner: Scanner,
    file_name: String,
    diagnostics: DiagnosticCollection,
    /// End of the most recently consumed token.
    prev_token_end: TextPos,
    /// Start of the last reported error; a second error there is dropped.
    last_error_pos: Option<TextPos>,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a Bump, file_name: &str, source_text: &str) -> Self {
        Self {
            arena,
            scanner: Scanner::new(source_text),
            file_name: file_name.to_string(),
            diagnostics: DiagnosticCollection::new(),
            prev_token_end: 0,
            last_error_pos: None,
            recursion_depth: 0,
        }
    }

    /// Parse the whole text. Scanner and parser diagnostics come back in
    /// source order, tagged with the file name.
    pub fn parse_compilation_unit(mut self) -> (CompilationUnit<'a>, DiagnosticCollection) {
        self.next_token();

        let mut members = Vec::new();
        while self.current_token() != SyntaxKind::EndOfFileToken {
            let start = self.token_pos();
            members.push(self.parse_member());
            if self.token_pos() == start && self.current_token() != SyntaxKind::EndOfFileToken {
                self.skip_unexpected_token();
            }
        }

        let text = self.scanner.text().to_string();
        let end = text.len() as TextPos;
        let unit = CompilationUnit {
            data: NodeData::new(SyntaxKind::CompilationUnit, 0, end),
            members: alloc_vec_in(self.arena, members),
            file_name: self.file_name.clone(),
            text,
        };

        let mut all: Vec<Diagnostic> = self.scanner.take_diagnostics().into_diagnostics();
        all.extend(self.diagnostics.into_diagnostics());
        all.sort_by_key(|d| d.span.map(|s| s.start));

        let mut diagnostics = DiagnosticCollection::new();
        for diagnostic in all {
            diagnostics.add(diagnostic.in_file(&self.file_name));
        }
        (unit, diagnostics)
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current_token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    fn next_token(&mut self) -> SyntaxKind {
        self.prev_token_end = self.scanner.token_end() as TextPos;
        self.scanner.scan()
    }

    #[inline]
    fn token_pos(&self) -> TextPos {
        self.scanner.token_start() as TextPos
    }

    #[inline]
    fn token_end(&self) -> TextPos {
        self.scanner.token_end() as TextPos
    }

    #[inline]
    fn token_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.token_pos(), self.token_end())
    }

    #[inline]
    fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    /// Node data for a node that started at `pos` and ends at the last consumed token.
    fn finish_node(&self, kind: SyntaxKind, pos: TextPos, valid: bool) -> NodeData {
        let data = NodeData::new(kind, pos, self.prev_token_end.max(pos));
        if valid {
            data
        } else {
            data.with_flags(NodeFlags::THIS_NODE_HAS_ERROR)
        }
    }

    fn error_at(&mut self, span: TextSpan, message: &DiagnosticMessage, args: &[&str]) {
        if self.last_error_pos == Some(span.start) {
            return;
        }
        self.last_error_pos = Some(span.start);
        self.diagnostics.add(Diagnostic::at(span, message, args));
    }

    fn error(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let span = self.token_span();
        self.error_at(span, message, args);
    }

    fn take_token(&mut self) -> Token {
        let token = Token::new(self.current_token(), self.token_pos(), self.token_end());
        self.next_token();
        token
    }

    fn expect_token(&mut self, kind: SyntaxKind) -> Token {
        if self.current_token() == kind {
            return self.take_token();
        }
        let text = kind.to_string();
        self.error(&messages::EXPECTED_TOKEN, &[&text]);
        let pos = self.token_pos();
        Token {
            data: NodeData::new(kind, pos, pos).with_flags(NodeFlags::MISSING),
        }
    }

    /// Expect the closing token for `open`. Running into the end of the file
    /// reports the opening token as never closed.
    fn expect_closing(&mut self, kind: SyntaxKind, open: Token) -> Token {
        if self.current_token() == kind {
            return self.take_token();
        }
        if self.current_token() == SyntaxKind::EndOfFileToken {
            let message = if kind == SyntaxKind::CloseBraceToken {
                &messages::NEVER_CLOSED_CURLY_BRACKETS
            } else {
                &messages::NEVER_CLOSED_PARENTHESIS
            };
            self.error_at(open.span(), message, &[]);
            let pos = self.token_pos();
            return Token {
                data: NodeData::new(kind, pos, pos).with_flags(NodeFlags::MISSING),
            };
        }
        self.expect_token(kind)
    }

    fn optional_token(&mut self, kind: SyntaxKind) -> Option<Token> {
        if self.current_token() == kind {
            Some(self.take_token())
        } else {
            None
        }
    }

    fn expect_identifier(&mut self) -> Identifier<'a> {
        if self.current_token() == SyntaxKind::Identifier {
            let text = self.arena.alloc_str(self.token_value());
            let identifier = Identifier::new(text, self.token_pos(), self.token_end());
            self.next_token();
            return identifier;
        }
        self.error(&messages::EXPECTED_TOKEN, &["identifier"]);
        Identifier::missing(self.token_pos())
    }

    /// Report and consume a token nothing could start with.
    fn skip_unexpected_token(&mut self) {
        if self.current_token() != SyntaxKind::Unknown {
            let text = self.current_token_text();
            self.error(&messages::UNEXPECTED_TOKEN, &[&text]);
        }
        self.next_token();
    }

    fn current_token_text(&self) -> String {
        match self.current_token() {
            SyntaxKind::Identifier | SyntaxKind::IntegerLiteral | SyntaxKind::FloatLiteral => {
                self.token_value().to_string()
            }
            kind => kind.to_string(),
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn parse_member(&mut self) -> Member<'a> {
        if self.current_token() == SyntaxKind::FnKeyword {
            return Member::Function(self.parse_function_declaration());
        }
        let pos = self.token_pos();
        let statement = self.parse_statement();
        Member::GlobalStatement(GlobalStatement {
            data: self.finish_node(SyntaxKind::GlobalStatement, pos, true),
            statement: self.arena.alloc(statement),
        })
    }

    fn parse_function_declaration(&mut self) -> FunctionDeclaration<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::FnKeyword);
        let identifier = self.expect_identifier();
        let open = self.expect_token(SyntaxKind::OpenParenToken);
        let parameters = self.parse_parameters();
        let close = self.expect_closing(SyntaxKind::CloseParenToken, open);
        let return_type = if self.optional_token(SyntaxKind::ColonToken).is_some() {
            Some(self.parse_type_clause())
        } else {
            None
        };
        let body = self.parse_block();
        let valid = identifier.data.is_valid() && open.data.is_valid() && close.data.is_valid();
        FunctionDeclaration {
            data: self.finish_node(SyntaxKind::FunctionDeclaration, pos, valid),
            identifier,
            parameters,
            return_type,
            body,
        }
    }

    fn parse_parameters(&mut self) -> NodeList<'a, Parameter<'a>> {
        let mut parameters = Vec::new();
        while !matches!(
            self.current_token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            let pos = self.token_pos();
            let identifier = self.expect_identifier();
            let colon = self.expect_token(SyntaxKind::ColonToken);
            let type_clause = self.parse_type_clause();
            parameters.push(Parameter {
                data: self.finish_node(
                    SyntaxKind::Parameter,
                    pos,
                    identifier.data.is_valid() && colon.data.is_valid(),
                ),
                identifier,
                type_clause,
            });
            if self.optional_token(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        alloc_vec_in(self.arena, parameters)
    }

    /// `IDENT ('[' ','* ']')*`
    fn parse_type_clause(&mut self) -> TypeClause<'a> {
        let pos = self.token_pos();
        let identifier = self.expect_identifier();
        let mut ranks = Vec::new();
        let mut valid = identifier.data.is_valid();
        while self.is_rank_specifier() {
            let (rank, closed) = self.parse_rank_specifier();
            ranks.push(rank);
            valid &= closed;
        }
        TypeClause {
            data: self.finish_node(SyntaxKind::TypeClause, pos, valid),
            identifier,
            ranks: alloc_vec_in(self.arena, ranks),
        }
    }

    /// Whether the current `[` opens an empty rank specifier such as `[]` or `[,]`.
    fn is_rank_specifier(&mut self) -> bool {
        if self.current_token() != SyntaxKind::OpenBracketToken {
            return false;
        }
        self.scanner.look_ahead(|s| {
            matches!(s.scan(), SyntaxKind::CloseBracketToken | SyntaxKind::CommaToken)
        })
    }

    /// Parse `'[' ','* ']'`, returning the rank and whether `]` was present.
    fn parse_rank_specifier(&mut self) -> (u32, bool) {
        self.expect_token(SyntaxKind::OpenBracketToken);
        let mut rank = 1;
        while self.optional_token(SyntaxKind::CommaToken).is_some() {
            rank += 1;
        }
        let close = self.expect_token(SyntaxKind::CloseBracketToken);
        (rank, close.data.is_valid())
    }

    // ========================================================================
    // Statement parsing
    // ========================================================================

    fn parse_block(&mut self) -> BlockStatement<'a> {
        let pos = self.token_pos();
        let open = self.expect_token(SyntaxKind::OpenBraceToken);
        let mut statements = Vec::new();
        if open.data.is_valid() {
            while !matches!(
                self.current_token(),
                SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
            ) {
                let start = self.token_pos();
                statements.push(self.parse_statement());
                if self.token_pos() == start {
                    self.skip_unexpected_token();
                }
            }
        }
        let close = if open.data.is_valid() {
            self.expect_closing(SyntaxKind::CloseBraceToken, open)
        } else {
            open
        };
        BlockStatement {
            data: self.finish_node(SyntaxKind::Block, pos, open.data.is_valid() && close.data.is_valid()),
            statements: alloc_vec_in(self.arena, statements),
        }
    }

    fn parse_statement(&mut self) -> Statement<'a> {
        self.recursion_depth += 1;
        let statement = if self.recursion_depth > MAX_RECURSION_DEPTH {
            let pos = self.token_pos();
            self.skip_unexpected_token();
            self.missing_expression_statement(pos)
        } else {
            self.parse_statement_worker()
        };
        self.recursion_depth -= 1;
        statement
    }

    fn parse_statement_worker(&mut self) -> Statement<'a> {
        match self.current_token() {
            SyntaxKind::OpenBraceToken => Statement::Block(self.parse_block()),
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword => self.parse_variable_declaration(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_while_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::BreakKeyword => {
                let keyword = self.take_token();
                Statement::Break(JumpStatement {
                    data: NodeData::new(SyntaxKind::BreakStatement, keyword.span().start, keyword.span().end()),
                    keyword,
                })
            }
            SyntaxKind::ContinueKeyword => {
                let keyword = self.take_token();
                Statement::Continue(JumpStatement {
                    data: NodeData::new(SyntaxKind::ContinueStatement, keyword.span().start, keyword.span().end()),
                    keyword,
                })
            }
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_variable_declaration(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        let keyword = self.take_token();
        let identifier = self.expect_identifier();
        let type_clause = if self.optional_token(SyntaxKind::ColonToken).is_some() {
            Some(self.parse_type_clause())
        } else {
            None
        };
        let equals = self.expect_token(SyntaxKind::EqualsToken);
        let initializer = self.parse_expression_and_alloc();
        Statement::VariableDeclaration(VariableDeclaration {
            data: self.finish_node(
                SyntaxKind::VariableDeclaration,
                pos,
                identifier.data.is_valid() && equals.data.is_valid(),
            ),
            keyword,
            identifier,
            type_clause,
            initializer,
        })
    }

    fn parse_if_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::IfKeyword);
        let condition = self.parse_expression_and_alloc();
        let then_statement = self.parse_statement_and_alloc();
        let else_statement = if self.optional_token(SyntaxKind::ElseKeyword).is_some() {
            Some(self.parse_statement_and_alloc())
        } else {
            None
        };
        Statement::If(IfStatement {
            data: self.finish_node(SyntaxKind::IfStatement, pos, true),
            condition,
            then_statement,
            else_statement,
        })
    }

    fn parse_while_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::WhileKeyword);
        let condition = self.parse_expression_and_alloc();
        let body = self.parse_statement_and_alloc();
        Statement::While(WhileStatement {
            data: self.finish_node(SyntaxKind::WhileStatement, pos, true),
            condition,
            body,
        })
    }

    fn parse_do_while_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::DoKeyword);
        let body = self.parse_statement_and_alloc();
        let keyword = self.expect_token(SyntaxKind::WhileKeyword);
        let condition = self.parse_expression_and_alloc();
        Statement::DoWhile(DoWhileStatement {
            data: self.finish_node(SyntaxKind::DoWhileStatement, pos, keyword.data.is_valid()),
            body,
            condition,
        })
    }

    /// `for <statement> <condition> <increment> <body>`
    fn parse_for_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::ForKeyword);
        let initializer = self.parse_statement_and_alloc();
        let condition = self.parse_expression_and_alloc();
        let increment = self.parse_expression_and_alloc();
        let body = self.parse_statement_and_alloc();
        Statement::For(ForStatement {
            data: self.finish_node(SyntaxKind::ForStatement, pos, true),
            initializer,
            condition,
            increment,
            body,
        })
    }

    /// `return` takes a value only when one starts on the same line.
    fn parse_return_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        let keyword = self.take_token();
        let has_value =
            !self.scanner.has_preceding_line_break() && can_start_expression(self.current_token());
        let expression = if has_value {
            Some(self.parse_expression_and_alloc())
        } else {
            None
        };
        Statement::Return(ReturnStatement {
            data: self.finish_node(SyntaxKind::ReturnStatement, pos, true),
            keyword,
            expression,
        })
    }

    fn parse_expression_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        let expression = self.parse_expression_and_alloc();
        Statement::Expression(ExpressionStatement {
            data: self.finish_node(SyntaxKind::ExpressionStatement, pos, true),
            expression,
        })
    }

    fn missing_expression_statement(&mut self, pos: TextPos) -> Statement<'a> {
        let expression = self.arena.alloc(self.missing_name(pos));
        Statement::Expression(ExpressionStatement {
            data: self.finish_node(SyntaxKind::ExpressionStatement, pos, false),
            expression,
        })
    }

    fn parse_statement_and_alloc(&mut self) -> &'a Statement<'a> {
        let statement = self.parse_statement();
        self.arena.alloc(statement)
    }

    // ========================================================================
    // Expression parsing
    // ========================================================================

    fn parse_expression_and_alloc(&mut self) -> &'a Expression<'a> {
        let expression = self.parse_expression();
        self.arena.alloc(expression)
    }

    fn parse_expression(&mut self) -> Expression<'a> {
        self.recursion_depth += 1;
        let expression = if self.recursion_depth > MAX_RECURSION_DEPTH {
            let pos = self.token_pos();
            let text = self.current_token_text();
            self.error(&messages::UNEXPECTED_TOKEN, &[&text]);
            self.missing_name(pos)
        } else {
            self.parse_assignment_expression()
        };
        self.recursion_depth -= 1;
        expression
    }

    /// `IDENT assign-op assignment | ternary`
    fn parse_assignment_expression(&mut self) -> Expression<'a> {
        if self.current_token() == SyntaxKind::Identifier
            && self.scanner.look_ahead(|s| s.scan().is_assignment_operator())
        {
            let pos = self.token_pos();
            let identifier = self.expect_identifier();
            let operator = self.take_token();
            let value = self.parse_expression_and_alloc();
            return Expression::Assignment(AssignmentExpression {
                data: self.finish_node(SyntaxKind::AssignmentExpression, pos, true),
                identifier,
                operator,
                value,
            });
        }
        self.parse_ternary_expression()
    }

    fn parse_ternary_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        let condition = self.parse_binary_expression(OperatorPrecedence::Lowest);
        if self.optional_token(SyntaxKind::QuestionToken).is_none() {
            return condition;
        }
        let when_true = self.parse_expression_and_alloc();
        let colon = self.expect_token(SyntaxKind::ColonToken);
        let when_false = self.parse_expression_and_alloc();
        Expression::Ternary(TernaryExpression {
            data: self.finish_node(SyntaxKind::TernaryExpression, pos, colon.data.is_valid()),
            condition: self.arena.alloc(condition),
            when_true,
            when_false,
        })
    }

    fn parse_binary_expression(&mut self, parent: OperatorPrecedence) -> Expression<'a> {
        let pos = self.token_pos();
        let mut left = if is_unary_operator(self.current_token()) && OperatorPrecedence::Unary >= parent {
            let operator = self.take_token();
            let operand = self.parse_binary_expression(OperatorPrecedence::Unary);
            Expression::Unary(UnaryExpression {
                data: self.finish_node(SyntaxKind::UnaryExpression, pos, true),
                operator,
                operand: self.arena.alloc(operand),
            })
        } else {
            self.parse_postfix_expression()
        };

        loop {
            let kind = self.current_token();
            let Some(precedence) = get_binary_operator_precedence(kind) else {
                break;
            };
            if precedence <= parent {
                break;
            }
            let operator = self.take_token();
            // Right-associative operators accept an equal-precedence right operand.
            let right_parent = if is_right_associative(kind) {
                precedence_below(precedence)
            } else {
                precedence
            };
            let right = self.parse_binary_expression(right_parent);
            left = Expression::Binary(BinaryExpression {
                data: self.finish_node(SyntaxKind::BinaryExpression, pos, true),
                left: self.arena.alloc(left),
                operator,
                right: self.arena.alloc(right),
            });
        }
        left
    }

    /// `primary ('++' | '--')?` where the primary is a plain name.
    fn parse_postfix_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        let primary = self.parse_primary_expression();
        if let Expression::Name(name) = primary {
            let is_update = matches!(
                self.current_token(),
                SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken
            );
            if is_update && !self.scanner.has_preceding_line_break() {
                let operator = self.take_token();
                return Expression::Postfix(PostfixExpression {
                    data: self.finish_node(SyntaxKind::PostfixExpression, pos, name.data.is_valid()),
                    identifier: name.identifier,
                    operator,
                });
            }
        }
        primary
    }

    fn parse_primary_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        match self.current_token() {
            SyntaxKind::OpenParenToken => {
                let open = self.take_token();
                let expression = self.parse_expression_and_alloc();
                let close = self.expect_closing(SyntaxKind::CloseParenToken, open);
                Expression::Parenthesized(ParenthesizedExpression {
                    data: self.finish_node(SyntaxKind::ParenthesizedExpression, pos, close.data.is_valid()),
                    expression,
                })
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.current_token() == SyntaxKind::TrueKeyword;
                self.next_token();
                self.literal(pos, LiteralValue::Bool(value), true)
            }
            SyntaxKind::IntegerLiteral => {
                let parsed = self.token_value().parse::<i64>();
                let value = match parsed {
                    Ok(value) => Some(value),
                    Err(_) => {
                        let text = self.token_value().to_string();
                        self.error(&messages::INVALID_NUMBER, &[&text, "int"]);
                        None
                    }
                };
                self.next_token();
                self.literal(pos, LiteralValue::Int(value.unwrap_or(0)), value.is_some())
            }
            SyntaxKind::FloatLiteral => {
                let parsed = self.token_value().parse::<f64>();
                let value = match parsed {
                    Ok(value) if value.is_finite() => Some(value),
                    _ => {
                        let text = self.token_value().to_string();
                        self.error(&messages::INVALID_NUMBER, &[&text, "float"]);
                        None
                    }
                };
                self.next_token();
                self.literal(pos, LiteralValue::Float(value.unwrap_or(0.0)), value.is_some())
            }
            SyntaxKind::StringLiteral => {
                let text = self.arena.alloc_str(self.token_value());
                let terminated = !self.scanner.token_flags().contains(TokenFlags::UNTERMINATED);
                self.next_token();
                self.literal(pos, LiteralValue::String(text), terminated)
            }
            SyntaxKind::NewKeyword => self.parse_array_creation_expression(),
            SyntaxKind::Identifier => {
                let is_call = self
                    .scanner
                    .look_ahead(|s| s.scan() == SyntaxKind::OpenParenToken);
                if is_call {
                    self.parse_call_expression()
                } else {
                    let identifier = self.expect_identifier();
                    Expression::Name(NameExpression {
                        data: self.finish_node(SyntaxKind::NameExpression, pos, true),
                        identifier,
                    })
                }
            }
            SyntaxKind::Unknown => {
                // Already reported by the scanner.
                self.next_token();
                self.missing_name(pos)
            }
            _ => {
                let text = self.current_token_text();
                self.error(&messages::UNEXPECTED_TOKEN, &[&text]);
                self.missing_name(pos)
            }
        }
    }

    fn parse_call_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        let identifier = self.expect_identifier();
        let open = self.expect_token(SyntaxKind::OpenParenToken);
        let mut arguments = Vec::new();
        while !matches!(
            self.current_token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            arguments.push(self.parse_expression());
            if self.optional_token(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        let close = self.expect_closing(SyntaxKind::CloseParenToken, open);
        Expression::Call(CallExpression {
            data: self.finish_node(SyntaxKind::CallExpression, pos, close.data.is_valid()),
            identifier,
            arguments: alloc_vec_in(self.arena, arguments),
        })
    }

    /// `new T[size]`, with any empty rank specifiers before the size belonging to
    /// the element type. Without a size the last empty specifier is the array's own.
    fn parse_array_creation_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::NewKeyword);
        let type_pos = self.token_pos();
        let identifier = self.expect_identifier();

        let mut ranks = Vec::new();
        let mut valid = identifier.data.is_valid();
        while self.is_rank_specifier() {
            let (rank, closed) = self.parse_rank_specifier();
            ranks.push(rank);
            valid &= closed;
        }
        let element_end = self.prev_token_end;

        let (rank, size) = if self.current_token() == SyntaxKind::OpenBracketToken {
            self.next_token();
            let size = self.parse_expression_and_alloc();
            let close = self.expect_token(SyntaxKind::CloseBracketToken);
            valid &= close.data.is_valid();
            (1, Some(size))
        } else if let Some(rank) = ranks.pop() {
            (rank, None)
        } else {
            self.expect_token(SyntaxKind::OpenBracketToken);
            valid = false;
            (1, None)
        };

        let element_type = TypeClause {
            data: NodeData::new(SyntaxKind::TypeClause, type_pos, element_end.max(type_pos)),
            identifier,
            ranks: alloc_vec_in(self.arena, ranks),
        };
        Expression::ArrayCreation(ArrayCreationExpression {
            data: self.finish_node(SyntaxKind::ArrayCreationExpression, pos, valid),
            element_type,
            rank,
            size,
        })
    }

    fn literal(&self, pos: TextPos, value: LiteralValue<'a>, valid: bool) -> Expression<'a> {
        Expression::Literal(LiteralExpression {
            data: self.finish_node(SyntaxKind::LiteralExpression, pos, valid),
            value,
        })
    }

    /// A name expression standing in for an expression the source lacks.
    fn missing_name(&self, pos: TextPos) -> Expression<'a> {
        Expression::Name(NameExpression {
            data: NodeData::new(SyntaxKind::NameExpression, pos, pos)
                .with_flags(NodeFlags::THIS_NODE_HAS_ERROR),
            identifier: Identifier::missing(pos),
        })
    }
}

fn precedence_below(precedence: OperatorPrecedence) -> OperatorPrecedence {
    match precedence {
        OperatorPrecedence::Exponentiation => OperatorPrecedence::Multiplicative,
        other => other,
    }
}
