//! Syntax node definitions for the quill language.
//!
//! Nodes reference child nodes via arena-allocated references. A tree
//! borrows from the arena it was parsed into.

use crate::syntax_kind::SyntaxKind;
use crate::types::*;
use quill_core::text::{TextPos, TextSpan};

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all syntax nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    /// The kind of this node.
    pub kind: SyntaxKind,
    /// Source span.
    pub span: TextSpan,
    /// Node flags.
    pub flags: NodeFlags,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, pos: TextPos, end: TextPos) -> Self {
        Self {
            kind,
            span: TextSpan::from_bounds(pos, end),
            flags: NodeFlags::NONE,
        }
    }

    /// Whether the parser built this node without reporting an error for it.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.flags.intersects(NodeFlags::THIS_NODE_HAS_ERROR | NodeFlags::MISSING)
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Compilation Unit
// ============================================================================

#[derive(Debug)]
pub struct CompilationUnit<'a> {
    pub data: NodeData,
    pub members: NodeList<'a, Member<'a>>,
    pub file_name: String,
    pub text: String,
}

impl<'a> CompilationUnit<'a> {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDeclaration<'a>> {
        self.members.iter().filter_map(|member| match member {
            Member::Function(function) => Some(function),
            Member::GlobalStatement(_) => None,
        })
    }

    pub fn global_statements(&self) -> impl Iterator<Item = &GlobalStatement<'a>> {
        self.members.iter().filter_map(|member| match member {
            Member::GlobalStatement(statement) => Some(statement),
            Member::Function(_) => None,
        })
    }
}

// ============================================================================
// Token
// ============================================================================

/// A simple token with kind and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub data: NodeData,
}

impl Token {
    pub fn new(kind: SyntaxKind, pos: TextPos, end: TextPos) -> Self {
        Self {
            data: NodeData::new(kind, pos, end),
        }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    #[inline]
    pub fn span(&self) -> TextSpan {
        self.data.span
    }
}

// ============================================================================
// Identifier
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub data: NodeData,
    /// Source text of the identifier. Empty when the parser synthesized it.
    pub text: &'a str,
}

impl<'a> Identifier<'a> {
    pub fn new(text: &'a str, pos: TextPos, end: TextPos) -> Self {
        Self {
            data: NodeData::new(SyntaxKind::Identifier, pos, end),
            text,
        }
    }

    /// An identifier standing in for one the source did not contain.
    pub fn missing(pos: TextPos) -> Self {
        Self {
            data: NodeData::new(SyntaxKind::Identifier, pos, pos).with_flags(NodeFlags::MISSING),
            text: "",
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.data.flags.contains(NodeFlags::MISSING)
    }

    #[inline]
    pub fn span(&self) -> TextSpan {
        self.data.span
    }
}

// ============================================================================
// Members and Declarations
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Function(FunctionDeclaration<'a>),
    GlobalStatement(GlobalStatement<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionDeclaration<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub parameters: NodeList<'a, Parameter<'a>>,
    pub return_type: Option<TypeClause<'a>>,
    pub body: BlockStatement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub type_clause: TypeClause<'a>,
}

/// A type reference: a type name followed by zero or more array rank specifiers.
///
/// Ranks wrap the named type in source order, so `int[][,]` has
/// `ranks == [1, 2]` and names a rank-2 array whose elements are `int[]`.
#[derive(Debug, Clone, Copy)]
pub struct TypeClause<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub ranks: NodeList<'a, u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobalStatement<'a> {
    pub data: NodeData,
    pub statement: &'a Statement<'a>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Block(BlockStatement<'a>),
    VariableDeclaration(VariableDeclaration<'a>),
    If(IfStatement<'a>),
    While(WhileStatement<'a>),
    DoWhile(DoWhileStatement<'a>),
    For(ForStatement<'a>),
    Break(JumpStatement),
    Continue(JumpStatement),
    Return(ReturnStatement<'a>),
    Expression(ExpressionStatement<'a>),
}

#[derive(Debug, Clone, Copy)]
pub struct BlockStatement<'a> {
    pub data: NodeData,
    pub statements: NodeList<'a, Statement<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct VariableDeclaration<'a> {
    pub data: NodeData,
    /// `var` or `let`.
    pub keyword: Token,
    pub identifier: Identifier<'a>,
    pub type_clause: Option<TypeClause<'a>>,
    pub initializer: &'a Expression<'a>,
}

impl VariableDeclaration<'_> {
    #[inline]
    pub fn is_readonly(&self) -> bool {
        self.keyword.kind() == SyntaxKind::LetKeyword
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IfStatement<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub then_statement: &'a Statement<'a>,
    pub else_statement: Option<&'a Statement<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct WhileStatement<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub body: &'a Statement<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct DoWhileStatement<'a> {
    pub data: NodeData,
    pub body: &'a Statement<'a>,
    pub condition: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ForStatement<'a> {
    pub data: NodeData,
    pub initializer: &'a Statement<'a>,
    pub condition: &'a Expression<'a>,
    pub increment: &'a Expression<'a>,
    pub body: &'a Statement<'a>,
}

/// `break` or `continue`.
#[derive(Debug, Clone, Copy)]
pub struct JumpStatement {
    pub data: NodeData,
    pub keyword: Token,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnStatement<'a> {
    pub data: NodeData,
    pub keyword: Token,
    pub expression: Option<&'a Expression<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExpressionStatement<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Literal(LiteralExpression<'a>),
    Name(NameExpression<'a>),
    Parenthesized(ParenthesizedExpression<'a>),
    Unary(UnaryExpression<'a>),
    Binary(BinaryExpression<'a>),
    Assignment(AssignmentExpression<'a>),
    Postfix(PostfixExpression<'a>),
    Call(CallExpression<'a>),
    Ternary(TernaryExpression<'a>),
    ArrayCreation(ArrayCreationExpression<'a>),
}

/// The value of a literal token, decoded by the scanner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct LiteralExpression<'a> {
    pub data: NodeData,
    pub value: LiteralValue<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct NameExpression<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct ParenthesizedExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct UnaryExpression<'a> {
    pub data: NodeData,
    pub operator: Token,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryExpression<'a> {
    pub data: NodeData,
    pub left: &'a Expression<'a>,
    pub operator: Token,
    pub right: &'a Expression<'a>,
}

/// `x = value` or a compound form such as `x += value`.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentExpression<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub operator: Token,
    pub value: &'a Expression<'a>,
}

/// `x++` or `x--`.
#[derive(Debug, Clone, Copy)]
pub struct PostfixExpression<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub operator: Token,
}

#[derive(Debug, Clone, Copy)]
pub struct CallExpression<'a> {
    pub data: NodeData,
    pub identifier: Identifier<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct TernaryExpression<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub when_true: &'a Expression<'a>,
    pub when_false: &'a Expression<'a>,
}

/// `new T[size]`. The created array has rank 1 over `element_type`, or the
/// rank written inside empty brackets when the size is missing.
#[derive(Debug, Clone, Copy)]
pub struct ArrayCreationExpression<'a> {
    pub data: NodeData,
    pub element_type: TypeClause<'a>,
    pub rank: u32,
    pub size: Option<&'a Expression<'a>>,
}
