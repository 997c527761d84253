//! Bound tree node definitions.
//!
//! Nodes own their children, so a rewrite moves the parts it keeps into the
//! node it builds. Every expression knows its result type, and carries the
//! compile-time constant it evaluates to when the whole subtree is known.

use crate::label::BoundLabel;
use crate::operators::{BinaryOperator, UnaryOperator};
use crate::symbol::{FunctionSymbol, VariableSymbol};
use crate::types::TypeSymbol;
use crate::value::Value;
use std::rc::Rc;

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpression {
    Literal(BoundLiteralExpression),
    Variable(BoundVariableExpression),
    Unary(BoundUnaryExpression),
    Binary(BoundBinaryExpression),
    Call(BoundCallExpression),
    Conversion(BoundConversionExpression),
    Assignment(BoundAssignmentExpression),
    ArrayCreation(BoundArrayCreationExpression),
    Ternary(BoundTernaryExpression),
    /// Statements evaluated for the value their last `should_pop == false`
    /// expression statement leaves behind. Only the lowerer builds these.
    StatementExpression(BoundStatementExpression),
    /// Stands in for an expression that failed to bind.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundLiteralExpression {
    pub value: Value,
    pub ty: TypeSymbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundVariableExpression {
    pub variable: Rc<VariableSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundUnaryExpression {
    pub op: UnaryOperator,
    pub operand: Box<BoundExpression>,
    pub ty: TypeSymbol,
    pub constant: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundBinaryExpression {
    pub op: BinaryOperator,
    pub left: Box<BoundExpression>,
    pub right: Box<BoundExpression>,
    pub ty: TypeSymbol,
    pub constant: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundCallExpression {
    pub function: Rc<FunctionSymbol>,
    pub arguments: Vec<BoundExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundConversionExpression {
    pub ty: TypeSymbol,
    pub expression: Box<BoundExpression>,
    pub constant: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundAssignmentExpression {
    pub variable: Rc<VariableSymbol>,
    pub expression: Box<BoundExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundArrayCreationExpression {
    /// The created array's type.
    pub ty: TypeSymbol,
    pub size: Box<BoundExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundTernaryExpression {
    pub condition: Box<BoundExpression>,
    pub when_true: Box<BoundExpression>,
    pub when_false: Box<BoundExpression>,
    pub ty: TypeSymbol,
    pub constant: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatementExpression {
    pub statements: Vec<BoundStatement>,
    pub ty: TypeSymbol,
}

impl BoundExpression {
    pub fn literal(value: Value) -> BoundExpression {
        let ty = value.type_of();
        BoundExpression::Literal(BoundLiteralExpression { value, ty })
    }

    pub fn variable(variable: Rc<VariableSymbol>) -> BoundExpression {
        BoundExpression::Variable(BoundVariableExpression { variable })
    }

    /// The type this expression evaluates to.
    pub fn ty(&self) -> TypeSymbol {
        match self {
            BoundExpression::Literal(n) => n.ty.clone(),
            BoundExpression::Variable(n) => n.variable.ty.clone(),
            BoundExpression::Unary(n) => n.ty.clone(),
            BoundExpression::Binary(n) => n.ty.clone(),
            BoundExpression::Call(n) => n.function.return_type.clone(),
            BoundExpression::Conversion(n) => n.ty.clone(),
            BoundExpression::Assignment(n) => n.variable.ty.clone(),
            BoundExpression::ArrayCreation(n) => n.ty.clone(),
            BoundExpression::Ternary(n) => n.ty.clone(),
            BoundExpression::StatementExpression(n) => n.ty.clone(),
            BoundExpression::Invalid => TypeSymbol::Invalid,
        }
    }

    /// The value this expression always evaluates to, if known at compile time.
    pub fn constant(&self) -> Option<&Value> {
        match self {
            BoundExpression::Literal(n) => Some(&n.value),
            BoundExpression::Variable(n) => n.variable.constant.as_ref(),
            BoundExpression::Unary(n) => n.constant.as_ref(),
            BoundExpression::Binary(n) => n.constant.as_ref(),
            BoundExpression::Conversion(n) => n.constant.as_ref(),
            BoundExpression::Ternary(n) => n.constant.as_ref(),
            BoundExpression::Call(_)
            | BoundExpression::Assignment(_)
            | BoundExpression::ArrayCreation(_)
            | BoundExpression::StatementExpression(_)
            | BoundExpression::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, BoundExpression::Invalid)
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BoundStatement {
    Block(BoundBlockStatement),
    Expression(BoundExpressionStatement),
    VariableDeclaration(BoundVariableDeclaration),
    If(BoundIfStatement),
    While(BoundWhileStatement),
    DoWhile(BoundDoWhileStatement),
    For(BoundForStatement),
    Goto(BoundLabel),
    ConditionalGoto(BoundConditionalGotoStatement),
    Label(BoundLabel),
    Return(BoundReturnStatement),
    Nop,
    Invalid,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundBlockStatement {
    pub statements: Vec<BoundStatement>,
}

impl BoundBlockStatement {
    pub fn new(statements: Vec<BoundStatement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpressionStatement {
    pub expression: BoundExpression,
    /// `false` when the value is the result of an enclosing statement expression.
    pub should_pop: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundVariableDeclaration {
    pub variable: Rc<VariableSymbol>,
    pub initializer: BoundExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundIfStatement {
    pub condition: BoundExpression,
    pub then_statement: Box<BoundStatement>,
    pub else_statement: Option<Box<BoundStatement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundWhileStatement {
    pub condition: BoundExpression,
    pub body: Box<BoundStatement>,
    pub break_label: BoundLabel,
    pub continue_label: BoundLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundDoWhileStatement {
    pub body: Box<BoundStatement>,
    pub condition: BoundExpression,
    pub break_label: BoundLabel,
    pub continue_label: BoundLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundForStatement {
    pub declaration: Box<BoundStatement>,
    pub condition: BoundExpression,
    pub increment: BoundExpression,
    pub body: Box<BoundStatement>,
    pub break_label: BoundLabel,
    pub continue_label: BoundLabel,
}

/// Jumps to `label` when `condition` is true, or when it is false if
/// `jump_if_false` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundConditionalGotoStatement {
    pub label: BoundLabel,
    pub condition: BoundExpression,
    pub jump_if_false: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundReturnStatement {
    pub expression: Option<BoundExpression>,
}

impl BoundStatement {
    pub fn expression(expression: BoundExpression) -> BoundStatement {
        BoundStatement::Expression(BoundExpressionStatement {
            expression,
            should_pop: true,
        })
    }

    pub fn block(statements: Vec<BoundStatement>) -> BoundStatement {
        BoundStatement::Block(BoundBlockStatement::new(statements))
    }

    pub fn conditional_goto(label: BoundLabel, condition: BoundExpression, jump_if_false: bool) -> BoundStatement {
        BoundStatement::ConditionalGoto(BoundConditionalGotoStatement {
            label,
            condition,
            jump_if_false,
        })
    }

    /// Whether control can continue to the next statement in the list.
    pub fn can_fall_through(&self) -> bool {
        !matches!(self, BoundStatement::Return(_) | BoundStatement::Goto(_))
    }
}
