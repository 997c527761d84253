//! Operators of the bound tree.
//!
//! Which operand types each operator accepts is decided by the binder's
//! operator table; these enums only name the operations.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Identity,
    Negation,
    LogicalNot,
    BitwiseNot,
}

impl UnaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            UnaryOperator::Identity => "+",
            UnaryOperator::Negation => "-",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::BitwiseNot => "~",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// `**`
    Power,
    /// `//`: `a // b` is the `b`-th root of `a`.
    Root,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    Equals,
    NotEquals,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
}

impl BinaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::Root => "//",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEquals => ">=",
        }
    }

    /// Binding strength when printed, higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Power | BinaryOperator::Root => 10,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 9,
            BinaryOperator::Add | BinaryOperator::Subtract => 8,
            BinaryOperator::Less
            | BinaryOperator::LessOrEquals
            | BinaryOperator::Greater
            | BinaryOperator::GreaterOrEquals => 7,
            BinaryOperator::Equals | BinaryOperator::NotEquals => 6,
            BinaryOperator::BitwiseAnd => 5,
            BinaryOperator::BitwiseXor => 4,
            BinaryOperator::BitwiseOr => 3,
            BinaryOperator::LogicalAnd => 2,
            BinaryOperator::LogicalOr => 1,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::Less
                | BinaryOperator::LessOrEquals
                | BinaryOperator::Greater
                | BinaryOperator::GreaterOrEquals
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
