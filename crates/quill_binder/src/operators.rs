//! Operator resolution.
//!
//! Maps operator tokens to bound operators and decides the result type of
//! every operator over every pair of operand types. A `None` result means
//! the combination is not supported and the binder reports it.

use quill_bound::{BinaryOperator, TypeSymbol, UnaryOperator};
use quill_syntax::SyntaxKind;

pub fn unary_operator(kind: SyntaxKind) -> Option<UnaryOperator> {
    let op = match kind {
        SyntaxKind::PlusToken => UnaryOperator::Identity,
        SyntaxKind::MinusToken => UnaryOperator::Negation,
        SyntaxKind::ExclamationToken => UnaryOperator::LogicalNot,
        SyntaxKind::TildeToken => UnaryOperator::BitwiseNot,
        _ => return None,
    };
    Some(op)
}

pub fn binary_operator(kind: SyntaxKind) -> Option<BinaryOperator> {
    let op = match kind {
        SyntaxKind::PlusToken => BinaryOperator::Add,
        SyntaxKind::MinusToken => BinaryOperator::Subtract,
        SyntaxKind::AsteriskToken => BinaryOperator::Multiply,
        SyntaxKind::SlashToken => BinaryOperator::Divide,
        SyntaxKind::PercentToken => BinaryOperator::Modulo,
        SyntaxKind::AsteriskAsteriskToken => BinaryOperator::Power,
        SyntaxKind::SlashSlashToken => BinaryOperator::Root,
        SyntaxKind::AmpersandToken => BinaryOperator::BitwiseAnd,
        SyntaxKind::BarToken => BinaryOperator::BitwiseOr,
        SyntaxKind::CaretToken => BinaryOperator::BitwiseXor,
        SyntaxKind::AmpersandAmpersandToken => BinaryOperator::LogicalAnd,
        SyntaxKind::BarBarToken => BinaryOperator::LogicalOr,
        SyntaxKind::EqualsEqualsToken => BinaryOperator::Equals,
        SyntaxKind::ExclamationEqualsToken => BinaryOperator::NotEquals,
        SyntaxKind::LessThanToken => BinaryOperator::Less,
        SyntaxKind::LessThanEqualsToken => BinaryOperator::LessOrEquals,
        SyntaxKind::GreaterThanToken => BinaryOperator::Greater,
        SyntaxKind::GreaterThanEqualsToken => BinaryOperator::GreaterOrEquals,
        _ => return None,
    };
    Some(op)
}

/// Result type of a unary operator, or `None` when unsupported.
pub fn resolve_unary(op: UnaryOperator, operand: &TypeSymbol) -> Option<TypeSymbol> {
    use TypeSymbol::*;

    if operand.is_object() {
        return Some(Object);
    }
    match (op, operand) {
        (UnaryOperator::Identity | UnaryOperator::Negation, Int) => Some(Int),
        (UnaryOperator::Identity | UnaryOperator::Negation, Float) => Some(Float),
        (UnaryOperator::LogicalNot, Bool) => Some(Bool),
        (UnaryOperator::BitwiseNot, Int) => Some(Int),
        (UnaryOperator::BitwiseNot, Bool) => Some(Bool),
        _ => None,
    }
}

/// Result type of a binary operator, or `None` when unsupported.
///
/// `any` on either side makes the result `any`; the check moves to runtime.
pub fn resolve_binary(op: BinaryOperator, left: &TypeSymbol, right: &TypeSymbol) -> Option<TypeSymbol> {
    use TypeSymbol::*;

    if left.is_object() || right.is_object() {
        return Some(Object);
    }

    let numeric = left.is_numeric() && right.is_numeric();
    let widened = if left == &Int && right == &Int { Int } else { Float };

    match op {
        BinaryOperator::Add => {
            if numeric {
                Some(widened)
            } else if (left == &String && right.is_primitive()) || (right == &String && left.is_primitive()) {
                Some(String)
            } else {
                None
            }
        }
        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => numeric.then_some(widened),
        BinaryOperator::Power | BinaryOperator::Root => numeric.then_some(Float),
        BinaryOperator::BitwiseAnd | BinaryOperator::BitwiseOr | BinaryOperator::BitwiseXor => {
            match (left, right) {
                (Int, Int) => Some(Int),
                (Bool, Bool) => Some(Bool),
                _ => None,
            }
        }
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => {
            (left == &Bool && right == &Bool).then_some(Bool)
        }
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let comparable = numeric
                || matches!((left, right), (Bool, Bool) | (String, String));
            comparable.then_some(Bool)
        }
        BinaryOperator::Less
        | BinaryOperator::LessOrEquals
        | BinaryOperator::Greater
        | BinaryOperator::GreaterOrEquals => numeric.then_some(Bool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_widens() {
        use TypeSymbol::*;
        assert_eq!(resolve_binary(BinaryOperator::Add, &Int, &Int), Some(Int));
        assert_eq!(resolve_binary(BinaryOperator::Multiply, &Int, &Float), Some(Float));
        assert_eq!(resolve_binary(BinaryOperator::Power, &Int, &Int), Some(Float));
        assert_eq!(resolve_binary(BinaryOperator::Root, &Float, &Int), Some(Float));
    }

    #[test]
    fn test_string_concatenation() {
        use TypeSymbol::*;
        assert_eq!(resolve_binary(BinaryOperator::Add, &String, &Int), Some(String));
        assert_eq!(resolve_binary(BinaryOperator::Add, &Bool, &String), Some(String));
        assert_eq!(resolve_binary(BinaryOperator::Subtract, &String, &Int), None);
    }

    #[test]
    fn test_object_is_deferred() {
        use TypeSymbol::*;
        assert_eq!(resolve_binary(BinaryOperator::Less, &Object, &String), Some(Object));
        assert_eq!(resolve_unary(UnaryOperator::LogicalNot, &Object), Some(Object));
    }

    #[test]
    fn test_unsupported_combinations() {
        use TypeSymbol::*;
        assert_eq!(resolve_binary(BinaryOperator::LogicalAnd, &Int, &Int), None);
        assert_eq!(resolve_binary(BinaryOperator::Less, &String, &String), None);
        assert_eq!(resolve_unary(UnaryOperator::Negation, &Bool), None);
        assert_eq!(resolve_unary(UnaryOperator::LogicalNot, &Int), None);
    }

    #[test]
    fn test_every_operator_token_maps() {
        assert_eq!(binary_operator(SyntaxKind::SlashSlashToken), Some(BinaryOperator::Root));
        assert_eq!(unary_operator(SyntaxKind::TildeToken), Some(UnaryOperator::BitwiseNot));
        assert_eq!(binary_operator(SyntaxKind::EqualsToken), None);
    }
}
