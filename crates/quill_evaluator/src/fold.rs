//! Compile-time constant folding.
//!
//! The binder calls these while building nodes; a `Some` result becomes the
//! node's `constant`. An operation that would fail at runtime, like integer
//! division by zero, is left unfolded so the failure happens when it runs.

use crate::ops;
use quill_bound::{BinaryOperator, BoundExpression, TypeSymbol, UnaryOperator, Value};

pub fn fold_unary(op: UnaryOperator, operand: &BoundExpression) -> Option<Value> {
    ops::apply_unary(op, operand.constant()?).ok()
}

pub fn fold_binary(op: BinaryOperator, left: &BoundExpression, right: &BoundExpression) -> Option<Value> {
    let left_constant = left.constant();

    // The right side never runs, so its value does not matter.
    match (op, left_constant) {
        (BinaryOperator::LogicalAnd, Some(Value::Bool(false))) => return Some(Value::Bool(false)),
        (BinaryOperator::LogicalOr, Some(Value::Bool(true))) => return Some(Value::Bool(true)),
        _ => {}
    }

    ops::apply_binary(op, left_constant?, right.constant()?).ok()
}

pub fn fold_conversion(ty: &TypeSymbol, operand: &BoundExpression) -> Option<Value> {
    ops::convert(operand.constant()?, ty).ok()
}

pub fn fold_ternary(
    condition: &BoundExpression,
    when_true: &BoundExpression,
    when_false: &BoundExpression,
) -> Option<Value> {
    match condition.constant()? {
        Value::Bool(true) => when_true.constant().cloned(),
        Value::Bool(false) => when_false.constant().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_bound::{BoundCallExpression, FunctionSymbol};
    use std::rc::Rc;

    fn literal(value: Value) -> BoundExpression {
        BoundExpression::literal(value)
    }

    fn call() -> BoundExpression {
        BoundExpression::Call(BoundCallExpression {
            function: Rc::new(FunctionSymbol::new("f", Vec::new(), TypeSymbol::Bool, None)),
            arguments: Vec::new(),
        })
    }

    #[test]
    fn test_short_circuit_folds_without_right_constant() {
        let folded = fold_binary(BinaryOperator::LogicalAnd, &literal(Value::Bool(false)), &call());
        assert_eq!(folded, Some(Value::Bool(false)));

        let folded = fold_binary(BinaryOperator::LogicalOr, &literal(Value::Bool(true)), &call());
        assert_eq!(folded, Some(Value::Bool(true)));

        assert_eq!(fold_binary(BinaryOperator::LogicalAnd, &literal(Value::Bool(true)), &call()), None);
        assert_eq!(fold_binary(BinaryOperator::LogicalAnd, &call(), &literal(Value::Bool(false))), None);
    }

    #[test]
    fn test_division_by_zero_is_not_folded() {
        let folded = fold_binary(
            BinaryOperator::Divide,
            &literal(Value::Int(1)),
            &literal(Value::Int(0)),
        );
        assert_eq!(folded, None);
    }

    #[test]
    fn test_ternary_and_conversion() {
        let folded = fold_ternary(
            &literal(Value::Bool(false)),
            &call(),
            &literal(Value::Int(2)),
        );
        assert_eq!(folded, Some(Value::Int(2)));
        assert_eq!(
            fold_conversion(&TypeSymbol::String, &literal(Value::Float(1.5))),
            Some(Value::Str("1.5".into()))
        );
        assert_eq!(fold_unary(UnaryOperator::Negation, &call()), None);
    }
}
