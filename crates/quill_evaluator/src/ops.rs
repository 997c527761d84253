//! Operations on runtime values.
//!
//! The constant folder and the evaluator both go through these functions, so
//! a folded constant always equals what the evaluator would have computed.
//! Integer arithmetic wraps on overflow.

use crate::error::EvalError;
use quill_bound::{BinaryOperator, TypeSymbol, UnaryOperator, Value};
use std::rc::Rc;

pub fn apply_unary(op: UnaryOperator, operand: &Value) -> Result<Value, EvalError> {
    let result = match (op, operand) {
        (UnaryOperator::Identity, Value::Int(_) | Value::Float(_)) => operand.clone(),
        (UnaryOperator::Negation, Value::Int(i)) => Value::Int(i.wrapping_neg()),
        (UnaryOperator::Negation, Value::Float(x)) => Value::Float(-x),
        (UnaryOperator::LogicalNot, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOperator::BitwiseNot, Value::Int(i)) => Value::Int(!i),
        (UnaryOperator::BitwiseNot, Value::Bool(b)) => Value::Bool(!b),
        _ => {
            return Err(EvalError::UnsupportedOperation {
                op: op.text().to_string(),
                operands: describe(operand),
            })
        }
    };
    Ok(result)
}

pub fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    use BinaryOperator::*;

    let result = match op {
        Add => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
            (Value::Str(a), b) if is_primitive(b) => Value::Str(format!("{}{}", a, b)),
            (a, Value::Str(b)) if is_primitive(a) => Value::Str(format!("{}{}", a, b)),
            _ => float_arithmetic(op, left, right, |a, b| a + b)?,
        },
        Subtract => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
            _ => float_arithmetic(op, left, right, |a, b| a - b)?,
        },
        Multiply => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
            _ => float_arithmetic(op, left, right, |a, b| a * b)?,
        },
        Divide => match (left, right) {
            (Value::Int(_), Value::Int(0)) => return Err(EvalError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(*b)),
            _ => float_arithmetic(op, left, right, |a, b| a / b)?,
        },
        Modulo => match (left, right) {
            (Value::Int(_), Value::Int(0)) => return Err(EvalError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(*b)),
            _ => float_arithmetic(op, left, right, |a, b| a % b)?,
        },
        Power => float_arithmetic(op, left, right, f64::powf)?,
        // A zero root gives `a ** inf`.
        Root => float_arithmetic(op, left, right, |a, b| a.powf(1.0 / b))?,
        BitwiseAnd | BitwiseOr | BitwiseXor => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(match op {
                BitwiseAnd => a & b,
                BitwiseOr => a | b,
                _ => a ^ b,
            }),
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(match op {
                BitwiseAnd => a & b,
                BitwiseOr => a | b,
                _ => a ^ b,
            }),
            _ => return Err(unsupported(op, left, right)),
        },
        LogicalAnd | LogicalOr => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(if op == LogicalAnd { *a && *b } else { *a || *b }),
            _ => return Err(unsupported(op, left, right)),
        },
        Equals => Value::Bool(values_equal(left, right)),
        NotEquals => Value::Bool(!values_equal(left, right)),
        Less | LessOrEquals | Greater | GreaterOrEquals => {
            let ordering = match (left, right) {
                (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
                _ => match (left.as_float(), right.as_float()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => return Err(unsupported(op, left, right)),
                },
            };
            // NaN compares false under every ordering operator.
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Value::Bool(match op {
                Less => ordering.is_lt(),
                LessOrEquals => ordering.is_le(),
                Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    };
    Ok(result)
}

/// Convert `value` to `ty` at runtime. Succeeds for every conversion the
/// binder classifies as implicit or explicit when the value fits.
pub fn convert(value: &Value, ty: &TypeSymbol) -> Result<Value, EvalError> {
    let converted = match (ty, value) {
        (TypeSymbol::Object, _) => Some(value.clone()),
        (TypeSymbol::Int, Value::Int(_)) => Some(value.clone()),
        (TypeSymbol::Int, Value::Float(x)) => Some(Value::Int(*x as i64)),
        (TypeSymbol::Int, Value::Bool(b)) => Some(Value::Int(*b as i64)),
        (TypeSymbol::Int, Value::Str(s)) => s.trim().parse().ok().map(Value::Int),
        (TypeSymbol::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (TypeSymbol::Float, Value::Float(_)) => Some(value.clone()),
        (TypeSymbol::Float, Value::Bool(b)) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
        (TypeSymbol::Float, Value::Str(s)) => s.trim().parse().ok().map(Value::Float),
        (TypeSymbol::Bool, Value::Bool(_)) => Some(value.clone()),
        (TypeSymbol::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),
        (TypeSymbol::Bool, Value::Float(x)) => Some(Value::Bool(*x != 0.0)),
        (TypeSymbol::Bool, Value::Str(s)) => s.trim().parse().ok().map(Value::Bool),
        (TypeSymbol::String, Value::Unit) => None,
        (TypeSymbol::String, _) => Some(Value::Str(value.to_string())),
        (TypeSymbol::Array(..), Value::Array(_)) => Some(value.clone()),
        _ => None,
    };
    converted.ok_or_else(|| EvalError::InvalidConversion {
        value: value.to_string(),
        ty: ty.to_string(),
    })
}

/// A fresh array of `size` elements of `element`'s zero value.
pub fn new_array(element: &TypeSymbol, size: i64) -> Result<Value, EvalError> {
    if size < 0 {
        return Err(EvalError::InvalidArraySize(size));
    }
    let len = usize::try_from(size).map_err(|_| EvalError::InvalidArraySize(size))?;
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| EvalError::InvalidArraySize(size))?;
    items.resize(len, Value::default_for(element));
    Ok(Value::Array(Rc::new(items)))
}

/// Equality with numeric promotion. Values of unrelated types are unequal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_float() == right.as_float()
        }
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        _ => left == right,
    }
}

fn float_arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
        _ => Err(unsupported(op, left, right)),
    }
}

fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Str(_))
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> EvalError {
    EvalError::UnsupportedOperation {
        op: op.text().to_string(),
        operands: format!("{} and {}", describe(left), describe(right)),
    }
}

fn describe(value: &Value) -> String {
    format!("'{}'", value.type_of())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(apply_binary(BinaryOperator::Add, &int(2), &int(3)), Ok(int(5)));
        assert_eq!(apply_binary(BinaryOperator::Divide, &int(7), &int(2)), Ok(int(3)));
        assert_eq!(apply_binary(BinaryOperator::Modulo, &int(-7), &int(3)), Ok(int(-1)));
        assert_eq!(
            apply_binary(BinaryOperator::Add, &int(i64::MAX), &int(1)),
            Ok(int(i64::MIN))
        );
        assert_eq!(
            apply_binary(BinaryOperator::Divide, &int(1), &int(0)),
            Err(EvalError::DivisionByZero)
        );
    }

    #[test]
    fn test_mixed_and_float_arithmetic() {
        assert_eq!(
            apply_binary(BinaryOperator::Multiply, &int(2), &Value::Float(1.5)),
            Ok(Value::Float(3.0))
        );
        assert_eq!(apply_binary(BinaryOperator::Power, &int(2), &int(10)), Ok(Value::Float(1024.0)));
        assert_eq!(
            apply_binary(BinaryOperator::Root, &Value::Float(27.0), &Value::Float(3.0))
                .ok()
                .and_then(|v| v.as_float())
                .map(|x| (x - 3.0).abs() < 1e-9),
            Some(true)
        );
    }

    #[test]
    fn test_root_of_zero_degree() {
        // 2 // 0 is 2 ** (1 / 0), which is 2 ** inf.
        assert_eq!(
            apply_binary(BinaryOperator::Root, &Value::Float(2.0), &Value::Float(0.0)),
            Ok(Value::Float(f64::INFINITY))
        );
    }

    #[test]
    fn test_string_concatenation() {
        let a = Value::Str("a".into());
        assert_eq!(apply_binary(BinaryOperator::Add, &a, &int(1)), Ok(Value::Str("a1".into())));
        assert_eq!(
            apply_binary(BinaryOperator::Add, &Value::Bool(true), &a),
            Ok(Value::Str("truea".into()))
        );
    }

    #[test]
    fn test_equality_and_comparison() {
        assert!(values_equal(&int(1), &Value::Float(1.0)));
        assert!(!values_equal(&int(1), &Value::Str("1".into())));
        assert_eq!(
            apply_binary(BinaryOperator::LessOrEquals, &int(3), &Value::Float(3.0)),
            Ok(Value::Bool(true))
        );
        assert!(apply_binary(BinaryOperator::Less, &Value::Bool(true), &int(1)).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(apply_unary(UnaryOperator::Negation, &int(4)), Ok(int(-4)));
        assert_eq!(apply_unary(UnaryOperator::BitwiseNot, &int(0)), Ok(int(-1)));
        assert_eq!(apply_unary(UnaryOperator::LogicalNot, &Value::Bool(false)), Ok(Value::Bool(true)));
        assert!(apply_unary(UnaryOperator::LogicalNot, &int(1)).is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(convert(&Value::Float(3.9), &TypeSymbol::Int), Ok(int(3)));
        assert_eq!(convert(&int(3), &TypeSymbol::Float), Ok(Value::Float(3.0)));
        assert_eq!(convert(&int(42), &TypeSymbol::String), Ok(Value::Str("42".into())));
        assert_eq!(convert(&Value::Str(" 12 ".into()), &TypeSymbol::Int), Ok(int(12)));
        assert!(convert(&Value::Str("x".into()), &TypeSymbol::Int).is_err());
        assert_eq!(convert(&Value::Unit, &TypeSymbol::Object), Ok(Value::Unit));
    }

    #[test]
    fn test_new_array() {
        assert_eq!(
            new_array(&TypeSymbol::Int, 2),
            Ok(Value::Array(Rc::new(vec![int(0), int(0)])))
        );
        assert_eq!(new_array(&TypeSymbol::Int, -1), Err(EvalError::InvalidArraySize(-1)));
    }

    #[test]
    fn test_new_array_too_large() {
        let size = i64::MAX / 2;
        assert_eq!(new_array(&TypeSymbol::Int, size), Err(EvalError::InvalidArraySize(size)));
        assert_eq!(new_array(&TypeSymbol::Float, i64::MAX), Err(EvalError::InvalidArraySize(i64::MAX)));
    }
}
