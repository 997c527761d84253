//! Runtime values shared by the constant folder and the evaluator.

use crate::types::TypeSymbol;
use std::fmt;
use std::rc::Rc;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Rc<Vec<Value>>),
    /// The result of a void call, and the contents of an uninitialized `any`.
    Unit,
}

impl Value {
    /// The zero value an array element of type `ty` starts with.
    pub fn default_for(ty: &TypeSymbol) -> Value {
        match ty {
            TypeSymbol::Int => Value::Int(0),
            TypeSymbol::Float => Value::Float(0.0),
            TypeSymbol::Bool => Value::Bool(false),
            TypeSymbol::String => Value::Str(String::new()),
            TypeSymbol::Array(..)
            | TypeSymbol::Object
            | TypeSymbol::Void
            | TypeSymbol::Invalid => Value::Unit,
        }
    }

    /// The dynamic type of this value. Arrays report `any[]` since
    /// elements carry no static type at runtime.
    pub fn type_of(&self) -> TypeSymbol {
        match self {
            Value::Int(_) => TypeSymbol::Int,
            Value::Float(_) => TypeSymbol::Float,
            Value::Bool(_) => TypeSymbol::Bool,
            Value::Str(_) => TypeSymbol::String,
            Value::Array(_) => TypeSymbol::array(TypeSymbol::Object, 1),
            Value::Unit => TypeSymbol::Void,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Unit => Ok(()),
        }
    }
}
