//! Built-in functions every program can call.

use crate::symbol::{FunctionSymbol, VariableKind, VariableSymbol};
use crate::types::TypeSymbol;
use std::rc::Rc;

pub const PRINT: &str = "print";
pub const INPUT: &str = "input";

/// `print(value: any): void`
pub fn print() -> FunctionSymbol {
    let value = VariableSymbol::new("value", VariableKind::Parameter { index: 0 }, TypeSymbol::Object, 0);
    FunctionSymbol::new(PRINT, vec![Rc::new(value)], TypeSymbol::Void, None)
}

/// `input(): string`
pub fn input() -> FunctionSymbol {
    FunctionSymbol::new(INPUT, Vec::new(), TypeSymbol::String, None)
}

pub fn all() -> Vec<FunctionSymbol> {
    vec![print(), input()]
}

pub fn is_builtin(function: &FunctionSymbol) -> bool {
    all().iter().any(|builtin| builtin == function)
}
