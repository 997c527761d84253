//! quill_bound: The typed intermediate representation.
//!
//! The binder produces these trees, the lowerer rewrites them into goto
//! form, and the evaluator runs them. This crate holds the shared model:
//! - Types and symbols
//! - Runtime values and labels
//! - Bound expressions, statements, and the program aggregate
//! - A printer for bound trees

pub mod builtins;
pub mod label;
pub mod operators;
pub mod printer;
pub mod program;
pub mod symbol;
pub mod tree;
pub mod types;
pub mod value;

pub use label::{BoundLabel, LabelKind};
pub use operators::{BinaryOperator, UnaryOperator};
pub use program::BoundProgram;
pub use symbol::{FunctionSymbol, Symbol, VariableKind, VariableSymbol};
pub use tree::*;
pub use types::TypeSymbol;
pub use value::Value;
