//! quill_evaluator: Running bound programs.
//!
//! Holds the value operations shared by compile-time constant folding and the
//! tree-walking evaluator, so a folded constant is always the value the
//! program would have computed.

mod error;
mod evaluator;
pub mod fold;
pub mod ops;

pub use error::EvalError;
pub use evaluator::{evaluate, BufferedHost, Evaluator, Globals, Host, StdHost, MAX_CALL_DEPTH};
