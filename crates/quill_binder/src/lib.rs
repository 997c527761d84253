//! quill_binder: Name resolution and type checking.
//!
//! Turns parsed compilation units into a lowered [`quill_bound::BoundProgram`]:
//! - Scopes and symbol declaration
//! - Operator resolution and conversion classification
//! - Diagnostics with per-statement suppression
//! - Entry point selection for scripts and programs

mod binder;
pub mod conversion;
pub mod operators;
mod reporter;
pub mod scope;

pub use binder::{bind_program, bind_submission, ProgramBinder, GLOBAL_FUNCTION_NAME, MAIN_FUNCTION_NAME};
pub use conversion::{classify, Conversion};
pub use reporter::BindReporter;
