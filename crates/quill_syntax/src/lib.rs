//! quill_syntax: Syntax tree definitions for the quill language.
//!
//! This crate defines the token and node kinds, node flags, and the
//! arena-allocated syntax tree the parser produces and the binder consumes.

pub mod generated;
pub mod node;
pub mod syntax_kind;
pub mod types;

// Re-export key types
pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
