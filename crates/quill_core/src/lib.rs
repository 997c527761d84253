//! quill_core: Core utilities shared by every phase of the quill compiler.
//!
//! Provides source text spans, line lookup for diagnostics, and the bump
//! arena that syntax trees are allocated in.

pub mod arena;
pub mod text;

// Re-export commonly used types
pub use arena::SyntaxArena;
pub use text::{LineMap, Location, TextPos, TextSpan};
