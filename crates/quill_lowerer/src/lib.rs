//! quill_lowerer: From structured bound trees to goto form.
//!
//! - `rewriter`: ownership-taking tree rewriting with per-node defaults
//! - `lowerer`: control flow desugaring, coercions, constant folding, flattening
//! - `flow`: basic blocks, unreachable code pruning, return-path analysis

pub mod flow;
pub mod lowerer;
pub mod rewriter;

pub use flow::{all_paths_return, ControlFlowGraph};
pub use lowerer::{lower, Lowerer};
pub use rewriter::BoundTreeRewriter;
