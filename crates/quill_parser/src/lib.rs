//! quill_parser: Recursive descent parser for quill.
//!
//! Parses token streams from the scanner into an arena-allocated syntax tree.

mod parser;
mod precedence;
mod utilities;

pub use parser::{parse_text, Parser};
pub use utilities::is_incomplete_submission;
