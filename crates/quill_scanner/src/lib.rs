//! quill_scanner: Lexer/tokenizer for quill source code.
//!
//! Produces tokens on demand for the parser, with support for:
//! - Integer and float literals
//! - String literals with `\"`, `\\`, `\n`, `\t` escapes
//! - Unicode identifiers and keywords
//! - `#` line comments

mod char_codes;
mod scanner;
mod token;

pub use scanner::{Scanner, ScannerState};
pub use token::TokenInfo;
