//! Token information produced by the scanner.

use quill_core::text::{TextPos, TextSpan};
use quill_syntax::{SyntaxKind, TokenFlags};

/// Information about a scanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    /// The kind of token.
    pub kind: SyntaxKind,
    /// Start position in the source text.
    pub pos: TextPos,
    /// End position in the source text (exclusive).
    pub end: TextPos,
    /// The decoded value of the token (identifier name, number text, string contents).
    pub text: String,
    /// Token flags (preceding line break, unterminated).
    pub flags: TokenFlags,
}

impl TokenInfo {
    pub fn new(kind: SyntaxKind, pos: TextPos, end: TextPos) -> Self {
        Self {
            kind,
            pos,
            end,
            text: String::new(),
            flags: TokenFlags::NONE,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.pos, self.end)
    }

    /// Whether there was a line break before this token.
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }
}
