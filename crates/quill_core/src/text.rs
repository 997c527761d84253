//! Source positions.
//!
//! Offsets are bytes into the text of one compilation unit. Tokens, syntax
//! nodes, symbols and diagnostics all point back into the source with a
//! [`TextSpan`]; [`LineMap`] turns an offset into a line and column only when
//! a diagnostic is rendered.

use std::fmt;
use std::ops::Range;

/// A byte offset into source text.
pub type TextPos = u32;

/// `length` bytes of source starting at `start`.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// The span from `start` up to, but not including, `end`.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    /// Missing tokens are synthesized with an empty span.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// A 1-based line and column, as shown to users.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start offsets of every line in a source text.
#[derive(Debug, Clone)]
pub struct LineMap {
    starts: Vec<TextPos>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| (i + 1) as TextPos))
            .collect();
        Self { starts }
    }

    /// The 0-based index of the line holding `pos`.
    pub fn line_index(&self, pos: TextPos) -> usize {
        self.starts.partition_point(|&start| start <= pos) - 1
    }

    pub fn location_of(&self, pos: TextPos) -> Location {
        let index = self.line_index(pos);
        Location {
            line: index as u32 + 1,
            column: pos - self.starts[index] + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = TextSpan::from_bounds(5, 15);
        assert_eq!(span, TextSpan::new(5, 10));
        assert_eq!(span.end(), 15);
        assert_eq!(span.to_range(), 5..15);
        assert!(TextSpan::from_bounds(7, 7).is_empty());
        assert_eq!(format!("{:?}", span), "5..15");
    }

    #[test]
    fn test_locations() {
        let map = LineMap::new("var a = 1\nvar b = 2\na + b");
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line_index(0), 0);
        assert_eq!(map.line_index(9), 0);
        assert_eq!(map.line_index(10), 1);
        assert_eq!(map.line_index(20), 2);

        let location = map.location_of(14);
        assert_eq!(location, Location { line: 2, column: 5 });
        assert_eq!(location.to_string(), "2:5");
    }

    #[test]
    fn test_offset_past_end() {
        let map = LineMap::new("ab\n");
        assert_eq!(map.location_of(3), Location { line: 2, column: 1 });
        assert_eq!(map.location_of(10).line, 2);
    }
}
