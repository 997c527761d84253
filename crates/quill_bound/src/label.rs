//! Compiler-generated jump targets.

use std::fmt;

/// What a label was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Exit of a loop.
    Break,
    /// Re-test point of a loop.
    Continue,
    /// Introduced by lowering.
    Generated,
    /// Target of a `break` or `continue` outside any loop. Never placed.
    Sentinel,
}

/// A jump target. Source code cannot name one, so labels never collide with
/// user identifiers. The id is unique per kind within the binder or lowerer
/// instance that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundLabel {
    pub kind: LabelKind,
    pub id: u32,
}

impl BoundLabel {
    pub fn new(kind: LabelKind, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for BoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LabelKind::Break => write!(f, "break{}", self.id),
            LabelKind::Continue => write!(f, "continue{}", self.id),
            LabelKind::Generated => write!(f, "Label{}", self.id),
            LabelKind::Sentinel => write!(f, "invalid{}", self.id),
        }
    }
}

/// Hands out labels in creation order, numbering each kind separately.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    next_break: u32,
    next_generated: u32,
    next_sentinel: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A break/continue pair for one loop. Both share the loop's number.
    pub fn loop_labels(&mut self) -> (BoundLabel, BoundLabel) {
        self.next_break += 1;
        (
            BoundLabel::new(LabelKind::Break, self.next_break),
            BoundLabel::new(LabelKind::Continue, self.next_break),
        )
    }

    pub fn generated(&mut self) -> BoundLabel {
        self.next_generated += 1;
        BoundLabel::new(LabelKind::Generated, self.next_generated)
    }

    pub fn sentinel(&mut self) -> BoundLabel {
        self.next_sentinel += 1;
        BoundLabel::new(LabelKind::Sentinel, self.next_sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names() {
        let mut labels = LabelGenerator::new();
        let (break_label, continue_label) = labels.loop_labels();
        assert_eq!(break_label.to_string(), "break1");
        assert_eq!(continue_label.to_string(), "continue1");
        assert_eq!(labels.generated().to_string(), "Label1");
        assert_eq!(labels.generated().to_string(), "Label2");
        assert_ne!(break_label, continue_label);
    }
}
