//! Arena allocation for syntax trees.
//!
//! The parser allocates every syntax node and node list from a bump arena.
//! A tree borrows from its arena, so the whole tree is freed at once when
//! the arena is dropped.

use bumpalo::Bump;

/// The syntax arena wraps a bump allocator for parser allocations.
pub struct SyntaxArena {
    bump: Bump,
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Get a reference to the underlying bump allocator.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }
}

impl Default for SyntaxArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Move a vector's elements into `bump` and return them as a slice.
pub fn alloc_vec_in<T>(bump: &Bump, items: Vec<T>) -> &[T] {
    if items.is_empty() {
        return &[];
    }
    bump.alloc_slice_fill_iter(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_vec_preserves_order() {
        let arena = SyntaxArena::new();
        let slice = alloc_vec_in(arena.bump(), vec![String::from("a"), String::from("b")]);
        assert_eq!(slice, &["a".to_string(), "b".to_string()]);
        assert!(alloc_vec_in(arena.bump(), Vec::<u8>::new()).is_empty());
    }
}
