//! Scope management for the binder.

use quill_bound::Symbol;
use rustc_hash::FxHashMap;

/// One level of the scope chain.
#[derive(Debug, Default)]
struct Frame {
    names: FxHashMap<String, Symbol>,
}

/// A stack of frames, innermost last. Lookup walks from the top down, so an
/// inner declaration shadows an outer one of the same name.
///
/// The root frame holds built-ins, host functions, user functions and
/// top-level variables of the submission being bound. Frames below it hold
/// the symbols of earlier submissions, oldest at the bottom.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
    root: usize,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            root: 0,
        }
    }

    /// Seal the current frames as history and start a fresh root frame.
    pub fn push_root(&mut self) {
        self.frames.push(Frame::default());
        self.root = self.frames.len() - 1;
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Leave the innermost frame. The root frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > self.root + 1 {
            self.frames.pop();
        }
    }

    /// Declare in the innermost frame. Returns `false` when the name is
    /// already taken there.
    pub fn declare(&mut self, symbol: Symbol) -> bool {
        let top = self.frames.len() - 1;
        Self::insert(&mut self.frames[top], symbol)
    }

    /// Declare in the root frame, regardless of nesting.
    pub fn declare_in_root(&mut self, symbol: Symbol) -> bool {
        let root = self.root;
        Self::insert(&mut self.frames[root], symbol)
    }

    fn insert(frame: &mut Frame, symbol: Symbol) -> bool {
        if frame.names.contains_key(symbol.name()) {
            return false;
        }
        frame.names.insert(symbol.name().to_string(), symbol);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.names.get(name))
    }

    #[cfg(test)]
    fn is_at_root(&self) -> bool {
        self.frames.len() == self.root + 1
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
