//! Flag types for syntax nodes and tokens.

bitflags::bitflags! {
    /// Flags for syntax nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        const NONE                 = 0;
        /// The parser reported an error while building this node.
        const THIS_NODE_HAS_ERROR  = 1 << 0;
        /// The node was synthesized for a missing token.
        const MISSING              = 1 << 1;
    }
}

bitflags::bitflags! {
    /// Flags for scanned tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u32 {
        const NONE                 = 0;
        const PRECEDING_LINE_BREAK = 1 << 0;
        const UNTERMINATED         = 1 << 1;
    }
}
