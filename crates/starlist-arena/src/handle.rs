//! Node handles.
//!
//! A [`NodeHandle`] encodes a slot index plus the generation of the slot
//! at the time the node was inserted. Resolving a handle whose generation
//! no longer matches fails instead of aliasing a newer node.

use std::fmt;

/// Stable reference to one node of a [`LinkedArena`](crate::LinkedArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct NodeHandle {
    /// Slot index within the arena.
    pub(crate) index: u32,
    /// Slot generation when the node was inserted.
    pub(crate) generation: u32,
}

impl NodeHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle(idx={}, gen={})", self.index, self.generation)
    }
}
