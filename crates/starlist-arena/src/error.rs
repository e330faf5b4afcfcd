//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use crate::handle::NodeHandle;

/// Errors that can occur during list operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The handle's slot has been vacated or reused since it was issued.
    StaleHandle {
        /// The handle that no longer resolves.
        handle: NodeHandle,
        /// The slot's current generation.
        current_generation: u32,
    },
    /// The handle's index is past the end of the slab.
    OutOfBounds {
        /// The handle that was out of range.
        handle: NodeHandle,
        /// Number of slots in the slab.
        slots: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle {
                handle,
                current_generation,
            } => {
                write!(
                    f,
                    "stale handle: {handle}, slot now at generation {current_generation}"
                )
            }
            Self::OutOfBounds { handle, slots } => {
                write!(f, "handle {handle} out of bounds ({slots} slots)")
            }
        }
    }
}

impl Error for ArenaError {}
