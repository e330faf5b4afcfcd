//! Strongly-typed identifiers for stars and mesh blocks.

use std::fmt;

/// Process-wide unique identifier of a star particle.
///
/// Assigned by the mesh when the particle is created and never reused
/// for the lifetime of the star. This is the key of the lookup index
/// and the only way a mirror copy is matched to its authoritative record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(pub u64);

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StarId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a mesh block (grid) in the adaptive hierarchy.
///
/// A star's `current_grid` holds one of these as a plain back-reference.
/// Holding a `GridId` never implies ownership of the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GridId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(StarId(1_000_000_007).to_string(), "1000000007");
        assert_eq!(GridId(12).to_string(), "12");
    }

    #[test]
    fn ids_order_by_value() {
        assert!(StarId(3) < StarId(4));
        assert_eq!(GridId::from(9), GridId(9));
    }
}
