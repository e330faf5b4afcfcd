//! Native particle records as stored by a mesh block.
//!
//! The mesh keeps particles in flat arrays with a fixed bank of
//! attribute slots whose meaning depends on the active modes. The first
//! four slots are common to every star kind; the rest are laid out by
//! the engine's tracer schema.

use smallvec::SmallVec;

use crate::id::StarId;

/// Attribute slot holding the birth time.
pub const ATTR_BIRTH_TIME: usize = 0;
/// Attribute slot holding the dynamical time (classic stars) or lifetime.
pub const ATTR_DYNAMICAL_TIME: usize = 1;
/// Attribute slot holding the metallicity fraction.
pub const ATTR_METALLICITY: usize = 2;
/// Attribute slot holding the birth mass of individual stars (solar masses).
pub const ATTR_BIRTH_MASS: usize = 3;
/// First attribute slot of the abundance block for individual stars.
pub const ATTR_ABUNDANCE_START: usize = 4;

/// Inline capacity of the attribute bank before it spills to the heap.
pub const INLINE_ATTRIBUTES: usize = 24;

/// One particle as seen in a mesh block's native arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeParticle {
    /// Particle identifier, shared with the star record.
    pub number: StarId,
    /// Raw signed type code.
    pub type_code: i32,
    /// Position.
    pub position: [f64; 3],
    /// Velocity.
    pub velocity: [f64; 3],
    /// Mass in code density units.
    pub mass: f64,
    /// Mode-dependent attribute bank.
    pub attributes: SmallVec<[f64; INLINE_ATTRIBUTES]>,
}

impl NativeParticle {
    /// Read an attribute slot, or `None` if the bank is too short.
    pub fn attribute(&self, slot: usize) -> Option<f64> {
        self.attributes.get(slot).copied()
    }

    /// Wind ejecta mass, stored in the second-to-last slot.
    pub fn wind_mass_ejected(&self) -> Option<f64> {
        let n = self.attributes.len();
        n.checked_sub(2).and_then(|slot| self.attribute(slot))
    }

    /// Supernova ejecta mass, stored in the last slot.
    pub fn sn_mass_ejected(&self) -> Option<f64> {
        self.attributes.last().copied()
    }
}
