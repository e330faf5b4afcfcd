//! Narrow interfaces to the collaborators this workspace does not own.
//!
//! The mesh hierarchy, the unit system, the stellar radiation tables and
//! the Population III metallicity criterion are all external. Each is
//! consumed through one of the traits below.

use smallvec::SmallVec;

use crate::error::{PhotonRateError, UnitsError};
use crate::id::{GridId, StarId};
use crate::particle::NativeParticle;
use crate::star::Star;
use crate::units::Units;

/// Maximum number of photon energy bins per source.
pub const MAX_ENERGY_BINS: usize = 16;

/// One mesh block as seen by the star bookkeeping.
///
/// A block holds two views of its stars: the native particle arrays
/// (the mesh's own storage) and an ordered list of embedded [`Star`]
/// copies that mirror the authoritative records.
pub trait MeshBlock {
    /// Identifier of this block.
    fn grid_id(&self) -> GridId;

    /// Hierarchy level of this block.
    fn level(&self) -> u32;

    /// Current simulation time of this block.
    fn time(&self) -> f64;

    /// Cell width along the first axis, in code units.
    fn cell_width(&self) -> f64;

    /// Native particle records.
    fn particles(&self) -> &[NativeParticle];

    /// Embedded star copies, in block order.
    fn embedded(&self) -> &[Star];

    /// Mutable access to the embedded star copies.
    fn embedded_mut(&mut self) -> &mut [Star];

    /// Append an embedded copy at the end of the block's star list.
    fn push_embedded(&mut self, star: Star);

    /// Remove the embedded copy with the given identifier.
    fn remove_embedded(&mut self, id: StarId) -> Option<Star>;

    /// Remove the native particle with the given identifier.
    ///
    /// Called when the star has been absorbed by another, so the block
    /// does not rebuild it from the particle on the next pass.
    fn remove_particle(&mut self, id: StarId) -> Option<NativeParticle>;

    /// Locate a native particle by identifier (linear search).
    fn find_particle(&self, id: StarId) -> Option<&NativeParticle> {
        self.particles().iter().find(|p| p.number == id)
    }
}

/// The process-local part of the mesh hierarchy.
pub trait MeshAccess {
    /// Look up a block owned by this process.
    fn block(&self, id: GridId) -> Option<&dyn MeshBlock>;

    /// Mutable lookup of a block owned by this process.
    fn block_mut(&mut self, id: GridId) -> Option<&mut dyn MeshBlock>;

    /// All blocks owned by this process, coarsest level first.
    fn local_grids(&self) -> Vec<GridId>;

    /// Accounting hook: total star count after a gather.
    fn record_star_count(&mut self, count: usize);
}

/// Source of code-unit conversion factors.
pub trait UnitSystem {
    /// Conversion factors valid at the given simulation time.
    fn units(&self, time: f64) -> Result<Units, UnitsError>;
}

/// Photon rates of one source, binned in energy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotonRates {
    /// Mean photon energy of each bin (eV).
    pub energies: SmallVec<[f32; MAX_ENERGY_BINS]>,
    /// Photon rate in each bin (1/s).
    pub rates: SmallVec<[f64; MAX_ENERGY_BINS]>,
}

impl PhotonRates {
    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.rates.len()
    }

    /// Sum over all bins.
    pub fn total(&self) -> f64 {
        self.rates.iter().sum()
    }
}

/// Stellar radiation tables.
pub trait RadiationModel {
    /// Whether the star emits radiation at `time`.
    fn is_radiation_source(&self, star: &Star, time: f64) -> bool;

    /// Binned photon rates of the star. `time_unit` is seconds per code
    /// time unit.
    fn photon_rates(&self, star: &Star, time_unit: f64) -> Result<PhotonRates, PhotonRateError>;
}

/// Composition criterion for Population III classification of remnants.
pub trait PopIIICriterion {
    /// True when the given carbon, iron and hydrogen mass fractions are
    /// above the critical enrichment (the star is not Population III).
    fn above_threshold(&self, carbon: f64, iron: f64, hydrogen: f64) -> bool;
}
