//! The derived radiation source list.
//!
//! [`RadiationSourceList`] is rebuilt from scratch from the star
//! population on every call to [`rebuild`](RadiationSourceList::rebuild).
//! Each entry describes one star's binned spectrum, luminosity, and ramp
//! time for the radiative transfer solver. New entries are linked at the
//! head, so the list holds sources in reverse population order.

use smallvec::SmallVec;
use starlist_arena::{LinkedArena, NodeHandle};
use starlist_core::{
    GridId, RadiationModel, Star, StarId, StarKind, TypeCode, UnitSystem, Units, MAX_ENERGY_BINS,
};

use crate::context::StarContext;
use crate::error::StarError;
use crate::population::StarPopulation;

/// Lyman-Werner bin.
pub const LW_BIN: usize = 3;

/// Infrared (H- detachment) bin.
pub const IR_BIN: usize = 4;

/// Far-ultraviolet bin.
pub const FUV_BIN: usize = 7;

/// Ramp time of a Population III source, in years.
pub const POPIII_RAMP_YEARS: f64 = 1.0e4;

/// Ramp time unit of a simple source, in years.
pub const SIMPLE_RAMP_YEARS: f64 = 1.0e6;

/// One emitting star as seen by the radiative transfer solver.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiationSource {
    /// The emitting star.
    pub star: StarId,
    /// Grid the star is assigned to.
    pub grid_id: GridId,
    /// Hierarchy level of that grid.
    pub grid_level: u32,
    /// Type code of the star.
    pub type_code: TypeCode,
    /// Position, wrapped into the computational domain.
    pub position: [f64; 3],
    /// Total photon rate in code units.
    pub luminosity: f64,
    /// Lyman-Werner luminosity, when optically thin H2 transport is on.
    pub lw_luminosity: f64,
    /// Infrared luminosity, when optically thin H2 transport is on.
    pub ir_luminosity: f64,
    /// Far-UV luminosity, when optically thin FUV transport is on.
    pub fuv_luminosity: f64,
    /// Time over which the luminosity ramps up after birth.
    pub ramp_time: f64,
    /// Birth time of the star.
    pub creation_time: f64,
    /// Lifetime of the star.
    pub lifetime: f64,
    /// Mean photon energy of each bin (eV).
    pub energies: SmallVec<[f32; MAX_ENERGY_BINS]>,
    /// Fraction of the total photon rate in each bin.
    pub sed: SmallVec<[f64; MAX_ENERGY_BINS]>,
    /// Set by the transfer solver once the emissivity is deposited.
    pub added_emissivity: bool,
}

/// Counts from one rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Sources linked into the list.
    pub emitted: usize,
    /// Radiating stars left out (below the noise floor or too many bins).
    pub skipped: usize,
}

/// Doubly-linked list of radiation sources.
#[derive(Clone, Debug, Default)]
pub struct RadiationSourceList {
    sources: LinkedArena<RadiationSource>,
}

impl RadiationSourceList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// `(handle, source)` pairs from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &RadiationSource)> {
        self.sources.iter()
    }

    /// Sources from head to tail.
    pub fn values(&self) -> impl Iterator<Item = &RadiationSource> {
        self.sources.values()
    }

    /// Shared access to a source.
    pub fn get(&self, handle: NodeHandle) -> Result<&RadiationSource, StarError> {
        Ok(self.sources.get(handle)?)
    }

    /// Mutable access to a source, for the transfer solver's flags.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Result<&mut RadiationSource, StarError> {
        Ok(self.sources.get_mut(handle)?)
    }

    /// Drop every source. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Rebuild the list from the population at `photon_time`.
    ///
    /// In photon test mode the list is left exactly as it is. Otherwise
    /// the previous contents are discarded before anything else, so a
    /// failure part-way leaves the sources built so far.
    pub fn rebuild(
        &mut self,
        population: &StarPopulation,
        photon_time: f64,
        ctx: &StarContext,
        units: &dyn UnitSystem,
        model: &dyn RadiationModel,
    ) -> Result<RebuildStats, StarError> {
        let mut stats = RebuildStats::default();
        if ctx.config().photon_test_problem {
            return Ok(stats);
        }
        self.clear();
        if population.is_empty() {
            return Ok(stats);
        }

        let units = units.units(photon_time)?;
        for star in population.values() {
            if !model.is_radiation_source(star, photon_time) {
                continue;
            }
            let rates = model.photon_rates(star, units.time)?;
            match build_source(star, &rates.energies, &rates.rates, ctx, &units) {
                Some(source) => {
                    let _ = self.sources.push_front(source);
                    stats.emitted += 1;
                }
                None => stats.skipped += 1,
            }
        }
        log::debug!(
            "radiation sources: {} emitted, {} skipped at t={photon_time}",
            stats.emitted,
            stats.skipped
        );
        Ok(stats)
    }
}

fn build_source(
    star: &Star,
    energies: &[f32],
    rates: &[f64],
    ctx: &StarContext,
    units: &Units,
) -> Option<RadiationSource> {
    let config = ctx.config();
    if rates.len() > MAX_ENERGY_BINS {
        log::warn!(
            "star {}: {} energy bins exceed the maximum of {MAX_ENERGY_BINS}",
            star.id,
            rates.len()
        );
        return None;
    }
    let total: f64 = rates.iter().sum();
    if total < config.photon_noise_floor {
        return None;
    }

    let sed: SmallVec<[f64; MAX_ENERGY_BINS]> = rates.iter().map(|q| q / total).collect();
    let conversion = units.photon_rate_conversion();
    let band = |bin: usize| sed.get(bin).map_or(0.0, |fraction| fraction * conversion);

    let (lw_luminosity, ir_luminosity) = if config.optically_thin_h2 {
        (band(LW_BIN), band(IR_BIN))
    } else {
        (0.0, 0.0)
    };
    let fuv_luminosity = if config.optically_thin_fuv {
        band(FUV_BIN)
    } else {
        0.0
    };

    Some(RadiationSource {
        star: star.id,
        grid_id: star.grid_id,
        grid_level: star.level,
        type_code: star.type_code,
        position: wrap_position(star.position, config.domain_left_edge, config.domain_right_edge),
        luminosity: total * conversion,
        lw_luminosity,
        ir_luminosity,
        fuv_luminosity,
        ramp_time: ramp_time(star, ctx, units),
        creation_time: star.birth_time,
        lifetime: star.lifetime,
        energies: energies.iter().copied().collect(),
        sed,
        added_emissivity: false,
    })
}

/// Ramp-up time of a source by kind, in code time units.
pub fn ramp_time(star: &Star, ctx: &StarContext, units: &Units) -> f64 {
    let config = ctx.config();
    let years = units.time_in_years();
    match star.type_code {
        TypeCode::Active(StarKind::PopII) if config.star_cluster_unresolved_model => star.lifetime,
        TypeCode::Active(StarKind::PopII) => years * config.star_cluster_min_dynamical_time,
        TypeCode::Active(StarKind::PopIII) => years * POPIII_RAMP_YEARS,
        TypeCode::Active(StarKind::SimpleSource) => {
            years * SIMPLE_RAMP_YEARS * config.simple_ramp_time
        }
        _ => 0.0,
    }
}

/// Wrap a position into `[left, right)` along each axis, by one period.
pub fn wrap_position(mut position: [f64; 3], left: [f64; 3], right: [f64; 3]) -> [f64; 3] {
    for dim in 0..3 {
        let width = right[dim] - left[dim];
        if position[dim] < left[dim] {
            position[dim] += width;
        } else if position[dim] >= right[dim] {
            position[dim] -= width;
        }
    }
    position
}
