//! Star bookkeeping configuration, validation, and error types.
//!
//! [`StarConfig`] carries every mode flag the bookkeeping reads. It is
//! validated once and then frozen inside a
//! [`StarContext`](crate::context::StarContext) together with the
//! [`TracerSchema`](crate::schema::TracerSchema) derived from it.

use std::error::Error;
use std::fmt;

use starlist_core::InvariantViolation;

// ── SniaModel ──────────────────────────────────────────────────────

/// Type Ia supernova model for individual white dwarfs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SniaModel {
    /// No Type Ia supernovae.
    #[default]
    Off,
    /// Single delay-time distribution, no channel tracking.
    DelayTime,
    /// Four explosion channels, each tracked by a tracer abundance slot.
    Channels,
}

impl SniaModel {
    /// Whether per-channel tracer slots are present.
    pub fn tracks_channels(self) -> bool {
        matches!(self, Self::Channels)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`StarConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A numeric parameter is NaN, infinite, or out of range.
    InvalidParameter {
        /// The parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// The Type Ia mass window is empty.
    InvalidSniaWindow {
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },
    /// A domain edge pair is not strictly increasing.
    InvalidDomain {
        /// The axis with the bad edges.
        axis: usize,
    },
    /// Composition lookups need an atomic-number list.
    MissingSpecies {
        /// Description of the mode that needed it.
        reason: String,
    },
    /// The tracer layout does not fit in a star.
    Layout(InvariantViolation),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name, value } => {
                write!(f, "{name} must be finite and non-negative, got {value}")
            }
            Self::InvalidSniaWindow { min, max } => {
                write!(f, "snia mass window is empty: min {min} >= max {max}")
            }
            Self::InvalidDomain { axis } => {
                write!(f, "domain edges on axis {axis} are not increasing")
            }
            Self::MissingSpecies { reason } => write!(f, "missing yield species: {reason}"),
            Self::Layout(e) => write!(f, "tracer layout: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvariantViolation> for ConfigError {
    fn from(e: InvariantViolation) -> Self {
        Self::Layout(e)
    }
}

// ── StarConfig ─────────────────────────────────────────────────────

/// Mode flags and parameters for the star bookkeeping.
#[derive(Clone, Debug)]
pub struct StarConfig {
    /// Composition is written as tagged output only; live abundances are
    /// never populated and classification cannot run. Default: false.
    pub chemical_tags_only: bool,
    /// Atomic numbers of the tracked yield species, in abundance-slot order.
    pub yield_atomic_numbers: Vec<u8>,
    /// Track AGB metal density (one extra slot). Default: false.
    pub track_agb_metal_density: bool,
    /// Track wind metal density (two extra slots). Default: false.
    pub track_wind_density: bool,
    /// Population III formation is enabled. Default: false.
    pub popiii_formation: bool,
    /// Population III yields are tracked per species. Default: false.
    pub popiii_separate_yields: bool,
    /// Critical metallicity for Population III remnants. Zero or less
    /// selects the composition criterion instead. Default: 0.
    pub popiii_metal_critical_fraction: f64,
    /// Type Ia supernova model. Default: [`SniaModel::Off`].
    pub snia_model: SniaModel,
    /// Lower birth-mass bound for Type Ia progenitors (solar). Default: 3.
    pub snia_min_mass: f64,
    /// Upper birth-mass bound for Type Ia progenitors (solar). Default: 8.
    pub snia_max_mass: f64,
    /// Cache lookup-table positions in particle attributes. Default: false.
    pub save_table_positions: bool,
    /// First attribute slot of the cached table positions.
    pub table_start_slot: usize,
    /// Pre-formation clusters closer than this merge (code length). Default: 0.
    pub star_cluster_combine_radius: f64,
    /// Massive black holes closer than this merge (code length). Default: 0.
    pub mbh_combine_radius: f64,
    /// Use the unresolved cluster model for Population II ramps. Default: false.
    pub star_cluster_unresolved_model: bool,
    /// Minimum cluster dynamical time in years. Default: 1e7.
    pub star_cluster_min_dynamical_time: f64,
    /// Ramp time of simple sources in Myr. Default: 0.
    pub simple_ramp_time: f64,
    /// Optically thin H2 dissociation is on; fill LW and IR luminosities.
    /// Default: false.
    pub optically_thin_h2: bool,
    /// Optically thin FUV heating is on; fill FUV luminosity. Default: false.
    pub optically_thin_fuv: bool,
    /// Sources with a total photon rate below this are skipped. Default: 1e-10.
    pub photon_noise_floor: f64,
    /// Photon test problem: radiation sources are set up externally and
    /// never rebuilt. Default: false.
    pub photon_test_problem: bool,
    /// Lower domain edges (code length). Default: 0.
    pub domain_left_edge: [f64; 3],
    /// Upper domain edges (code length). Default: 1.
    pub domain_right_edge: [f64; 3],
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            chemical_tags_only: false,
            yield_atomic_numbers: Vec::new(),
            track_agb_metal_density: false,
            track_wind_density: false,
            popiii_formation: false,
            popiii_separate_yields: false,
            popiii_metal_critical_fraction: 0.0,
            snia_model: SniaModel::Off,
            snia_min_mass: 3.0,
            snia_max_mass: 8.0,
            save_table_positions: false,
            table_start_slot: 0,
            star_cluster_combine_radius: 0.0,
            mbh_combine_radius: 0.0,
            star_cluster_unresolved_model: false,
            star_cluster_min_dynamical_time: 1.0e7,
            simple_ramp_time: 0.0,
            optically_thin_h2: false,
            optically_thin_fuv: false,
            photon_noise_floor: 1.0e-10,
            photon_test_problem: false,
            domain_left_edge: [0.0; 3],
            domain_right_edge: [1.0; 3],
        }
    }
}

impl StarConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("star_cluster_combine_radius", self.star_cluster_combine_radius),
            ("mbh_combine_radius", self.mbh_combine_radius),
            (
                "star_cluster_min_dynamical_time",
                self.star_cluster_min_dynamical_time,
            ),
            ("simple_ramp_time", self.simple_ramp_time),
            ("photon_noise_floor", self.photon_noise_floor),
            ("snia_min_mass", self.snia_min_mass),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { name, value });
            }
        }
        if !self.popiii_metal_critical_fraction.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "popiii_metal_critical_fraction",
                value: self.popiii_metal_critical_fraction,
            });
        }
        if self.snia_model.tracks_channels()
            && !(self.snia_max_mass.is_finite() && self.snia_min_mass < self.snia_max_mass)
        {
            return Err(ConfigError::InvalidSniaWindow {
                min: self.snia_min_mass,
                max: self.snia_max_mass,
            });
        }
        for axis in 0..3 {
            let (lo, hi) = (self.domain_left_edge[axis], self.domain_right_edge[axis]);
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(ConfigError::InvalidDomain { axis });
            }
        }
        // The composition criterion looks species up by atomic number.
        if self.popiii_formation
            && self.popiii_metal_critical_fraction <= 0.0
            && !self.chemical_tags_only
        {
            for z in [1u8, 6, 26] {
                if !self.yield_atomic_numbers.contains(&z) {
                    return Err(ConfigError::MissingSpecies {
                        reason: format!(
                            "composition criterion needs atomic number {z} in yield_atomic_numbers"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Width of the periodic domain along each axis.
    pub fn domain_width(&self) -> [f64; 3] {
        std::array::from_fn(|i| self.domain_right_edge[i] - self.domain_left_edge[i])
    }
}
