//! Error types shared across the starlist workspace.
//!
//! Two classes live here. [`InvariantViolation`] reports a desynchronized
//! or misconfigured state that must abort the run; callers never retry
//! or recover from it. [`UnitsError`] and [`PhotonRateError`] report a
//! collaborator failure that aborts only the enclosing sub-phase.

use std::error::Error;
use std::fmt;

use crate::id::{GridId, StarId};

/// A broken bookkeeping invariant. Always fatal to the run.
#[derive(Clone, Debug, PartialEq)]
pub enum InvariantViolation {
    /// The star names a mirror, but the mirror holds no embedded copy of it.
    MirrorCopyMissing {
        /// The star being synchronized.
        star: StarId,
        /// The mirror it names.
        grid: GridId,
    },
    /// The star names a mirror, but the mirror has no native particle for it.
    ParticleMissing {
        /// The star being refreshed.
        star: StarId,
        /// The mirror it names.
        grid: GridId,
    },
    /// The star names a mirror this process does not own.
    GridMissing {
        /// The star holding the reference.
        star: StarId,
        /// The unknown mirror.
        grid: GridId,
    },
    /// Two distinct embedded copies share one identifier.
    DuplicateIdentifier {
        /// The shared identifier.
        star: StarId,
        /// Mirror holding the first copy.
        first: GridId,
        /// Mirror holding the second copy.
        second: GridId,
    },
    /// Composition is stored only as tagged output, so abundances are not
    /// live state and the named operation cannot run.
    ChemicalTagsOnly {
        /// The operation that needed live abundances.
        operation: &'static str,
    },
    /// A hydrogen, carbon or iron fraction could not be found in the
    /// abundance vector.
    CompositionUnset {
        /// The star being classified.
        star: StarId,
        /// Hydrogen fraction found (negative if unset).
        hydrogen: f64,
        /// Carbon fraction found (negative if unset).
        carbon: f64,
        /// Iron fraction found (negative if unset).
        iron: f64,
    },
    /// A native particle's attribute bank is shorter than the layout requires.
    AttributeMissing {
        /// The particle being read.
        star: StarId,
        /// The slot that was out of range.
        slot: usize,
    },
    /// The configured modes need more abundance slots than a star carries.
    TooManyAbundances {
        /// Slots required by the active modes.
        required: usize,
        /// Slots available per star.
        available: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MirrorCopyMissing { star, grid } => {
                write!(f, "star {star} has no embedded copy in grid {grid}")
            }
            Self::ParticleMissing { star, grid } => {
                write!(f, "star {star} has no native particle in grid {grid}")
            }
            Self::GridMissing { star, grid } => {
                write!(f, "star {star} references grid {grid}, which is not local")
            }
            Self::DuplicateIdentifier {
                star,
                first,
                second,
            } => write!(
                f,
                "identifier {star} embedded in both grid {first} and grid {second}"
            ),
            Self::ChemicalTagsOnly { operation } => write!(
                f,
                "{operation}: abundances must be stored as particle attributes"
            ),
            Self::CompositionUnset {
                star,
                hydrogen,
                carbon,
                iron,
            } => write!(
                f,
                "star {star}: could not find C, Fe and H abundances \
                 (H={hydrogen}, C={carbon}, Fe={iron})"
            ),
            Self::AttributeMissing { star, slot } => {
                write!(f, "particle {star} has no attribute slot {slot}")
            }
            Self::TooManyAbundances {
                required,
                available,
            } => write!(
                f,
                "{required} abundance slots required, only {available} available"
            ),
        }
    }
}

impl Error for InvariantViolation {}

/// The unit system could not produce conversion factors.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitsError {
    /// Simulation time that was requested.
    pub time: f64,
    /// Human-readable description of the failure.
    pub reason: String,
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "units unavailable at t={}: {}", self.time, self.reason)
    }
}

impl Error for UnitsError {}

/// The radiation tables could not produce photon rates for a star.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotonRateError {
    /// The star being evaluated.
    pub star: StarId,
    /// Human-readable description of the failure.
    pub reason: String,
}

impl fmt::Display for PhotonRateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "photon rates for star {}: {}", self.star, self.reason)
    }
}

impl Error for PhotonRateError {}
