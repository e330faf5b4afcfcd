//! Core types and traits for the starlist workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the star record and the narrow interfaces through which the rest of
//! the workspace talks to its external collaborators: the mesh
//! hierarchy, the unit system, and the radiation tables.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod kind;
pub mod particle;
pub mod star;
pub mod traits;
pub mod units;

pub use error::{InvariantViolation, PhotonRateError, UnitsError};
pub use id::{GridId, StarId};
pub use kind::{FeedbackFlag, StarKind, TypeCode};
pub use particle::NativeParticle;
pub use star::{
    AccretionEvent, AccretionHistory, Star, TablePositions, MAX_ACCRETIONS, MAX_STAR_ABUNDANCES,
};
pub use traits::{
    MeshAccess, MeshBlock, PhotonRates, PopIIICriterion, RadiationModel, UnitSystem,
    MAX_ENERGY_BINS,
};
pub use units::Units;
