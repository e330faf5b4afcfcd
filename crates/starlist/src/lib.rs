//! Starlist: star particle bookkeeping for distributed adaptive-mesh
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all starlist sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use starlist::prelude::*;
//! use starlist_test_utils::{embedded_star, FixedUnits, MockBlock, MockMesh, ThresholdCriterion};
//!
//! // One block holding one formed star cluster.
//! let mut mesh = MockMesh::new()
//!     .with_block(MockBlock::new(1).with_star(embedded_star(1, 1, 7, 1.0, [0.5; 3])));
//!
//! let ctx = StarContext::new(StarConfig::default()).unwrap();
//! let mut pass = StarPass::new(ctx);
//! let metrics = pass
//!     .initialize(
//!         &mut mesh,
//!         &FixedUnits::identity(),
//!         &ThresholdCriterion::default(),
//!         &mut LocalExchange,
//!         false,
//!     )
//!     .unwrap();
//! assert_eq!(metrics.stars, 1);
//! assert_eq!(metrics.synced, 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `starlist-core` | Star record, type codes, collaborator traits, errors |
//! | [`arena`] | `starlist-arena` | Generational linked arena and handles |
//! | [`codec`] | `starlist-codec` | Transfer buffer and wire format |
//! | [`engine`] | `starlist-engine` | Population, mirror sync, merging, radiation, the pass |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Star record, identifiers, and collaborator traits (`starlist-core`).
pub use starlist_core as types;

/// Generational linked arena (`starlist-arena`).
///
/// Backs both the star population and the radiation source list.
pub use starlist_arena as arena;

/// Transfer buffer and its wire form (`starlist-codec`).
pub use starlist_codec as codec;

/// Bookkeeping engine (`starlist-engine`).
///
/// [`engine::StarPass`] drives a step; the submodules expose each
/// operation on its own.
pub use starlist_engine as engine;

/// Common imports for typical starlist usage.
///
/// ```rust
/// use starlist::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use starlist_core::{
        GridId, MeshAccess, MeshBlock, PopIIICriterion, RadiationModel, Star, StarId, StarKind,
        TypeCode, UnitSystem, Units,
    };

    // Errors
    pub use starlist_core::{InvariantViolation, PhotonRateError, UnitsError};
    pub use starlist_engine::{ConfigError, ExchangeError, StarError};

    // Arena
    pub use starlist_arena::NodeHandle;

    // Codec
    pub use starlist_codec::StarBuffer;

    // Engine
    pub use starlist_engine::{
        ChannelExchange, LocalExchange, PassMetrics, RadiationSource, RadiationSourceList,
        StarConfig, StarContext, StarExchange, StarPass, StarPopulation,
    };
}
