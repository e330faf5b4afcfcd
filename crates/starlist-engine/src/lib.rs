//! Star population bookkeeping for adaptive-mesh simulations.
//!
//! Owns the per-process star list and keeps it synchronized with the
//! star copies embedded in mesh blocks. Provides merging of close
//! star pairs, Population III and Type Ia classification, the derived
//! radiation source list, and the cross-process exchange that turns
//! remote stars into ghosts. [`StarPass`] drives all of it once per
//! step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod exchange;
pub mod index;
pub mod merge;
pub mod metrics;
pub mod mirror;
pub mod pass;
pub mod population;
pub mod radiation;
pub mod schema;

pub use config::{ConfigError, SniaModel, StarConfig};
pub use context::StarContext;
pub use error::StarError;
pub use exchange::{ChannelExchange, ExchangeError, LocalExchange, StarExchange};
pub use index::{IndexEntry, StarLookupIndex};
pub use metrics::PassMetrics;
pub use pass::StarPass;
pub use population::StarPopulation;
pub use radiation::{RadiationSource, RadiationSourceList, RebuildStats};
pub use schema::TracerSchema;
