//! The simulation context threaded through every bookkeeping operation.

use crate::config::{ConfigError, StarConfig};
use crate::schema::TracerSchema;

/// Validated configuration plus the tracer layout derived from it.
///
/// Built once at startup. Operations take `&StarContext` instead of
/// reading process-wide mode flags.
#[derive(Clone, Debug)]
pub struct StarContext {
    config: StarConfig,
    schema: TracerSchema,
}

impl StarContext {
    /// Validate `config` and resolve its tracer layout.
    pub fn new(config: StarConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let schema = TracerSchema::from_config(&config)?;
        Ok(Self { config, schema })
    }

    /// The mode flags.
    pub fn config(&self) -> &StarConfig {
        &self.config
    }

    /// The tracer layout.
    pub fn schema(&self) -> &TracerSchema {
        &self.schema
    }
}
