//! The per-step star pass.
//!
//! [`StarPass`] owns the context, the population and the radiation source
//! list. Each step the host calls [`initialize`](StarPass::initialize)
//! once the mesh is up to date, and
//! [`radiation_sources`](StarPass::radiation_sources) before radiative
//! transfer.
//!
//! ```text
//!   mesh particles ──embed──▶ embedded copies ──find_all──▶ local stars
//!                                                               │
//!                                      exchange (all-gather) ◀──┘
//!                                               │
//!                            merge (unless restart), index, push ──▶ mirrors
//! ```

use std::time::Instant;

use starlist_core::{MeshAccess, PopIIICriterion, RadiationModel, UnitSystem};

use crate::context::StarContext;
use crate::error::StarError;
use crate::exchange::{gather_population, StarExchange};
use crate::index::StarLookupIndex;
use crate::merge::{merge_compact_accretors, merge_pending};
use crate::metrics::PassMetrics;
use crate::mirror::{copy_to_grid_map, embed_new_particles};
use crate::population::StarPopulation;
use crate::radiation::RadiationSourceList;

/// Star bookkeeping state carried from step to step.
#[derive(Debug)]
pub struct StarPass {
    ctx: StarContext,
    population: StarPopulation,
    sources: RadiationSourceList,
}

impl StarPass {
    /// A pass with an empty population.
    pub fn new(ctx: StarContext) -> Self {
        Self {
            ctx,
            population: StarPopulation::new(),
            sources: RadiationSourceList::new(),
        }
    }

    /// The context.
    pub fn context(&self) -> &StarContext {
        &self.ctx
    }

    /// The population as of the last [`initialize`](Self::initialize).
    pub fn population(&self) -> &StarPopulation {
        &self.population
    }

    /// Mutable access to the population, for feedback collaborators.
    pub fn population_mut(&mut self) -> &mut StarPopulation {
        &mut self.population
    }

    /// The radiation sources as of the last rebuild.
    pub fn sources(&self) -> &RadiationSourceList {
        &self.sources
    }

    /// Bring the population in line with the mesh.
    ///
    /// Embeds newly materialized particles, gathers every local star,
    /// exchanges them with the other processes, merges close pairs
    /// (skipped on the first step after a restart), and pushes every
    /// local star back to its mirror through a freshly built index.
    ///
    /// Fatal errors are logged here before being returned.
    pub fn initialize(
        &mut self,
        mesh: &mut dyn MeshAccess,
        units: &dyn UnitSystem,
        criterion: &dyn PopIIICriterion,
        exchange: &mut dyn StarExchange,
        restart: bool,
    ) -> Result<PassMetrics, StarError> {
        self.run_initialize(mesh, units, criterion, exchange, restart)
            .inspect_err(|e| {
                if e.is_fatal() {
                    log::error!("star pass aborted: {e}");
                } else {
                    log::warn!("star pass failed: {e}");
                }
            })
    }

    fn run_initialize(
        &mut self,
        mesh: &mut dyn MeshAccess,
        units: &dyn UnitSystem,
        criterion: &dyn PopIIICriterion,
        exchange: &mut dyn StarExchange,
        restart: bool,
    ) -> Result<PassMetrics, StarError> {
        let start = Instant::now();
        let mut metrics = PassMetrics::default();

        for grid in mesh.local_grids() {
            if let Some(block) = mesh.block_mut(grid) {
                metrics.embedded += embed_new_particles(block, &self.ctx, units, criterion)?;
            }
        }

        let local = StarPopulation::find_all(mesh);
        let mut population = gather_population(local, exchange)?;
        mesh.record_star_count(population.len());

        if !restart {
            let config = self.ctx.config();
            metrics.merges +=
                merge_pending(&mut population, mesh, config.star_cluster_combine_radius)?;
            metrics.merges +=
                merge_compact_accretors(&mut population, mesh, config.mbh_combine_radius)?;
        }

        let index = StarLookupIndex::build(&population, mesh)?;
        for star in population.values() {
            if copy_to_grid_map(star, &index, mesh)? {
                metrics.synced += 1;
            }
        }

        metrics.stars = population.len();
        metrics.ghosts = population.ghosts();
        self.population = population;
        metrics.total_us = start.elapsed().as_micros() as u64;
        log::debug!(
            "star pass: {} stars ({} ghosts), {} merged, {} synced",
            metrics.stars,
            metrics.ghosts,
            metrics.merges,
            metrics.synced
        );
        Ok(metrics)
    }

    /// Rebuild the radiation source list at `photon_time`.
    pub fn radiation_sources(
        &mut self,
        photon_time: f64,
        units: &dyn UnitSystem,
        model: &dyn RadiationModel,
    ) -> Result<PassMetrics, StarError> {
        let start = Instant::now();
        let stats = self
            .sources
            .rebuild(&self.population, photon_time, &self.ctx, units, model)?;
        Ok(PassMetrics {
            stars: self.population.len(),
            ghosts: self.population.ghosts(),
            sources_emitted: stats.emitted,
            sources_skipped: stats.skipped,
            total_us: start.elapsed().as_micros() as u64,
            ..PassMetrics::default()
        })
    }
}
