//! Test utilities and mock collaborators for starlist development.
//!
//! Provides in-memory implementations of the collaborator traits
//! ([`MeshBlock`], [`MeshAccess`], [`UnitSystem`], [`RadiationModel`],
//! [`PopIIICriterion`]) plus particle and star fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, HashSet};

use starlist_core::{
    GridId, MeshAccess, MeshBlock, NativeParticle, PhotonRateError, PhotonRates, PopIIICriterion,
    RadiationModel, Star, StarId, UnitSystem, Units, UnitsError,
};

pub use fixtures::*;

/// Mock implementation of [`MeshBlock`].
///
/// Holds native particles and embedded star copies in plain vectors.
#[derive(Clone, Debug)]
pub struct MockBlock {
    pub id: GridId,
    pub level: u32,
    pub time: f64,
    pub cell_width: f64,
    pub particles: Vec<NativeParticle>,
    pub stars: Vec<Star>,
}

impl MockBlock {
    /// An empty level-0 block with unit cell width at time 0.
    pub fn new(id: u32) -> Self {
        Self {
            id: GridId(id),
            level: 0,
            time: 0.0,
            cell_width: 1.0,
            particles: Vec::new(),
            stars: Vec::new(),
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_particle(mut self, particle: NativeParticle) -> Self {
        self.particles.push(particle);
        self
    }

    /// Embed a copy of `star`, pointing its mirror reference at this block.
    pub fn with_star(mut self, mut star: Star) -> Self {
        star.current_grid = Some(self.id);
        star.grid_id = self.id;
        star.level = self.level;
        self.stars.push(star);
        self
    }

    /// Add `star` as both a native particle and an embedded copy.
    ///
    /// The particle carries the common attribute block and the star's
    /// mass unconverted.
    pub fn with_mirrored_star(self, star: Star) -> Self {
        let particle = particle_for(&star);
        self.with_particle(particle).with_star(star)
    }

    /// The embedded copy with the given identifier.
    pub fn star(&self, id: StarId) -> Option<&Star> {
        self.stars.iter().find(|s| s.id == id)
    }

    /// Mutable access to the native particle with the given identifier.
    pub fn particle_mut(&mut self, id: StarId) -> Option<&mut NativeParticle> {
        self.particles.iter_mut().find(|p| p.number == id)
    }
}

impl MeshBlock for MockBlock {
    fn grid_id(&self) -> GridId {
        self.id
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn cell_width(&self) -> f64 {
        self.cell_width
    }

    fn particles(&self) -> &[NativeParticle] {
        &self.particles
    }

    fn embedded(&self) -> &[Star] {
        &self.stars
    }

    fn embedded_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    fn push_embedded(&mut self, star: Star) {
        self.stars.push(star);
    }

    fn remove_embedded(&mut self, id: StarId) -> Option<Star> {
        let pos = self.stars.iter().position(|s| s.id == id)?;
        Some(self.stars.remove(pos))
    }

    fn remove_particle(&mut self, id: StarId) -> Option<NativeParticle> {
        let pos = self.particles.iter().position(|p| p.number == id)?;
        Some(self.particles.remove(pos))
    }
}

/// Mock implementation of [`MeshAccess`].
///
/// Blocks are kept in insertion order. Every call to
/// [`record_star_count`](MeshAccess::record_star_count) is logged in
/// `recorded_counts`.
#[derive(Clone, Debug, Default)]
pub struct MockMesh {
    pub blocks: Vec<MockBlock>,
    pub recorded_counts: Vec<usize>,
}

impl MockMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: MockBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn block_ref(&self, id: u32) -> Option<&MockBlock> {
        self.blocks.iter().find(|b| b.id == GridId(id))
    }

    pub fn block_ref_mut(&mut self, id: u32) -> Option<&mut MockBlock> {
        self.blocks.iter_mut().find(|b| b.id == GridId(id))
    }

    /// Total embedded copies across all blocks.
    pub fn embedded_count(&self) -> usize {
        self.blocks.iter().map(|b| b.stars.len()).sum()
    }
}

impl MeshAccess for MockMesh {
    fn block(&self, id: GridId) -> Option<&dyn MeshBlock> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .map(|b| b as &dyn MeshBlock)
    }

    fn block_mut(&mut self, id: GridId) -> Option<&mut dyn MeshBlock> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .map(|b| b as &mut dyn MeshBlock)
    }

    fn local_grids(&self) -> Vec<GridId> {
        let mut ids: Vec<_> = self.blocks.iter().map(|b| (b.level, b.id)).collect();
        ids.sort_by_key(|&(level, _)| level);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    fn record_star_count(&mut self, count: usize) {
        self.recorded_counts.push(count);
    }
}

/// [`UnitSystem`] returning the same factors at every time.
#[derive(Clone, Copy, Debug)]
pub struct FixedUnits(pub Units);

impl FixedUnits {
    pub fn identity() -> Self {
        Self(Units::IDENTITY)
    }
}

impl UnitSystem for FixedUnits {
    fn units(&self, _time: f64) -> Result<Units, UnitsError> {
        Ok(self.0)
    }
}

/// [`UnitSystem`] that always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingUnits;

impl UnitSystem for FailingUnits {
    fn units(&self, time: f64) -> Result<Units, UnitsError> {
        Err(UnitsError {
            time,
            reason: "mock units unavailable".to_string(),
        })
    }
}

/// [`RadiationModel`] backed by a per-star rate table.
///
/// A star is a radiation source iff it has a table entry and `time` is
/// not before its birth time. Stars listed in `failing` are sources whose
/// rate computation fails.
#[derive(Clone, Debug, Default)]
pub struct TableRadiationModel {
    rates: HashMap<StarId, PhotonRates>,
    failing: HashSet<StarId>,
}

impl TableRadiationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register binned rates for a star. Energies default to 13.6 eV upward.
    pub fn with_rates(mut self, id: u64, rates: &[f64]) -> Self {
        let energies = (0..rates.len()).map(|i| 13.6 + i as f32).collect();
        self.rates.insert(
            StarId(id),
            PhotonRates {
                energies,
                rates: rates.iter().copied().collect(),
            },
        );
        self
    }

    pub fn with_failure(mut self, id: u64) -> Self {
        self.failing.insert(StarId(id));
        self
    }
}

impl RadiationModel for TableRadiationModel {
    fn is_radiation_source(&self, star: &Star, time: f64) -> bool {
        (self.rates.contains_key(&star.id) || self.failing.contains(&star.id))
            && time >= star.birth_time
    }

    fn photon_rates(&self, star: &Star, _time_unit: f64) -> Result<PhotonRates, PhotonRateError> {
        if self.failing.contains(&star.id) {
            return Err(PhotonRateError {
                star: star.id,
                reason: "mock table miss".to_string(),
            });
        }
        self.rates
            .get(&star.id)
            .cloned()
            .ok_or_else(|| PhotonRateError {
                star: star.id,
                reason: "no rates registered".to_string(),
            })
    }
}

/// [`PopIIICriterion`] comparing carbon and iron against fixed minima
/// relative to hydrogen.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdCriterion {
    pub carbon_min: f64,
    pub iron_min: f64,
}

impl Default for ThresholdCriterion {
    fn default() -> Self {
        Self {
            carbon_min: 1.0e-6,
            iron_min: 1.0e-7,
        }
    }
}

impl PopIIICriterion for ThresholdCriterion {
    fn above_threshold(&self, carbon: f64, iron: f64, hydrogen: f64) -> bool {
        hydrogen > 0.0
            && (carbon / hydrogen >= self.carbon_min || iron / hydrogen >= self.iron_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_embedded_by_id() {
        let mut block = MockBlock::new(1)
            .with_star(Star::new(StarId(1)))
            .with_star(Star::new(StarId(2)));
        assert!(block.remove_embedded(StarId(1)).is_some());
        assert!(block.remove_embedded(StarId(1)).is_none());
        assert_eq!(block.stars.len(), 1);
    }

    #[test]
    fn remove_particle_by_id() {
        let mut block = MockBlock::new(1)
            .with_particle(star_particle(1, 7, 1.0))
            .with_particle(star_particle(2, 7, 1.0));
        assert_eq!(block.remove_particle(StarId(2)).unwrap().number, StarId(2));
        assert!(block.remove_particle(StarId(2)).is_none());
        assert_eq!(block.particles.len(), 1);
    }

    #[test]
    fn mirrored_star_has_both_views() {
        let block = MockBlock::new(4).with_mirrored_star(embedded_star(9, 4, -7, 2.0, [0.25; 3]));
        let p = block.find_particle(StarId(9)).unwrap();
        assert_eq!(p.type_code, -7);
        assert_eq!(p.position, [0.25; 3]);
        assert!(block.star(StarId(9)).is_some());
    }

    #[test]
    fn local_grids_coarsest_first() {
        let mesh = MockMesh::new()
            .with_block(MockBlock::new(3).with_level(2))
            .with_block(MockBlock::new(1).with_level(0));
        assert_eq!(mesh.local_grids(), vec![GridId(1), GridId(3)]);
    }

    #[test]
    fn table_model_respects_birth_time() {
        let model = TableRadiationModel::new().with_rates(1, &[1.0]);
        let mut star = Star::new(StarId(1));
        star.birth_time = 5.0;
        assert!(!model.is_radiation_source(&star, 4.0));
        assert!(model.is_radiation_source(&star, 5.0));
    }

    #[test]
    fn threshold_criterion() {
        let c = ThresholdCriterion::default();
        assert!(!c.above_threshold(0.0, 0.0, 0.7));
        assert!(c.above_threshold(1.0e-3, 0.0, 0.7));
    }
}
