//! The process-local authoritative star list.
//!
//! [`StarPopulation`] holds every star this process knows about: local
//! stars (mirrored in a block this process owns) and ghosts (mirrored
//! elsewhere). Order is insertion order; traversal is the only way to
//! enumerate it.

use starlist_arena::{LinkedArena, NodeHandle};
use starlist_core::{MeshAccess, Star, StarId};

use crate::error::StarError;
use crate::mirror;

/// Ordered, doubly-linked star list with generational handles.
#[derive(Clone, Debug, Default)]
pub struct StarPopulation {
    stars: LinkedArena<Star>,
}

impl StarPopulation {
    /// An empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stars.
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Number of ghost stars.
    pub fn ghosts(&self) -> usize {
        self.values().filter(|s| s.is_ghost()).count()
    }

    /// Append a star at the end.
    pub fn push(&mut self, star: Star) -> NodeHandle {
        self.stars.push_back(star)
    }

    /// Insert a star after `anchor`, or at the front when `anchor` is `None`.
    pub fn insert_after(
        &mut self,
        anchor: Option<NodeHandle>,
        star: Star,
    ) -> Result<NodeHandle, StarError> {
        Ok(self.stars.insert_after(anchor, star)?)
    }

    /// Unlink a star and hand it back.
    pub fn pop(&mut self, handle: NodeHandle) -> Result<Star, StarError> {
        Ok(self.stars.pop(handle)?)
    }

    /// Unlink and drop a star. Its mirror is not touched.
    pub fn delete(&mut self, handle: NodeHandle) -> Result<(), StarError> {
        Ok(self.stars.delete(handle)?)
    }

    /// Unlink a star and remove it from its mirror, embedded copy and
    /// native particle both. Ghosts leave the mesh untouched.
    pub fn remove(
        &mut self,
        handle: NodeHandle,
        mesh: &mut dyn MeshAccess,
    ) -> Result<Star, StarError> {
        mirror::retire_in_grid(self.stars.get(handle)?, mesh)?;
        self.pop(handle)
    }

    /// Shared access to a star.
    pub fn get(&self, handle: NodeHandle) -> Result<&Star, StarError> {
        Ok(self.stars.get(handle)?)
    }

    /// Mutable access to a star.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Result<&mut Star, StarError> {
        Ok(self.stars.get_mut(handle)?)
    }

    /// Handle of the star with the given identifier (linear search).
    pub fn find(&self, id: StarId) -> Option<NodeHandle> {
        self.stars
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(h, _)| h)
    }

    /// `(handle, star)` pairs in list order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Star)> {
        self.stars.iter()
    }

    /// Stars in list order.
    pub fn values(&self) -> impl Iterator<Item = &Star> {
        self.stars.values()
    }

    /// Snapshot of handles in list order, for walks that mutate.
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.stars.handles()
    }

    /// Drop every star. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.stars.clear();
    }

    /// Consume the population, yielding its stars in list order.
    pub fn into_stars(mut self) -> Vec<Star> {
        self.stars.drain()
    }

    /// Collect a copy of every embedded star in every local block,
    /// coarsest level first, with mirror references set.
    pub fn find_all(mesh: &dyn MeshAccess) -> Self {
        let mut population = Self::new();
        for grid in mesh.local_grids() {
            let Some(block) = mesh.block(grid) else {
                continue;
            };
            for copy in block.embedded() {
                let mut star = copy.clone();
                star.current_grid = Some(grid);
                star.grid_id = grid;
                star.level = block.level();
                let _ = population.push(star);
            }
        }
        population
    }
}
