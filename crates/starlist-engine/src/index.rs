//! Identifier index over the embedded copies of every local mirror.
//!
//! Built once per synchronization pass so that pushing each star to its
//! mirror is a map lookup rather than a scan of the mirror's star list.

use indexmap::IndexMap;
use starlist_core::{GridId, InvariantViolation, MeshAccess, StarId};

use crate::population::StarPopulation;

/// Where an embedded copy lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// The mirror holding the copy.
    pub grid: GridId,
    /// Position of the copy in the mirror's embedded list.
    pub position: usize,
}

/// Transient identifier index.
///
/// Positions are valid only until the next structural change to a
/// mirror's embedded list; rebuild after merging or deleting.
#[derive(Clone, Debug, Default)]
pub struct StarLookupIndex {
    entries: IndexMap<StarId, IndexEntry>,
    mirrors: usize,
}

impl StarLookupIndex {
    /// Index every embedded copy of every mirror referenced by the
    /// population.
    ///
    /// Each mirror is traversed at most once: a star whose own identifier
    /// is already indexed does not trigger a second traversal.
    pub fn build(
        population: &StarPopulation,
        mesh: &dyn MeshAccess,
    ) -> Result<Self, InvariantViolation> {
        let mut index = Self::default();
        for star in population.values() {
            let Some(grid) = star.current_grid else {
                continue;
            };
            if index.entries.contains_key(&star.id) {
                continue;
            }
            let block = mesh.block(grid).ok_or(InvariantViolation::GridMissing {
                star: star.id,
                grid,
            })?;
            for (position, copy) in block.embedded().iter().enumerate() {
                index.insert(copy.id, IndexEntry { grid, position })?;
            }
            index.mirrors += 1;
        }
        log::debug!(
            "star index: {} copies across {} mirror(s)",
            index.entries.len(),
            index.mirrors
        );
        Ok(index)
    }

    fn insert(&mut self, id: StarId, entry: IndexEntry) -> Result<(), InvariantViolation> {
        match self.entries.get(&id) {
            Some(existing) if existing.grid != entry.grid => {
                Err(InvariantViolation::DuplicateIdentifier {
                    star: id,
                    first: existing.grid,
                    second: entry.grid,
                })
            }
            Some(_) => Ok(()),
            None => {
                self.entries.insert(id, entry);
                Ok(())
            }
        }
    }

    /// Location of the embedded copy with the given identifier.
    pub fn get(&self, id: StarId) -> Option<IndexEntry> {
        self.entries.get(&id).copied()
    }

    /// Whether the identifier is indexed.
    pub fn contains(&self, id: StarId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of indexed copies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of mirrors traversed during the build.
    pub fn mirrors(&self) -> usize {
        self.mirrors
    }

    /// Indexed identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = StarId> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlist_test_utils::{embedded_star, ghost_star, MockBlock, MockMesh};

    fn star(id: u64, grid: u32) -> starlist_core::Star {
        embedded_star(id, grid, 7, 1.0, [0.5; 3])
    }

    #[test]
    fn indexes_union_of_referenced_mirrors() {
        let mesh = MockMesh::new()
            .with_block(MockBlock::new(1).with_star(star(1, 1)).with_star(star(2, 1)))
            .with_block(MockBlock::new(2).with_star(star(3, 2)))
            .with_block(MockBlock::new(3).with_star(star(4, 3)));
        // Only mirrors 1 and 2 are referenced.
        let mut pop = StarPopulation::new();
        let _ = pop.push(star(1, 1));
        let _ = pop.push(star(3, 2));
        let _ = pop.push(ghost_star(9, 3, 7, 1.0));

        let index = StarLookupIndex::build(&pop, &mesh).unwrap();
        let mut ids: Vec<_> = index.ids().map(|id| id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(index.mirrors(), 2);
        assert_eq!(
            index.get(StarId(2)),
            Some(IndexEntry {
                grid: GridId(1),
                position: 1
            })
        );
    }

    #[test]
    fn mirror_traversed_once() {
        let mesh = MockMesh::new()
            .with_block(MockBlock::new(1).with_star(star(1, 1)).with_star(star(2, 1)));
        let mut pop = StarPopulation::new();
        let _ = pop.push(star(1, 1));
        let _ = pop.push(star(2, 1));
        let index = StarLookupIndex::build(&pop, &mesh).unwrap();
        assert_eq!(index.mirrors(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn duplicate_identifier_across_mirrors_is_fatal() {
        let mesh = MockMesh::new()
            .with_block(MockBlock::new(1).with_star(star(1, 1)))
            .with_block(MockBlock::new(2).with_star(star(2, 2)).with_star(star(1, 2)));
        let mut pop = StarPopulation::new();
        let _ = pop.push(star(1, 1));
        let _ = pop.push(star(2, 2));
        assert_eq!(
            StarLookupIndex::build(&pop, &mesh).unwrap_err(),
            InvariantViolation::DuplicateIdentifier {
                star: StarId(1),
                first: GridId(1),
                second: GridId(2),
            }
        );
    }

    #[test]
    fn unknown_mirror_is_fatal() {
        let mesh = MockMesh::new();
        let mut pop = StarPopulation::new();
        let _ = pop.push(star(1, 5));
        assert!(matches!(
            StarLookupIndex::build(&pop, &mesh),
            Err(InvariantViolation::GridMissing { .. })
        ));
    }

    #[test]
    fn ghost_only_population_builds_empty() {
        let mesh = MockMesh::new();
        let mut pop = StarPopulation::new();
        let _ = pop.push(ghost_star(1, 1, 7, 1.0));
        assert!(StarLookupIndex::build(&pop, &mesh).unwrap().is_empty());
    }
}
