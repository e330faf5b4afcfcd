//! Benchmark profiles for the starlist workspace.
//!
//! Provides deterministic star populations spread over a flat mesh:
//!
//! - [`populated_mesh`]: `blocks` blocks holding `per_block` stars each
//! - [`synced_population`]: the population gathered from such a mesh

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use starlist_core::Star;
use starlist_engine::StarPopulation;
use starlist_test_utils::{embedded_star, MockBlock, MockMesh};

/// Build a single-level mesh of `blocks` blocks with `per_block` formed
/// star clusters each, as particles and embedded copies. Identifiers
/// are dense from 1.
pub fn populated_mesh(blocks: u32, per_block: u32) -> MockMesh {
    let mut mesh = MockMesh::new();
    for grid in 0..blocks {
        let mut block = MockBlock::new(grid);
        for k in 0..per_block {
            let id = u64::from(grid) * u64::from(per_block) + u64::from(k) + 1;
            block = block.with_mirrored_star(star_at(id, grid, blocks, k, per_block));
        }
        mesh = mesh.with_block(block);
    }
    mesh
}

/// Gather the population of a mesh built by [`populated_mesh`].
pub fn synced_population(mesh: &MockMesh) -> StarPopulation {
    StarPopulation::find_all(mesh)
}

/// Stars spread along the diagonal so that no two coincide.
fn star_at(id: u64, grid: u32, blocks: u32, k: u32, per_block: u32) -> Star {
    let t = (f64::from(grid) + f64::from(k) / f64::from(per_block.max(1))) / f64::from(blocks.max(1));
    let mut star = embedded_star(id, grid, 7, 1.0 + f64::from(k % 7), [t; 3]);
    star.birth_time = f64::from(k);
    star
}
