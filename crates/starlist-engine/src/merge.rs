//! Merge eligibility, the mass-weighted merge, and the merge passes.

use starlist_core::{MeshAccess, Star, StarKind, TypeCode};

use crate::error::StarError;
use crate::population::StarPopulation;

/// Both stars are unformed and of the same kind.
pub fn mergable(a: &Star, b: &Star) -> bool {
    a.type_code == b.type_code && a.type_code.is_pending()
}

/// Both stars are formed massive black holes.
pub fn mergable_compact_accretor(a: &Star, b: &Star) -> bool {
    a.type_code == b.type_code && a.type_code == TypeCode::Active(StarKind::Mbh)
}

/// Squared distance between two stars.
pub fn separation2(a: &Star, b: &Star) -> f64 {
    a.position
        .iter()
        .zip(&b.position)
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// Distance between two stars.
pub fn separation(a: &Star, b: &Star) -> f64 {
    separation2(a, b).sqrt()
}

/// Squared relative speed of two stars.
pub fn relative_velocity2(a: &Star, b: &Star) -> f64 {
    a.velocity
        .iter()
        .zip(&b.velocity)
        .map(|(u, v)| (u - v) * (u - v))
        .sum()
}

/// Absorb `donor` into `receiver`.
///
/// Position, velocity, accreted angular momentum, and metallicity become
/// mass-weighted averages. Mass, mass delta, last accretion rate, and
/// unejected mass are summed. Final mass is a per-star target and is
/// left as the receiver's. The caller discards the donor.
pub fn merge(receiver: &mut Star, donor: &Star) {
    let total = receiver.mass + donor.mass;
    let r1 = if total > 0.0 { receiver.mass / total } else { 0.5 };
    let r2 = 1.0 - r1;

    receiver.metallicity = r1 * receiver.metallicity + r2 * donor.metallicity;
    for dim in 0..3 {
        receiver.position[dim] = r1 * receiver.position[dim] + r2 * donor.position[dim];
        receiver.velocity[dim] = r1 * receiver.velocity[dim] + r2 * donor.velocity[dim];
        receiver.accreted_angular_momentum[dim] = (r1
            * f64::from(receiver.accreted_angular_momentum[dim])
            + r2 * f64::from(donor.accreted_angular_momentum[dim]))
            as f32;
    }
    receiver.mass += donor.mass;
    receiver.delta_mass += donor.delta_mass;
    receiver.last_accretion_rate += donor.last_accretion_rate;
    receiver.not_ejected_mass += donor.not_ejected_mass;
}

/// Merge every pair satisfying `eligible` that lies within `radius`.
///
/// Walks the list in order; each star absorbs every later eligible
/// neighbour, and absorbed stars are removed from the list and from their
/// mirror. Returns the number of merges.
fn merge_within(
    population: &mut StarPopulation,
    mesh: &mut dyn MeshAccess,
    radius: f64,
    eligible: fn(&Star, &Star) -> bool,
) -> Result<usize, StarError> {
    if radius <= 0.0 {
        return Ok(0);
    }
    let radius2 = radius * radius;
    let mut merges = 0;
    let handles = population.handles();

    for (i, &receiver) in handles.iter().enumerate() {
        if population.get(receiver).is_err() {
            continue;
        }
        for &donor in &handles[i + 1..] {
            let Ok(candidate) = population.get(donor) else {
                continue;
            };
            let target = population.get(receiver)?;
            if !eligible(target, candidate) || separation2(target, candidate) > radius2 {
                continue;
            }
            let absorbed = population.remove(donor, mesh)?;
            let target = population.get_mut(receiver)?;
            log::debug!("merging star {} into star {}", absorbed.id, target.id);
            merge(target, &absorbed);
            merges += 1;
        }
    }
    Ok(merges)
}

/// Merge unformed stars of the same kind closer than `radius`.
pub fn merge_pending(
    population: &mut StarPopulation,
    mesh: &mut dyn MeshAccess,
    radius: f64,
) -> Result<usize, StarError> {
    merge_within(population, mesh, radius, mergable)
}

/// Merge massive black holes closer than `radius`.
pub fn merge_compact_accretors(
    population: &mut StarPopulation,
    mesh: &mut dyn MeshAccess,
    radius: f64,
) -> Result<usize, StarError> {
    merge_within(population, mesh, radius, mergable_compact_accretor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlist_core::{MeshBlock, StarId};
    use starlist_test_utils::{embedded_star, MockBlock, MockMesh};

    fn at(id: u64, raw_type: i32, mass: f64, position: [f64; 3]) -> Star {
        embedded_star(id, 1, raw_type, mass, position)
    }

    #[test]
    fn same_pending_kind_is_mergable() {
        let a = at(1, -7, 1.0, [0.0; 3]);
        let b = at(2, -7, 1.0, [0.0; 3]);
        let c = at(3, -5, 1.0, [0.0; 3]);
        assert!(mergable(&a, &b));
        assert!(!mergable(&a, &c));
        assert!(!mergable(&b, &c));
    }

    #[test]
    fn formed_stars_are_not_mergable() {
        let a = at(1, 7, 1.0, [0.0; 3]);
        let b = at(2, 7, 1.0, [0.0; 3]);
        assert!(!mergable(&a, &b));
    }

    #[test]
    fn only_active_mbh_is_compact_accretor() {
        let a = at(1, 8, 1.0, [0.0; 3]);
        let b = at(2, 8, 1.0, [0.0; 3]);
        let c = at(3, -8, 1.0, [0.0; 3]);
        assert!(mergable_compact_accretor(&a, &b));
        assert!(!mergable_compact_accretor(&a, &c));
        assert!(!mergable_compact_accretor(&c, &c.clone()));
    }

    #[test]
    fn merge_weights_by_mass() {
        let mut a = at(1, -7, 3.0, [0.0, 0.0, 0.0]);
        a.metallicity = 0.0;
        a.velocity = [4.0, 0.0, 0.0];
        a.final_mass = 10.0;
        let mut b = at(2, -7, 1.0, [4.0, 8.0, 0.0]);
        b.metallicity = 0.04;
        b.delta_mass = 0.5;
        b.not_ejected_mass = 0.25;
        b.final_mass = 99.0;
        merge(&mut a, &b);
        assert_eq!(a.mass, 4.0);
        assert_eq!(a.position, [1.0, 2.0, 0.0]);
        assert_eq!(a.velocity, [3.0, 0.0, 0.0]);
        assert!((a.metallicity - 0.01).abs() < 1e-15);
        assert_eq!(a.delta_mass, 0.5);
        assert_eq!(a.not_ejected_mass, 0.25);
        assert_eq!(a.final_mass, 10.0);
    }

    #[test]
    fn separation_helpers() {
        let mut a = at(1, -7, 1.0, [0.0, 0.0, 0.0]);
        let b = at(2, -7, 1.0, [3.0, 4.0, 0.0]);
        a.velocity = [1.0, 1.0, 1.0];
        assert_eq!(separation2(&a, &b), 25.0);
        assert_eq!(separation(&a, &b), 5.0);
        assert_eq!(relative_velocity2(&a, &b), 3.0);
    }

    fn clustered_mesh() -> MockMesh {
        MockMesh::new().with_block(
            MockBlock::new(1)
                .with_mirrored_star(at(1, -7, 1.0, [0.5, 0.5, 0.5]))
                .with_mirrored_star(at(2, -7, 2.0, [0.51, 0.5, 0.5]))
                .with_mirrored_star(at(3, -5, 1.0, [0.5, 0.5, 0.5]))
                .with_mirrored_star(at(4, -7, 1.0, [0.9, 0.9, 0.9])),
        )
    }

    #[test]
    fn merge_pass_absorbs_close_same_kind() {
        let mut mesh = clustered_mesh();
        let mut pop = StarPopulation::find_all(&mesh);
        let n = merge_pending(&mut pop, &mut mesh, 0.05).unwrap();
        assert_eq!(n, 1);
        let ids: Vec<_> = pop.values().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(pop.get(pop.find(StarId(1)).unwrap()).unwrap().mass, 3.0);
        let block = mesh.block_ref(1).unwrap();
        assert!(block.star(StarId(2)).is_none());
        assert!(block.find_particle(StarId(2)).is_none());
        assert_eq!(block.particles.len(), 3);
    }

    #[test]
    fn merging_ghost_donor_leaves_local_mesh_alone() {
        let mut mesh = MockMesh::new()
            .with_block(MockBlock::new(1).with_mirrored_star(at(1, -7, 1.0, [0.5; 3])));
        let mut pop = StarPopulation::find_all(&mesh);
        let mut ghost = at(2, -7, 1.0, [0.5; 3]);
        ghost.current_grid = None;
        let _ = pop.push(ghost);
        assert_eq!(merge_pending(&mut pop, &mut mesh, 0.1).unwrap(), 1);
        assert_eq!(pop.len(), 1);
        let block = mesh.block_ref(1).unwrap();
        assert_eq!((block.stars.len(), block.particles.len()), (1, 1));
    }

    #[test]
    fn zero_radius_disables_pass() {
        let mut mesh = clustered_mesh();
        let mut pop = StarPopulation::find_all(&mesh);
        assert_eq!(merge_pending(&mut pop, &mut mesh, 0.0).unwrap(), 0);
        assert_eq!(pop.len(), 4);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = f64> {
            -100.0f64..100.0
        }

        proptest! {
            #[test]
            fn mass_sum_commutes(m1 in 1.0e-3f64..1.0e6, m2 in 1.0e-3f64..1.0e6) {
                let mut ab = at(1, -7, m1, [0.0; 3]);
                merge(&mut ab, &at(2, -7, m2, [1.0; 3]));
                let mut ba = at(2, -7, m2, [1.0; 3]);
                merge(&mut ba, &at(1, -7, m1, [0.0; 3]));
                prop_assert!((ab.mass - ba.mass).abs() <= 1e-12 * ab.mass);
            }

            #[test]
            fn merged_position_on_segment(
                m1 in 1.0e-3f64..1.0e6,
                m2 in 1.0e-3f64..1.0e6,
                p1 in prop::array::uniform3(coord()),
                p2 in prop::array::uniform3(coord()),
            ) {
                let mut a = at(1, -7, m1, p1);
                let b = at(2, -7, m2, p2);
                merge(&mut a, &b);
                let w = m1 / (m1 + m2);
                prop_assert_eq!(a.mass, m1 + m2);
                for dim in 0..3 {
                    let expected = w * p1[dim] + (1.0 - w) * p2[dim];
                    prop_assert!((a.position[dim] - expected).abs() <= 1e-9);
                    let (lo, hi) = if p1[dim] <= p2[dim] { (p1[dim], p2[dim]) } else { (p2[dim], p1[dim]) };
                    prop_assert!(a.position[dim] >= lo - 1e-9 && a.position[dim] <= hi + 1e-9);
                }
            }
        }
    }
}
