//! Two-way synchronization between star records and their grid mirrors.
//!
//! A star with `current_grid == Some(g)` is mirrored in block `g` twice:
//! once as a native particle and once as an embedded [`Star`] copy.
//! Construction and the pull operations read the native particle; the
//! push operations overwrite the embedded copy. A ghost star
//! (`current_grid == None`) is never touched by any of them.

use starlist_core::particle::{
    ATTR_BIRTH_MASS, ATTR_BIRTH_TIME, ATTR_DYNAMICAL_TIME, ATTR_METALLICITY,
};
use starlist_core::star::TablePositions;
use starlist_core::{
    FeedbackFlag, InvariantViolation, MeshAccess, MeshBlock, NativeParticle, PopIIICriterion,
    Star, StarKind, TypeCode, UnitSystem,
};

use crate::classify;
use crate::context::StarContext;
use crate::error::StarError;
use crate::index::StarLookupIndex;
use crate::schema::TracerSchema;

/// Classic star lifetimes are this many dynamical times.
pub const LIFETIME_IN_TDYN: f64 = 12.0;

/// Attribute slots of the cached table-position block, relative to
/// the configured start slot.
const TABLE_POSITION_SLOTS: usize = 7;

fn attribute(p: &NativeParticle, slot: usize) -> Result<f64, InvariantViolation> {
    p.attribute(slot).ok_or(InvariantViolation::AttributeMissing {
        star: p.number,
        slot,
    })
}

fn mass_conversion(block: &dyn MeshBlock, units: &dyn UnitSystem) -> Result<f64, StarError> {
    Ok(units.units(block.time())?.mass_to_solar(block.cell_width()))
}

fn read_ejecta(star: &mut Star, p: &NativeParticle) -> Result<(), InvariantViolation> {
    let n = p.attributes.len();
    star.wind_mass_ejected =
        p.wind_mass_ejected()
            .ok_or(InvariantViolation::AttributeMissing {
                star: p.number,
                slot: n.saturating_sub(2),
            })?;
    star.sn_mass_ejected = p
        .sn_mass_ejected()
        .ok_or(InvariantViolation::AttributeMissing {
            star: p.number,
            slot: n.saturating_sub(1),
        })?;
    Ok(())
}

/// Load the individual-star attribute block: birth mass, abundances,
/// classification, table positions, ejecta.
fn read_individual_block(
    star: &mut Star,
    p: &NativeParticle,
    ctx: &StarContext,
    criterion: &dyn PopIIICriterion,
) -> Result<(), InvariantViolation> {
    let config = ctx.config();
    star.birth_mass = attribute(p, ATTR_BIRTH_MASS)?;

    if !config.chemical_tags_only {
        for slot in 0..ctx.schema().len() {
            star.abundances[slot] = attribute(p, TracerSchema::attribute_slot(slot))?;
        }
    }

    classify::determine_popiii(star, ctx, criterion)?;
    classify::determine_snia_type(star, ctx)?;

    star.table_positions = if config.save_table_positions {
        let ts = config.table_start_slot;
        let mut raw = [0i32; TABLE_POSITION_SLOTS];
        for (i, v) in raw.iter_mut().enumerate() {
            *v = attribute(p, ts + i)? as i32;
        }
        TablePositions {
            stellar_evolution: [raw[0], raw[1]],
            radiation: [raw[2], raw[3], raw[4]],
            yields: [raw[5], raw[6]],
        }
    } else {
        TablePositions::UNSET
    };

    read_ejecta(star, p)
}

/// Build a star from a newly materialized native particle in `block`.
///
/// Masses are converted to solar units exactly once, here.
pub fn star_from_particle(
    block: &dyn MeshBlock,
    p: &NativeParticle,
    ctx: &StarContext,
    units: &dyn UnitSystem,
    criterion: &dyn PopIIICriterion,
) -> Result<Star, StarError> {
    let mut star = Star::new(p.number);
    star.position = p.position;
    star.velocity = p.velocity;
    star.current_grid = Some(block.grid_id());
    star.level = block.level();
    star.grid_id = block.grid_id();
    star.type_code = TypeCode::from_raw(p.type_code);
    star.mass = p.mass;
    star.final_mass = p.mass;
    star.birth_mass = p.mass;
    star.birth_time = attribute(p, ATTR_BIRTH_TIME)?;
    star.metallicity = attribute(p, ATTR_METALLICITY)?;
    star.feedback_flag = FeedbackFlag::NONE;

    let kind = star.type_code.kind();
    if kind.is_individual_star() {
        read_individual_block(&mut star, p, ctx, criterion)?;
    }

    let tdyn = attribute(p, ATTR_DYNAMICAL_TIME)?;
    star.lifetime = if star.type_code == TypeCode::Active(StarKind::Star) {
        LIFETIME_IN_TDYN * tdyn
    } else {
        tdyn
    };

    let factor = mass_conversion(block, units)?;
    star.mass *= factor;
    star.final_mass *= factor;
    Ok(star)
}

/// Embed every star particle in `block` that has no embedded copy yet.
///
/// Returns the number of stars created.
pub fn embed_new_particles(
    block: &mut dyn MeshBlock,
    ctx: &StarContext,
    units: &dyn UnitSystem,
    criterion: &dyn PopIIICriterion,
) -> Result<usize, StarError> {
    let mut created = Vec::new();
    for p in block.particles() {
        let kind = TypeCode::from_raw(p.type_code).kind();
        if !kind.is_star_particle() || block.embedded().iter().any(|s| s.id == p.number) {
            continue;
        }
        created.push(star_from_particle(&*block, p, ctx, units, criterion)?);
    }
    let n = created.len();
    for star in created {
        block.push_embedded(star);
    }
    if n > 0 {
        log::debug!("grid {}: embedded {n} new star(s)", block.grid_id());
    }
    Ok(n)
}

/// Refresh a star from a native particle in `block`.
///
/// Mass is reloaded only for classic stars; type and identifier are
/// kept.
pub fn copy_from_particle(
    star: &mut Star,
    block: &dyn MeshBlock,
    p: &NativeParticle,
    ctx: &StarContext,
    units: &dyn UnitSystem,
    criterion: &dyn PopIIICriterion,
) -> Result<(), StarError> {
    star.position = p.position;
    star.velocity = p.velocity;
    star.current_grid = Some(block.grid_id());
    star.level = block.level();
    star.grid_id = block.grid_id();
    star.birth_time = attribute(p, ATTR_BIRTH_TIME)?;
    star.lifetime = attribute(p, ATTR_DYNAMICAL_TIME)?;
    star.metallicity = attribute(p, ATTR_METALLICITY)?;

    if star.type_code == TypeCode::Active(StarKind::Star) {
        star.mass = p.mass * mass_conversion(block, units)?;
    }

    star.reset_stellar_properties();

    if star.type_code.kind().is_individual_star() {
        read_individual_block(star, p, ctx, criterion)?;
    }
    Ok(())
}

/// Locate the star's mirror block and native particle.
///
/// `Ok(None)` for ghosts. Missing block or particle is an invariant
/// violation.
fn locate<'m>(
    star: &Star,
    mesh: &'m dyn MeshAccess,
) -> Result<Option<(&'m dyn MeshBlock, &'m NativeParticle)>, InvariantViolation> {
    let Some(grid) = star.current_grid else {
        return Ok(None);
    };
    let block = mesh
        .block(grid)
        .ok_or(InvariantViolation::GridMissing {
            star: star.id,
            grid,
        })?;
    let p = block
        .find_particle(star.id)
        .ok_or(InvariantViolation::ParticleMissing {
            star: star.id,
            grid,
        })?;
    Ok(Some((block, p)))
}

/// Pull position and velocity from the mirror. Active stars only.
pub fn update_position_velocity(star: &mut Star, mesh: &dyn MeshAccess) -> Result<(), StarError> {
    if !star.type_code.is_active() {
        return Ok(());
    }
    if let Some((_, p)) = locate(star, mesh)? {
        star.position = p.position;
        star.velocity = p.velocity;
    }
    Ok(())
}

/// Pull lifetime and type for a pending white dwarf, then derive its
/// Type Ia channel from the mirror's tracer attributes.
pub fn update_white_dwarf_properties(
    star: &mut Star,
    mesh: &dyn MeshAccess,
    ctx: &StarContext,
) -> Result<(), StarError> {
    if star.type_code != TypeCode::Pending(StarKind::IndividualStarWd) {
        return Ok(());
    }
    let Some((_, p)) = locate(star, mesh)? else {
        return Ok(());
    };
    star.lifetime = attribute(p, ATTR_DYNAMICAL_TIME)?;
    star.type_code = TypeCode::from_raw(p.type_code);

    if classify::snia_candidate(star, ctx) {
        if let Some(slots) = ctx.schema().snia_slots() {
            let mut tracers = [0.0; crate::schema::SNIA_CHANNELS];
            for (v, slot) in tracers.iter_mut().zip(slots) {
                *v = attribute(p, TracerSchema::attribute_slot(slot))?;
            }
            if let Some(channel) = classify::first_negative_channel(&tracers) {
                star.snia_type = channel;
            }
        }
    }
    Ok(())
}

/// Pull mass, type, lifetime, and ejecta for an active individual star.
///
/// The mirror mass is in code units and is converted on the way in.
pub fn update_individual_star_properties(
    star: &mut Star,
    mesh: &dyn MeshAccess,
    units: &dyn UnitSystem,
) -> Result<(), StarError> {
    if !star.type_code.is_active() {
        return Ok(());
    }
    let Some((block, p)) = locate(star, mesh)? else {
        return Ok(());
    };
    star.mass = p.mass * mass_conversion(block, units)?;
    star.type_code = TypeCode::from_raw(p.type_code);
    star.lifetime = attribute(p, ATTR_DYNAMICAL_TIME)?;
    read_ejecta(star, p)?;
    Ok(())
}

/// Overwrite the embedded copy with this star, found through the index.
///
/// Returns `false` for ghosts.
pub fn copy_to_grid_map(
    star: &Star,
    index: &StarLookupIndex,
    mesh: &mut dyn MeshAccess,
) -> Result<bool, StarError> {
    let Some(grid) = star.current_grid else {
        return Ok(false);
    };
    let missing = InvariantViolation::MirrorCopyMissing {
        star: star.id,
        grid,
    };
    let entry = index.get(star.id).ok_or_else(|| missing.clone())?;
    if entry.grid != grid {
        return Err(missing.into());
    }
    let block = mesh
        .block_mut(grid)
        .ok_or(InvariantViolation::GridMissing {
            star: star.id,
            grid,
        })?;
    let copy = block
        .embedded_mut()
        .get_mut(entry.position)
        .filter(|c| c.id == star.id)
        .ok_or(missing)?;
    copy.assign_from(star);
    Ok(true)
}

/// Overwrite the embedded copy with this star, found by linear search.
///
/// Returns `false` for ghosts.
pub fn copy_to_grid(star: &Star, mesh: &mut dyn MeshAccess) -> Result<bool, StarError> {
    let Some(grid) = star.current_grid else {
        return Ok(false);
    };
    let block = mesh
        .block_mut(grid)
        .ok_or(InvariantViolation::GridMissing {
            star: star.id,
            grid,
        })?;
    let copy = block
        .embedded_mut()
        .iter_mut()
        .find(|c| c.id == star.id)
        .ok_or(InvariantViolation::MirrorCopyMissing {
            star: star.id,
            grid,
        })?;
    copy.assign_from(star);
    Ok(true)
}

/// Remove the star's embedded copy from its mirror.
///
/// Returns the removed copy, or `None` for ghosts and stars whose copy
/// is already gone.
pub fn delete_copy_in_grid(
    star: &Star,
    mesh: &mut dyn MeshAccess,
) -> Result<Option<Star>, StarError> {
    let Some(grid) = star.current_grid else {
        return Ok(None);
    };
    let block = mesh
        .block_mut(grid)
        .ok_or(InvariantViolation::GridMissing {
            star: star.id,
            grid,
        })?;
    Ok(block.remove_embedded(star.id))
}

/// Remove both views of an absorbed star from its mirror block.
///
/// Without the native particle gone, the next pass would rebuild the
/// star from it. Returns `false` for ghosts.
pub fn retire_in_grid(star: &Star, mesh: &mut dyn MeshAccess) -> Result<bool, StarError> {
    let Some(grid) = star.current_grid else {
        return Ok(false);
    };
    let block = mesh
        .block_mut(grid)
        .ok_or(InvariantViolation::GridMissing {
            star: star.id,
            grid,
        })?;
    block.remove_embedded(star.id);
    if block.remove_particle(star.id).is_none() {
        log::warn!("grid {grid}: absorbed star {} had no native particle", star.id);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SniaModel, StarConfig};
    use starlist_core::star::UNSET_STELLAR_PROPERTY;
    use starlist_core::units::SOLAR_MASS_G;
    use starlist_core::{GridId, StarId, Units};
    use starlist_test_utils::{
        embedded_star, particle_with_attributes, star_particle, FixedUnits, MockBlock, MockMesh,
        ThresholdCriterion,
    };

    fn solar_units() -> FixedUnits {
        FixedUnits(Units {
            density: SOLAR_MASS_G,
            ..Units::IDENTITY
        })
    }

    fn ctx() -> StarContext {
        StarContext::new(StarConfig::default()).unwrap()
    }

    #[test]
    fn classic_star_lifetime_is_twelve_dynamical_times() {
        let block = MockBlock::new(4).with_level(2);
        let p = star_particle(9, 2, 3.0);
        let star =
            star_from_particle(&block, &p, &ctx(), &solar_units(), &ThresholdCriterion::default())
                .unwrap();
        assert_eq!(star.lifetime, 12.0);
        assert_eq!(star.type_code, TypeCode::Active(StarKind::Star));
        assert_eq!(star.current_grid, Some(GridId(4)));
        assert_eq!(star.level, 2);
        assert_eq!(star.radius, UNSET_STELLAR_PROPERTY);
        assert_eq!(star.birth_mass, 3.0);
    }

    #[test]
    fn construction_converts_mass_and_final_mass_once() {
        let mut block = MockBlock::new(1);
        block.cell_width = 2.0;
        let p = star_particle(1, -7, 1.5);
        let star =
            star_from_particle(&block, &p, &ctx(), &solar_units(), &ThresholdCriterion::default())
                .unwrap();
        assert_eq!(star.mass, 12.0);
        assert_eq!(star.final_mass, 12.0);
        assert_eq!(star.birth_mass, 1.5);
        assert_eq!(star.lifetime, 1.0);
    }

    #[test]
    fn short_attribute_bank_is_invariant_violation() {
        let block = MockBlock::new(1);
        let p = particle_with_attributes(1, 7, 1.0, &[0.0]);
        let err =
            star_from_particle(&block, &p, &ctx(), &solar_units(), &ThresholdCriterion::default())
                .unwrap_err();
        assert!(err.is_fatal());
    }

    fn individual_ctx() -> StarContext {
        StarContext::new(StarConfig {
            yield_atomic_numbers: vec![1, 2],
            snia_model: SniaModel::Channels,
            save_table_positions: true,
            table_start_slot: 10,
            ..StarConfig::default()
        })
        .unwrap()
    }

    fn individual_attributes() -> Vec<f64> {
        // 0..4 common, 4..10 abundances (H, He, 4 channels), 10..17 tables, ejecta
        let mut a = vec![0.5, 2.0e7, 0.014, 5.0];
        a.extend_from_slice(&[0.7, 0.28, 0.0, -1.0, 0.0, 0.0]);
        a.extend_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        a.extend_from_slice(&[0.25, 0.5]);
        a
    }

    #[test]
    fn individual_star_reads_full_block() {
        let block = MockBlock::new(1);
        let p = particle_with_attributes(5, -12, 1.0, &individual_attributes());
        let star = star_from_particle(
            &block,
            &p,
            &individual_ctx(),
            &solar_units(),
            &ThresholdCriterion::default(),
        )
        .unwrap();
        assert_eq!(star.birth_mass, 5.0);
        assert_eq!(&star.abundances[..3], &[0.7, 0.28, 0.0]);
        assert_eq!(star.snia_type, 1);
        assert_eq!(star.table_positions.stellar_evolution, [1, 2]);
        assert_eq!(star.table_positions.radiation, [3, 4, 5]);
        assert_eq!(star.table_positions.yields, [6, 7]);
        assert_eq!(star.wind_mass_ejected, 0.25);
        assert_eq!(star.sn_mass_ejected, 0.5);
    }

    #[test]
    fn table_positions_unset_without_save_mode() {
        let ctx = StarContext::new(StarConfig {
            yield_atomic_numbers: vec![1, 2],
            ..StarConfig::default()
        })
        .unwrap();
        let block = MockBlock::new(1);
        let p = particle_with_attributes(5, 11, 1.0, &individual_attributes());
        let star =
            star_from_particle(&block, &p, &ctx, &solar_units(), &ThresholdCriterion::default())
                .unwrap();
        assert_eq!(star.table_positions, TablePositions::UNSET);
    }

    #[test]
    fn embed_skips_existing_copies_and_non_stars() {
        let mut block = MockBlock::new(1)
            .with_particle(star_particle(1, 7, 1.0))
            .with_particle(star_particle(2, 1, 1.0))
            .with_particle(star_particle(3, 5, 1.0))
            .with_star(embedded_star(3, 1, 5, 1.0, [0.5; 3]));
        let n = embed_new_particles(
            &mut block,
            &ctx(),
            &solar_units(),
            &ThresholdCriterion::default(),
        )
        .unwrap();
        assert_eq!(n, 1);
        assert!(block.star(StarId(1)).is_some());
        assert!(block.star(StarId(2)).is_none());
    }

    fn mesh_with_star(raw_type: i32) -> MockMesh {
        MockMesh::new().with_block(
            MockBlock::new(1)
                .with_particle(particle_with_attributes(
                    5,
                    raw_type,
                    2.0,
                    &individual_attributes(),
                ))
                .with_star(embedded_star(5, 1, raw_type, 2.0, [0.5; 3])),
        )
    }

    #[test]
    fn position_velocity_pull() {
        let mut mesh = mesh_with_star(7);
        let p = mesh.block_ref_mut(1).unwrap().particle_mut(StarId(5)).unwrap();
        p.position = [0.1, 0.2, 0.3];
        p.velocity = [4.0, 5.0, 6.0];
        let mut star = embedded_star(5, 1, 7, 2.0, [0.5; 3]);
        update_position_velocity(&mut star, &mesh).unwrap();
        assert_eq!(star.position, [0.1, 0.2, 0.3]);
        assert_eq!(star.velocity, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn pull_skips_pending_and_ghosts() {
        let mesh = mesh_with_star(-7);
        let mut pending = embedded_star(5, 1, -7, 2.0, [0.9; 3]);
        update_position_velocity(&mut pending, &mesh).unwrap();
        assert_eq!(pending.position, [0.9; 3]);

        let mut ghost = embedded_star(77, 1, 7, 2.0, [0.9; 3]);
        ghost.current_grid = None;
        update_position_velocity(&mut ghost, &mesh).unwrap();
    }

    #[test]
    fn pull_missing_particle_is_fatal() {
        let mesh = mesh_with_star(7);
        let mut stray = embedded_star(99, 1, 7, 2.0, [0.5; 3]);
        let err = update_position_velocity(&mut stray, &mesh).unwrap_err();
        assert!(matches!(
            err,
            StarError::Invariant(InvariantViolation::ParticleMissing { .. })
        ));
    }

    #[test]
    fn white_dwarf_pull_reads_mirror_tracers() {
        let mesh = mesh_with_star(12);
        let mut star = embedded_star(5, 1, -12, 2.0, [0.5; 3]);
        star.birth_mass = 5.0;
        update_white_dwarf_properties(&mut star, &mesh, &individual_ctx()).unwrap();
        assert_eq!(star.type_code, TypeCode::Active(StarKind::IndividualStarWd));
        assert_eq!(star.lifetime, 2.0e7);
        assert_eq!(star.snia_type, 1);
    }

    #[test]
    fn individual_pull_converts_mass() {
        let mesh = mesh_with_star(11);
        let mut star = embedded_star(5, 1, 11, 0.0, [0.5; 3]);
        update_individual_star_properties(&mut star, &mesh, &solar_units()).unwrap();
        assert_eq!(star.mass, 2.0);
        assert_eq!(star.lifetime, 2.0e7);
        assert_eq!(star.wind_mass_ejected, 0.25);
        assert_eq!(star.sn_mass_ejected, 0.5);
    }

    #[test]
    fn copy_to_grid_overwrites_full_record() {
        let mut mesh = mesh_with_star(7);
        let mut star = embedded_star(5, 1, 7, 9.0, [0.25; 3]);
        star.accretion.push(1.0, 2.0);
        assert!(copy_to_grid(&star, &mut mesh).unwrap());
        assert_eq!(mesh.block_ref(1).unwrap().star(StarId(5)), Some(&star));
    }

    #[test]
    fn copy_to_grid_missing_copy_is_fatal() {
        let mut mesh = mesh_with_star(7);
        let stray = embedded_star(6, 1, 7, 1.0, [0.5; 3]);
        assert!(copy_to_grid(&stray, &mut mesh).unwrap_err().is_fatal());
    }

    #[test]
    fn delete_copy_removes_embedded_only() {
        let mut mesh = mesh_with_star(7);
        let star = embedded_star(5, 1, 7, 2.0, [0.5; 3]);
        assert!(delete_copy_in_grid(&star, &mut mesh).unwrap().is_some());
        let block = mesh.block_ref(1).unwrap();
        assert!(block.stars.is_empty());
        assert_eq!(block.particles.len(), 1);
    }

    #[test]
    fn retire_removes_particle_and_copy() {
        let mut mesh = mesh_with_star(-7);
        let star = embedded_star(5, 1, -7, 2.0, [0.5; 3]);
        assert!(retire_in_grid(&star, &mut mesh).unwrap());
        let block = mesh.block_ref(1).unwrap();
        assert!(block.stars.is_empty());
        assert!(block.particles.is_empty());

        let mut ghost = star;
        ghost.current_grid = None;
        assert!(!retire_in_grid(&ghost, &mut mesh).unwrap());
    }

    #[test]
    fn retired_star_is_not_embedded_again() {
        let mut mesh = mesh_with_star(-7);
        let star = embedded_star(5, 1, -7, 2.0, [0.5; 3]);
        retire_in_grid(&star, &mut mesh).unwrap();
        let n = embed_new_particles(
            mesh.block_ref_mut(1).unwrap(),
            &individual_ctx(),
            &solar_units(),
            &ThresholdCriterion::default(),
        )
        .unwrap();
        assert_eq!(n, 0);
        assert_eq!(mesh.embedded_count(), 0);
    }

    #[test]
    fn copy_from_particle_keeps_mass_for_non_classic() {
        let mesh = mesh_with_star(7);
        let block = mesh.block_ref(1).unwrap();
        let p = &block.particles[0];
        let mut star = embedded_star(5, 1, 7, 42.0, [0.0; 3]);
        star.radius = 3.0;
        copy_from_particle(
            &mut star,
            block,
            p,
            &ctx(),
            &solar_units(),
            &ThresholdCriterion::default(),
        )
        .unwrap();
        assert_eq!(star.mass, 42.0);
        assert_eq!(star.lifetime, 2.0e7);
        assert_eq!(star.radius, UNSET_STELLAR_PROPERTY);
        assert_eq!(star.position, p.position);
    }
}
