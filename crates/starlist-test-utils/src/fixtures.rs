//! Particle and star fixtures.

use smallvec::SmallVec;
use starlist_core::particle::INLINE_ATTRIBUTES;
use starlist_core::{GridId, NativeParticle, Star, StarId, TypeCode};

/// A classic particle with the common attribute block:
/// birth time, dynamical time, metallicity.
pub fn star_particle(id: u64, raw_type: i32, mass: f64) -> NativeParticle {
    NativeParticle {
        number: StarId(id),
        type_code: raw_type,
        position: [0.5; 3],
        velocity: [0.0; 3],
        mass,
        attributes: SmallVec::from_slice(&[0.0, 1.0, 0.02]),
    }
}

/// A particle with an explicit attribute bank.
pub fn particle_with_attributes(
    id: u64,
    raw_type: i32,
    mass: f64,
    attributes: &[f64],
) -> NativeParticle {
    let mut bank: SmallVec<[f64; INLINE_ATTRIBUTES]> = SmallVec::new();
    bank.extend_from_slice(attributes);
    NativeParticle {
        number: StarId(id),
        type_code: raw_type,
        position: [0.5; 3],
        velocity: [0.0; 3],
        mass,
        attributes: bank,
    }
}

/// A star embedded in `grid` with the given type, mass, and position.
pub fn embedded_star(id: u64, grid: u32, raw_type: i32, mass: f64, position: [f64; 3]) -> Star {
    let mut star = Star::new(StarId(id));
    star.type_code = TypeCode::from_raw(raw_type);
    star.mass = mass;
    star.position = position;
    star.grid_id = GridId(grid);
    star.current_grid = Some(GridId(grid));
    star
}

/// The native particle mirroring `star`: same identifier, type, mass,
/// position and velocity, with birth time, lifetime and metallicity in
/// the common attribute slots.
pub fn particle_for(star: &Star) -> NativeParticle {
    NativeParticle {
        number: star.id,
        type_code: star.type_code.raw(),
        position: star.position,
        velocity: star.velocity,
        mass: star.mass,
        attributes: SmallVec::from_slice(&[star.birth_time, star.lifetime, star.metallicity]),
    }
}

/// A ghost star (mirror on another process).
pub fn ghost_star(id: u64, grid: u32, raw_type: i32, mass: f64) -> Star {
    let mut star = embedded_star(id, grid, raw_type, mass, [0.5; 3]);
    star.current_grid = None;
    star
}
