//! Bit-exact byte form of [`StarBuffer`].
//!
//! All values are little-endian with no padding. A record is always
//! [`STAR_BUFFER_BYTES`] long; a batch is a `u32` record count followed
//! by that many records. Field order is the declaration order of
//! [`StarBuffer`] and must not change without breaking remote peers.

use std::io::{Read, Write};

use starlist_core::{MAX_ACCRETIONS, MAX_STAR_ABUNDANCES};

use crate::buffer::StarBuffer;
use crate::error::CodecError;

/// Size in bytes of one encoded record.
pub const STAR_BUFFER_BYTES: usize = 2 * 3 * 8 // pos, vel
    + 2 * 3 * 4 // delta_vel, accreted_angmom
    + 4 // naccretions
    + MAX_ACCRETIONS * (4 + 8) // rate, time
    + 13 * 8 // mass block
    + 4 + 8 + 4 + 4 + 4 + 4 + 4 + 4 // flags and identifiers
    + (2 + 2 + 3) * 4 // table positions
    + MAX_STAR_ABUNDANCES * 8
    + 2 * 8; // ejecta

/// Upper bound on capacity reserved from an untrusted batch count.
const MAX_PREALLOCATED_RECORDS: usize = 1024;

// ── Primitive writers ───────────────────────────────────────────

fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f32s(w: &mut dyn Write, vs: &[f32]) -> Result<(), CodecError> {
    for v in vs {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn write_f64s(w: &mut dyn Write, vs: &[f64]) -> Result<(), CodecError> {
    for v in vs {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn write_i32s(w: &mut dyn Write, vs: &[i32]) -> Result<(), CodecError> {
    for &v in vs {
        write_i32_le(w, v)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_i32_le(r: &mut dyn Read) -> Result<i32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64_le(r: &mut dyn Read) -> Result<f64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_f32s(r: &mut dyn Read, out: &mut [f32]) -> Result<(), CodecError> {
    let mut buf = [0u8; 4];
    for v in out {
        r.read_exact(&mut buf)?;
        *v = f32::from_le_bytes(buf);
    }
    Ok(())
}

fn read_f64s(r: &mut dyn Read, out: &mut [f64]) -> Result<(), CodecError> {
    for v in out {
        *v = read_f64_le(r)?;
    }
    Ok(())
}

fn read_i32s(r: &mut dyn Read, out: &mut [i32]) -> Result<(), CodecError> {
    for v in out {
        *v = read_i32_le(r)?;
    }
    Ok(())
}

fn read_flag(r: &mut dyn Read, name: &str) -> Result<i32, CodecError> {
    let v = read_i32_le(r)?;
    if v != 0 && v != 1 {
        return Err(CodecError::MalformedBuffer {
            detail: format!("{name} must be 0 or 1, got {v}"),
        });
    }
    Ok(v)
}

// ── Record encode/decode ────────────────────────────────────────

/// Write one record.
pub fn write_buffer(w: &mut dyn Write, b: &StarBuffer) -> Result<(), CodecError> {
    write_f64s(w, &b.pos)?;
    write_f64s(w, &b.vel)?;
    write_f32s(w, &b.delta_vel)?;
    write_f32s(w, &b.accreted_angmom)?;
    write_i32_le(w, b.naccretions)?;
    write_f32s(w, &b.accretion_rate)?;
    write_f64s(w, &b.accretion_time)?;
    write_f64s(
        w,
        &[
            b.mass,
            b.birth_mass,
            b.final_mass,
            b.delta_mass,
            b.birth_time,
            b.lifetime,
            b.metallicity,
            b.delta_z,
            b.last_accretion_rate,
            b.not_ejected_mass,
            b.radius,
            b.surface_gravity,
            b.teff,
        ],
    )?;
    write_i32_le(w, b.feedback_flag)?;
    write_u64_le(w, b.identifier)?;
    write_u32_le(w, b.level)?;
    write_u32_le(w, b.grid_id)?;
    write_i32_le(w, b.type_code)?;
    write_i32_le(w, b.snia_type)?;
    write_i32_le(w, b.popiii)?;
    write_i32_le(w, b.added_emissivity)?;
    write_i32s(w, &b.se_table_position)?;
    write_i32s(w, &b.yield_table_position)?;
    write_i32s(w, &b.rad_table_position)?;
    write_f64s(w, &b.abundances)?;
    write_f64s(w, &[b.wind_mass_ejected, b.sn_mass_ejected])?;
    Ok(())
}

/// Read one record.
///
/// Rejects boolean fields outside `{0, 1}` and a supernova channel
/// outside `0..=255`. The accretion count is passed through unchanged;
/// [`from_buffer`](crate::from_buffer) clamps it.
pub fn read_buffer(r: &mut dyn Read) -> Result<StarBuffer, CodecError> {
    let mut b = StarBuffer::default();
    read_f64s(r, &mut b.pos)?;
    read_f64s(r, &mut b.vel)?;
    read_f32s(r, &mut b.delta_vel)?;
    read_f32s(r, &mut b.accreted_angmom)?;
    b.naccretions = read_i32_le(r)?;
    read_f32s(r, &mut b.accretion_rate)?;
    read_f64s(r, &mut b.accretion_time)?;

    let mut scalars = [0.0f64; 13];
    read_f64s(r, &mut scalars)?;
    let [mass, birth_mass, final_mass, delta_mass, birth_time, lifetime, metallicity, delta_z, last_accretion_rate, not_ejected_mass, radius, surface_gravity, teff] =
        scalars;
    b.mass = mass;
    b.birth_mass = birth_mass;
    b.final_mass = final_mass;
    b.delta_mass = delta_mass;
    b.birth_time = birth_time;
    b.lifetime = lifetime;
    b.metallicity = metallicity;
    b.delta_z = delta_z;
    b.last_accretion_rate = last_accretion_rate;
    b.not_ejected_mass = not_ejected_mass;
    b.radius = radius;
    b.surface_gravity = surface_gravity;
    b.teff = teff;

    b.feedback_flag = read_i32_le(r)?;
    b.identifier = read_u64_le(r)?;
    b.level = read_u32_le(r)?;
    b.grid_id = read_u32_le(r)?;
    b.type_code = read_i32_le(r)?;
    b.snia_type = read_i32_le(r)?;
    if !(0..=i32::from(u8::MAX)).contains(&b.snia_type) {
        return Err(CodecError::MalformedBuffer {
            detail: format!("snia_type out of range: {}", b.snia_type),
        });
    }
    b.popiii = read_flag(r, "popiii")?;
    b.added_emissivity = read_flag(r, "added_emissivity")?;
    read_i32s(r, &mut b.se_table_position)?;
    read_i32s(r, &mut b.yield_table_position)?;
    read_i32s(r, &mut b.rad_table_position)?;
    read_f64s(r, &mut b.abundances)?;
    b.wind_mass_ejected = read_f64_le(r)?;
    b.sn_mass_ejected = read_f64_le(r)?;
    Ok(b)
}

// ── Batch encode/decode ─────────────────────────────────────────

/// Write a `u32` count followed by every record.
pub fn encode_batch(w: &mut dyn Write, buffers: &[StarBuffer]) -> Result<(), CodecError> {
    let count = u32::try_from(buffers.len()).map_err(|_| CodecError::MalformedBuffer {
        detail: format!("batch of {} records exceeds u32 count", buffers.len()),
    })?;
    write_u32_le(w, count)?;
    for b in buffers {
        write_buffer(w, b)?;
    }
    Ok(())
}

/// Read a batch written by [`encode_batch`].
pub fn decode_batch(r: &mut dyn Read) -> Result<Vec<StarBuffer>, CodecError> {
    let count = read_u32_le(r)? as usize;
    let mut out = Vec::with_capacity(count.min(MAX_PREALLOCATED_RECORDS));
    for _ in 0..count {
        out.push(read_buffer(r)?);
    }
    Ok(out)
}
