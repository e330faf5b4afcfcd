//! The fixed-shape transfer buffer and its conversions to and from [`Star`].

use starlist_core::kind::{FeedbackFlag, TypeCode};
use starlist_core::star::{AccretionEvent, AccretionHistory, TablePositions};
use starlist_core::{GridId, Star, StarId, MAX_ACCRETIONS, MAX_STAR_ABUNDANCES};

use crate::error::CodecError;

/// Flat, fixed-size image of one star.
///
/// Field order matches the wire layout in [`wire`](crate::wire). History
/// entries past `naccretions` are always zero.
#[derive(Clone, Debug, PartialEq)]
pub struct StarBuffer {
    /// Position.
    pub pos: [f64; 3],
    /// Velocity.
    pub vel: [f64; 3],
    /// Velocity change this step.
    pub delta_vel: [f32; 3],
    /// Accreted angular momentum.
    pub accreted_angmom: [f32; 3],
    /// Number of valid accretion history entries.
    pub naccretions: i32,
    /// Accretion rates, zero-padded.
    pub accretion_rate: [f32; MAX_ACCRETIONS],
    /// Accretion times, zero-padded.
    pub accretion_time: [f64; MAX_ACCRETIONS],
    /// Current mass (solar).
    pub mass: f64,
    /// Birth mass (solar).
    pub birth_mass: f64,
    /// Final target mass (solar).
    pub final_mass: f64,
    /// Mass change this step.
    pub delta_mass: f64,
    /// Birth time.
    pub birth_time: f64,
    /// Lifetime.
    pub lifetime: f64,
    /// Metallicity.
    pub metallicity: f64,
    /// Metallicity change this step.
    pub delta_z: f64,
    /// Most recent accretion rate.
    pub last_accretion_rate: f64,
    /// Mass not yet ejected.
    pub not_ejected_mass: f64,
    /// Stellar radius.
    pub radius: f64,
    /// Surface gravity.
    pub surface_gravity: f64,
    /// Effective temperature.
    pub teff: f64,
    /// Feedback flag.
    pub feedback_flag: i32,
    /// Star identifier.
    pub identifier: u64,
    /// Hierarchy level.
    pub level: u32,
    /// Owning mesh block identifier.
    pub grid_id: u32,
    /// Raw signed type code.
    pub type_code: i32,
    /// Supernova Ia channel.
    pub snia_type: i32,
    /// Population III flag (0 or 1).
    pub popiii: i32,
    /// Emissivity-added flag (0 or 1).
    pub added_emissivity: i32,
    /// Stellar-evolution table position.
    pub se_table_position: [i32; 2],
    /// Yield table position.
    pub yield_table_position: [i32; 2],
    /// Radiation table position.
    pub rad_table_position: [i32; 3],
    /// Abundance slots.
    pub abundances: [f64; MAX_STAR_ABUNDANCES],
    /// Wind ejecta mass.
    pub wind_mass_ejected: f64,
    /// Supernova ejecta mass.
    pub sn_mass_ejected: f64,
}

impl Default for StarBuffer {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            vel: [0.0; 3],
            delta_vel: [0.0; 3],
            accreted_angmom: [0.0; 3],
            naccretions: 0,
            accretion_rate: [0.0; MAX_ACCRETIONS],
            accretion_time: [0.0; MAX_ACCRETIONS],
            mass: 0.0,
            birth_mass: 0.0,
            final_mass: 0.0,
            delta_mass: 0.0,
            birth_time: 0.0,
            lifetime: 0.0,
            metallicity: 0.0,
            delta_z: 0.0,
            last_accretion_rate: 0.0,
            not_ejected_mass: 0.0,
            radius: 0.0,
            surface_gravity: 0.0,
            teff: 0.0,
            feedback_flag: 0,
            identifier: 0,
            level: 0,
            grid_id: 0,
            type_code: 0,
            snia_type: 0,
            popiii: 0,
            added_emissivity: 0,
            se_table_position: [0; 2],
            yield_table_position: [0; 2],
            rad_table_position: [0; 3],
            abundances: [0.0; MAX_STAR_ABUNDANCES],
            wind_mass_ejected: 0.0,
            sn_mass_ejected: 0.0,
        }
    }
}

impl StarBuffer {
    /// Number of valid history entries, clamped to the buffer capacity.
    pub fn history_len(&self) -> usize {
        (self.naccretions.max(0) as usize).min(MAX_ACCRETIONS)
    }
}

/// Encode one star.
pub fn to_buffer(star: &Star) -> StarBuffer {
    let mut buf = StarBuffer {
        pos: star.position,
        vel: star.velocity,
        delta_vel: star.delta_velocity,
        accreted_angmom: star.accreted_angular_momentum,
        mass: star.mass,
        birth_mass: star.birth_mass,
        final_mass: star.final_mass,
        delta_mass: star.delta_mass,
        birth_time: star.birth_time,
        lifetime: star.lifetime,
        metallicity: star.metallicity,
        delta_z: star.delta_metallicity,
        last_accretion_rate: star.last_accretion_rate,
        not_ejected_mass: star.not_ejected_mass,
        radius: star.radius,
        surface_gravity: star.surface_gravity,
        teff: star.effective_temperature,
        feedback_flag: star.feedback_flag.0,
        identifier: star.id.0,
        level: star.level,
        grid_id: star.grid_id.0,
        type_code: star.type_code.raw(),
        snia_type: i32::from(star.snia_type),
        popiii: i32::from(star.popiii),
        added_emissivity: i32::from(star.added_emissivity),
        se_table_position: star.table_positions.stellar_evolution,
        yield_table_position: star.table_positions.yields,
        rad_table_position: star.table_positions.radiation,
        abundances: star.abundances,
        wind_mass_ejected: star.wind_mass_ejected,
        sn_mass_ejected: star.sn_mass_ejected,
        ..StarBuffer::default()
    };

    let events = star.accretion.events();
    let n = events.len().min(MAX_ACCRETIONS);
    buf.naccretions = n as i32;
    for (i, event) in events[..n].iter().enumerate() {
        buf.accretion_time[i] = event.time;
        buf.accretion_rate[i] = event.rate;
    }
    buf
}

/// Encode stars, in iteration order, into a caller-allocated array.
///
/// Returns the number of slots written.
pub fn encode_into<'a>(
    stars: impl IntoIterator<Item = &'a Star>,
    out: &mut [StarBuffer],
) -> Result<usize, CodecError> {
    let mut written = 0;
    for star in stars {
        let slot = out.get_mut(written).ok_or(CodecError::BufferTooSmall {
            needed: written + 1,
            available: written,
        })?;
        *slot = to_buffer(star);
        written += 1;
    }
    Ok(written)
}

/// Encode stars, in iteration order, into a new array.
pub fn encode_all<'a>(stars: impl IntoIterator<Item = &'a Star>) -> Vec<StarBuffer> {
    stars.into_iter().map(to_buffer).collect()
}

/// Decode one buffer into a ghost star.
pub fn from_buffer(buf: &StarBuffer) -> Star {
    let n = buf.history_len();
    let accretion = if n == 0 {
        AccretionHistory::new()
    } else {
        AccretionHistory::from_events(
            buf.accretion_time[..n]
                .iter()
                .zip(&buf.accretion_rate[..n])
                .map(|(&time, &rate)| AccretionEvent { time, rate }),
        )
    };

    Star {
        position: buf.pos,
        velocity: buf.vel,
        delta_velocity: buf.delta_vel,
        accreted_angular_momentum: buf.accreted_angmom,
        mass: buf.mass,
        birth_mass: buf.birth_mass,
        final_mass: buf.final_mass,
        delta_mass: buf.delta_mass,
        last_accretion_rate: buf.last_accretion_rate,
        not_ejected_mass: buf.not_ejected_mass,
        birth_time: buf.birth_time,
        lifetime: buf.lifetime,
        metallicity: buf.metallicity,
        delta_metallicity: buf.delta_z,
        radius: buf.radius,
        surface_gravity: buf.surface_gravity,
        effective_temperature: buf.teff,
        accretion,
        id: StarId(buf.identifier),
        level: buf.level,
        grid_id: GridId(buf.grid_id),
        type_code: TypeCode::from_raw(buf.type_code),
        feedback_flag: FeedbackFlag(buf.feedback_flag),
        snia_type: buf.snia_type.clamp(0, i32::from(u8::MAX)) as u8,
        popiii: buf.popiii != 0,
        added_emissivity: buf.added_emissivity != 0,
        table_positions: TablePositions {
            stellar_evolution: buf.se_table_position,
            radiation: buf.rad_table_position,
            yields: buf.yield_table_position,
        },
        abundances: buf.abundances,
        wind_mass_ejected: buf.wind_mass_ejected,
        sn_mass_ejected: buf.sn_mass_ejected,
        current_grid: None,
    }
}

/// Decode the `n`-th buffer of an array.
///
/// Produces exactly the same record as [`from_buffer`] on that element.
pub fn from_buffer_at(buffers: &[StarBuffer], n: usize) -> Result<Star, CodecError> {
    buffers
        .get(n)
        .map(from_buffer)
        .ok_or(CodecError::IndexOutOfRange {
            index: n,
            len: buffers.len(),
        })
}
