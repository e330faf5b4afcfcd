//! The authoritative in-memory record of one star particle.
//!
//! A [`Star`] carries no list links. List membership lives in the arena
//! that owns it, and the mirror it is embedded in is named by a plain
//! [`GridId`] back-reference. Cloning a star therefore never aliases
//! anything: the accretion history is re-allocated on every copy.

use std::fmt;

use crate::id::{GridId, StarId};
use crate::kind::{FeedbackFlag, TypeCode};

/// Maximum number of accretion events carried per star.
pub const MAX_ACCRETIONS: usize = 100;

/// Maximum number of live abundance slots carried per star.
pub const MAX_STAR_ABUNDANCES: usize = 32;

/// Sentinel for radius, surface gravity, and effective temperature
/// before the star has been classified.
pub const UNSET_STELLAR_PROPERTY: f64 = -1.0;

/// Sentinel for table positions that have not been assigned.
pub const UNSET_TABLE_POSITION: i32 = -1;

/// One accretion event: simulation time and accretion rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccretionEvent {
    /// Simulation time of the event.
    pub time: f64,
    /// Accretion rate at that time.
    pub rate: f32,
}

/// Bounded accretion history.
///
/// Time and rate are stored as pairs so the two series cannot drift in
/// length. Pushing past [`MAX_ACCRETIONS`] is refused.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccretionHistory {
    events: Vec<AccretionEvent>,
}

impl AccretionHistory {
    /// An empty history with no allocation.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Build from events, truncating anything past [`MAX_ACCRETIONS`].
    pub fn from_events(events: impl IntoIterator<Item = AccretionEvent>) -> Self {
        Self {
            events: events.into_iter().take(MAX_ACCRETIONS).collect(),
        }
    }

    /// Append an event. Returns `false` if the history is full.
    pub fn push(&mut self, time: f64, rate: f32) -> bool {
        if self.events.len() >= MAX_ACCRETIONS {
            return false;
        }
        self.events.push(AccretionEvent { time, rate });
        true
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The recorded events in order.
    pub fn events(&self) -> &[AccretionEvent] {
        &self.events
    }

    /// Drop all events and release the allocation.
    pub fn clear(&mut self) {
        self.events = Vec::new();
    }
}

/// Cached lookup-table coordinates.
///
/// Only populated when the save-table-positions mode is on. Every entry
/// is [`UNSET_TABLE_POSITION`] otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TablePositions {
    /// Stellar-evolution table position.
    pub stellar_evolution: [i32; 2],
    /// Radiation table position.
    pub radiation: [i32; 3],
    /// Yield table position.
    pub yields: [i32; 2],
}

impl TablePositions {
    /// All positions unset.
    pub const UNSET: Self = Self {
        stellar_evolution: [UNSET_TABLE_POSITION; 2],
        radiation: [UNSET_TABLE_POSITION; 3],
        yields: [UNSET_TABLE_POSITION; 2],
    };

    /// Whether any position has been assigned.
    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }
}

impl Default for TablePositions {
    fn default() -> Self {
        Self::UNSET
    }
}

/// A star particle.
///
/// Masses are in solar masses once the record has been built from a
/// mirror or decoded from a transfer buffer. Positions and velocities
/// are in code units.
#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    /// Position.
    pub position: [f64; 3],
    /// Velocity.
    pub velocity: [f64; 3],
    /// Velocity change accumulated this step.
    pub delta_velocity: [f32; 3],
    /// Angular momentum of accreted gas.
    pub accreted_angular_momentum: [f32; 3],
    /// Current mass.
    pub mass: f64,
    /// Mass at birth.
    pub birth_mass: f64,
    /// Target mass at the end of formation.
    pub final_mass: f64,
    /// Mass change accumulated this step.
    pub delta_mass: f64,
    /// Most recent accretion rate.
    pub last_accretion_rate: f64,
    /// Mass not yet ejected by feedback.
    pub not_ejected_mass: f64,
    /// Birth time.
    pub birth_time: f64,
    /// Lifetime.
    pub lifetime: f64,
    /// Metallicity.
    pub metallicity: f64,
    /// Metallicity change accumulated this step.
    pub delta_metallicity: f64,
    /// Stellar radius; [`UNSET_STELLAR_PROPERTY`] before classification.
    pub radius: f64,
    /// Surface gravity; [`UNSET_STELLAR_PROPERTY`] before classification.
    pub surface_gravity: f64,
    /// Effective temperature; [`UNSET_STELLAR_PROPERTY`] before classification.
    pub effective_temperature: f64,
    /// Accretion history.
    pub accretion: AccretionHistory,
    /// Process-wide unique identifier.
    pub id: StarId,
    /// Hierarchy level of the owning mesh block.
    pub level: u32,
    /// Identifier of the owning mesh block, kept even for ghost copies.
    pub grid_id: GridId,
    /// Formation state and physical subtype.
    pub type_code: TypeCode,
    /// Feedback state.
    pub feedback_flag: FeedbackFlag,
    /// Supernova Ia channel (0..=3).
    pub snia_type: u8,
    /// Whether this star is, or descends from, a Population III star.
    pub popiii: bool,
    /// Whether the radiation collaborator already added this star's emissivity.
    pub added_emissivity: bool,
    /// Cached lookup-table coordinates.
    pub table_positions: TablePositions,
    /// Live abundance slots. Only read when composition is tracked as live state.
    pub abundances: [f64; MAX_STAR_ABUNDANCES],
    /// Mass ejected by stellar winds.
    pub wind_mass_ejected: f64,
    /// Mass ejected by supernovae.
    pub sn_mass_ejected: f64,
    /// Mesh block this star is embedded in on this process.
    ///
    /// `None` means the authoritative mirror lives on another process and
    /// this record is a ghost copy.
    pub current_grid: Option<GridId>,
}

impl Star {
    /// A zeroed record with the given identifier and no mirror.
    ///
    /// Stellar properties start at [`UNSET_STELLAR_PROPERTY`].
    pub fn new(id: StarId) -> Self {
        Self {
            position: [0.0; 3],
            velocity: [0.0; 3],
            delta_velocity: [0.0; 3],
            accreted_angular_momentum: [0.0; 3],
            mass: 0.0,
            birth_mass: 0.0,
            final_mass: 0.0,
            delta_mass: 0.0,
            last_accretion_rate: 0.0,
            not_ejected_mass: 0.0,
            birth_time: 0.0,
            lifetime: 0.0,
            metallicity: 0.0,
            delta_metallicity: 0.0,
            radius: UNSET_STELLAR_PROPERTY,
            surface_gravity: UNSET_STELLAR_PROPERTY,
            effective_temperature: UNSET_STELLAR_PROPERTY,
            accretion: AccretionHistory::new(),
            id,
            level: 0,
            grid_id: GridId(0),
            type_code: TypeCode::default(),
            feedback_flag: FeedbackFlag::NONE,
            snia_type: 0,
            popiii: false,
            added_emissivity: false,
            table_positions: TablePositions::UNSET,
            abundances: [0.0; MAX_STAR_ABUNDANCES],
            wind_mass_ejected: 0.0,
            sn_mass_ejected: 0.0,
            current_grid: None,
        }
    }

    /// Whether this record is a ghost (its mirror is on another process).
    pub fn is_ghost(&self) -> bool {
        self.current_grid.is_none()
    }

    /// Reset radius, surface gravity, and effective temperature to the
    /// unclassified sentinel.
    pub fn reset_stellar_properties(&mut self) {
        self.radius = UNSET_STELLAR_PROPERTY;
        self.surface_gravity = UNSET_STELLAR_PROPERTY;
        self.effective_temperature = UNSET_STELLAR_PROPERTY;
    }

    /// Overwrite every field with `other`'s, including the mirror reference.
    ///
    /// The accretion history is re-allocated, never shared.
    pub fn assign_from(&mut self, other: &Star) {
        self.clone_from(other);
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.position;
        let [vx, vy, vz] = self.velocity;
        writeln!(f, "Star {}: pos = {x} {y} {z}, vel = {vx} {vy} {vz}", self.id)?;
        let [dx, dy, dz] = self.delta_velocity;
        writeln!(f, "\t delta_vel = {dx} {dy} {dz}")?;
        write!(f, "\t naccr = {}", self.accretion.len())?;
        match self.accretion.events().first() {
            Some(first) => writeln!(
                f,
                ", accr_rate[0] = {}, accr_time[0] = {}",
                first.rate, first.time
            )?,
            None => writeln!(f)?,
        }
        writeln!(
            f,
            "\t birthtime = {}, lifetime = {}",
            self.birth_time, self.lifetime
        )?;
        writeln!(
            f,
            "\t Z = {}, deltaZ = {}",
            self.metallicity, self.delta_metallicity
        )?;
        writeln!(
            f,
            "\t mass = {}, dmass = {}, fmass = {}, bmass = {} type = {}, grid {}, lvl {}",
            self.mass,
            self.delta_mass,
            self.final_mass,
            self.birth_mass,
            self.type_code,
            self.grid_id,
            self.level
        )?;
        writeln!(f, "\t FeedbackFlag = {}", self.feedback_flag.0)?;
        writeln!(f, "\t SNIaType = {}", self.snia_type)?;
        writeln!(f, "\t PopIIIStar = {}", self.popiii)?;
        let [ax, ay, az] = self.accreted_angular_momentum;
        write!(f, "\t accreted_angmom = {ax} {ay} {az}")?;
        match self.current_grid {
            Some(grid) => write!(f, "\n\t mirror = grid {grid}"),
            None => write!(f, "\n\t mirror = remote"),
        }
    }
}
