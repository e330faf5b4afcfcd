//! Physical star kinds and the signed type code carried by the mesh.
//!
//! The mesh stores a single signed integer per particle: the sign says
//! whether the star has formed yet, the magnitude says what it is.
//! [`TypeCode`] decodes that integer once so that the rest of the
//! workspace matches on variants instead of doing sign arithmetic.

use std::fmt;

/// Physical subtype of a star particle (the magnitude of the raw code).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StarKind {
    /// Classic star-maker particle (raw 2).
    Star,
    /// Population III star (raw 5).
    PopIII,
    /// Stellar-mass black hole (raw 6).
    BlackHole,
    /// Population II star cluster (raw 7).
    PopII,
    /// Massive black hole, the compact accretor class (raw 8).
    Mbh,
    /// Colour-tagged star (raw 9).
    ColorStar,
    /// Simple radiation source (raw 10).
    SimpleSource,
    /// Resolved individual main-sequence star (raw 11).
    IndividualStar,
    /// Individual white dwarf (raw 12).
    IndividualStarWd,
    /// Individual stellar remnant (raw 13).
    IndividualStarRemnant,
    /// Individual Population III star (raw 14).
    IndividualStarPopIII,
    /// Individual star below the resolved mass limit (raw 15).
    IndividualStarUnresolved,
    /// Any magnitude this crate does not interpret.
    Other(u32),
}

impl StarKind {
    /// Decode a non-negative magnitude.
    pub fn from_code(code: u32) -> Self {
        match code {
            2 => Self::Star,
            5 => Self::PopIII,
            6 => Self::BlackHole,
            7 => Self::PopII,
            8 => Self::Mbh,
            9 => Self::ColorStar,
            10 => Self::SimpleSource,
            11 => Self::IndividualStar,
            12 => Self::IndividualStarWd,
            13 => Self::IndividualStarRemnant,
            14 => Self::IndividualStarPopIII,
            15 => Self::IndividualStarUnresolved,
            other => Self::Other(other),
        }
    }

    /// The magnitude stored by the mesh.
    pub fn code(self) -> u32 {
        match self {
            Self::Star => 2,
            Self::PopIII => 5,
            Self::BlackHole => 6,
            Self::PopII => 7,
            Self::Mbh => 8,
            Self::ColorStar => 9,
            Self::SimpleSource => 10,
            Self::IndividualStar => 11,
            Self::IndividualStarWd => 12,
            Self::IndividualStarRemnant => 13,
            Self::IndividualStarPopIII => 14,
            Self::IndividualStarUnresolved => 15,
            Self::Other(code) => code,
        }
    }

    /// Whether particles of this kind are tracked as stars at all.
    pub fn is_star_particle(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether this kind belongs to the individual-star family, whose
    /// attribute bank carries birth mass, abundances, and table positions.
    pub fn is_individual_star(self) -> bool {
        (11..=15).contains(&self.code())
    }
}

/// Decoded signed type code.
///
/// Negative raw codes are [`Pending`](TypeCode::Pending): the star has
/// been created but not yet formed, and is eligible for pre-formation
/// merging. Zero and positive codes are [`Active`](TypeCode::Active).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// Not yet formed (raw code < 0).
    Pending(StarKind),
    /// Formed and live (raw code >= 0).
    Active(StarKind),
}

impl TypeCode {
    /// Decode the raw signed integer stored by the mesh.
    pub fn from_raw(raw: i32) -> Self {
        let kind = StarKind::from_code(raw.unsigned_abs());
        if raw < 0 {
            Self::Pending(kind)
        } else {
            Self::Active(kind)
        }
    }

    /// Encode back to the raw signed integer.
    ///
    /// `Pending(Other(0))` has no negative representation and encodes as 0.
    pub fn raw(self) -> i32 {
        match self {
            Self::Pending(kind) => (kind.code() as i32).wrapping_neg(),
            Self::Active(kind) => kind.code() as i32,
        }
    }

    /// The physical subtype regardless of formation state.
    pub fn kind(self) -> StarKind {
        match self {
            Self::Pending(kind) | Self::Active(kind) => kind,
        }
    }

    /// True when the star has not formed yet.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// True when the star is formed.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active(_))
    }
}

impl Default for TypeCode {
    fn default() -> Self {
        Self::Active(StarKind::Other(0))
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Feedback state flag set by the feedback collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeedbackFlag(pub i32);

impl FeedbackFlag {
    /// No feedback scheduled this step.
    pub const NONE: Self = Self(0);
}
