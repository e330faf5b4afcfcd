//! Layout of the abundance block in a star's attribute bank.
//!
//! Which tracer slots exist, and where, depends on several independent
//! mode flags. [`TracerSchema`] resolves that once from a
//! [`StarConfig`] so lookups are plain index reads afterwards.
//!
//! ```text
//! abundance slot:  0 .. species | agb | popiii .. | wind .. | snia x4
//! attribute slot:  ATTR_ABUNDANCE_START + abundance slot
//! ```

use std::ops::Range;

use starlist_core::particle::ATTR_ABUNDANCE_START;
use starlist_core::{InvariantViolation, MAX_STAR_ABUNDANCES};

use crate::config::StarConfig;

/// Number of Type Ia channel tracers.
pub const SNIA_CHANNELS: usize = 4;

/// Tracer slots contributed by Population III formation, before
/// per-species yields.
const POPIII_BASE_SLOTS: usize = 2;

/// Tracer slots contributed by wind-density tracking.
const WIND_SLOTS: usize = 2;

/// Slot map from logical tracer names to abundance indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracerSchema {
    species: Vec<u8>,
    agb: Option<usize>,
    popiii: Option<Range<usize>>,
    wind: Option<Range<usize>>,
    snia: Range<usize>,
    snia_tracked: bool,
    len: usize,
}

impl TracerSchema {
    /// Resolve the layout for the given modes.
    ///
    /// Fails if the layout needs more slots than a star carries.
    pub fn from_config(config: &StarConfig) -> Result<Self, InvariantViolation> {
        let species = config.yield_atomic_numbers.clone();
        let mut cursor = species.len();

        let agb = config.track_agb_metal_density.then(|| {
            cursor += 1;
            cursor - 1
        });

        let popiii = config.popiii_formation.then(|| {
            let mut width = POPIII_BASE_SLOTS;
            if config.popiii_separate_yields {
                width += species.len().saturating_sub(POPIII_BASE_SLOTS);
            }
            let range = cursor..cursor + width;
            cursor += width;
            range
        });

        let wind = config.track_wind_density.then(|| {
            let range = cursor..cursor + WIND_SLOTS;
            cursor += WIND_SLOTS;
            range
        });

        let snia = cursor..cursor + SNIA_CHANNELS;
        let snia_tracked = config.snia_model.tracks_channels();
        if snia_tracked {
            cursor += SNIA_CHANNELS;
        }

        if cursor > MAX_STAR_ABUNDANCES {
            return Err(InvariantViolation::TooManyAbundances {
                required: cursor,
                available: MAX_STAR_ABUNDANCES,
            });
        }

        Ok(Self {
            species,
            agb,
            popiii,
            wind,
            snia,
            snia_tracked,
            len: cursor,
        })
    }

    /// Number of live abundance slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no abundance slots are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Abundance slot of the species with the given atomic number.
    pub fn species_slot(&self, atomic_number: u8) -> Option<usize> {
        self.species.iter().position(|&z| z == atomic_number)
    }

    /// Number of tracked yield species.
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Abundance slot of the AGB metal tracer.
    pub fn agb_slot(&self) -> Option<usize> {
        self.agb
    }

    /// Abundance slots of the Population III tracers.
    pub fn popiii_slots(&self) -> Option<Range<usize>> {
        self.popiii.clone()
    }

    /// Abundance slots of the wind tracers.
    pub fn wind_slots(&self) -> Option<Range<usize>> {
        self.wind.clone()
    }

    /// Abundance slots of the four Type Ia channel tracers, when the
    /// channel model is active.
    pub fn snia_slots(&self) -> Option<Range<usize>> {
        self.snia_tracked.then(|| self.snia.clone())
    }

    /// Attribute-bank slot holding the given abundance slot.
    pub fn attribute_slot(abundance_slot: usize) -> usize {
        ATTR_ABUNDANCE_START + abundance_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SniaModel;

    fn species(n: u8) -> Vec<u8> {
        (1..=n).collect()
    }

    #[test]
    fn bare_layout_is_species_only() {
        let cfg = StarConfig {
            yield_atomic_numbers: vec![1, 2, 6, 8, 26],
            ..StarConfig::default()
        };
        let schema = TracerSchema::from_config(&cfg).unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.species_slot(26), Some(4));
        assert_eq!(schema.species_slot(12), None);
        assert_eq!(schema.snia_slots(), None);
    }

    #[test]
    fn snia_start_accumulates_every_mode() {
        let cfg = StarConfig {
            yield_atomic_numbers: species(6),
            track_agb_metal_density: true,
            popiii_formation: true,
            popiii_separate_yields: true,
            track_wind_density: true,
            snia_model: SniaModel::Channels,
            ..StarConfig::default()
        };
        let schema = TracerSchema::from_config(&cfg).unwrap();
        // 6 species + 1 agb + (2 + 4) popiii + 2 wind
        assert_eq!(schema.agb_slot(), Some(6));
        assert_eq!(schema.popiii_slots(), Some(7..13));
        assert_eq!(schema.wind_slots(), Some(13..15));
        assert_eq!(schema.snia_slots(), Some(15..19));
        assert_eq!(schema.len(), 19);
    }

    #[test]
    fn popiii_without_separate_yields_is_two_slots() {
        let cfg = StarConfig {
            yield_atomic_numbers: species(6),
            popiii_formation: true,
            snia_model: SniaModel::Channels,
            ..StarConfig::default()
        };
        let schema = TracerSchema::from_config(&cfg).unwrap();
        assert_eq!(schema.popiii_slots(), Some(6..8));
        assert_eq!(schema.snia_slots(), Some(8..12));
    }

    #[test]
    fn oversized_layout_rejected() {
        let cfg = StarConfig {
            yield_atomic_numbers: species(30),
            snia_model: SniaModel::Channels,
            ..StarConfig::default()
        };
        assert_eq!(
            TracerSchema::from_config(&cfg),
            Err(InvariantViolation::TooManyAbundances {
                required: 34,
                available: MAX_STAR_ABUNDANCES,
            })
        );
    }

    #[test]
    fn attribute_slot_offsets_past_common_block() {
        assert_eq!(TracerSchema::attribute_slot(0), ATTR_ABUNDANCE_START);
        assert_eq!(TracerSchema::attribute_slot(15), ATTR_ABUNDANCE_START + 15);
    }
}
