//! Population III flag and Type Ia channel derivation.
//!
//! Both derivations read live abundances, so both refuse to run when
//! composition is only written as tagged output.

use starlist_core::{InvariantViolation, PopIIICriterion, Star, StarKind};

use crate::context::StarContext;

const HYDROGEN: u8 = 1;
const CARBON: u8 = 6;
const IRON: u8 = 26;

fn require_live_abundances(
    ctx: &StarContext,
    operation: &'static str,
) -> Result<(), InvariantViolation> {
    if ctx.config().chemical_tags_only {
        return Err(InvariantViolation::ChemicalTagsOnly { operation });
    }
    Ok(())
}

/// Derive the Population III flag.
///
/// Returns `None` when the star's kind says nothing about its
/// population; the caller keeps the current flag in that case.
pub fn popiii_flag(
    star: &Star,
    ctx: &StarContext,
    criterion: &dyn PopIIICriterion,
) -> Result<Option<bool>, InvariantViolation> {
    require_live_abundances(ctx, "popiii_flag")?;
    let config = ctx.config();

    match star.type_code.kind() {
        StarKind::IndividualStarPopIII => Ok(Some(true)),
        StarKind::IndividualStarRemnant if config.popiii_formation => {
            if config.popiii_metal_critical_fraction > 0.0 {
                return Ok(Some(
                    star.metallicity < config.popiii_metal_critical_fraction,
                ));
            }

            let schema = ctx.schema();
            let fraction = |z| {
                schema
                    .species_slot(z)
                    .map_or(-1.0, |slot| star.abundances[slot])
            };
            let (hydrogen, carbon, iron) = (fraction(HYDROGEN), fraction(CARBON), fraction(IRON));
            if hydrogen < 0.0 || carbon < 0.0 || iron < 0.0 {
                return Err(InvariantViolation::CompositionUnset {
                    star: star.id,
                    hydrogen,
                    carbon,
                    iron,
                });
            }
            let above = criterion.above_threshold(carbon, iron, hydrogen);
            log::debug!(
                "star {}: composition criterion C={carbon} Fe={iron} H={hydrogen} above={above}",
                star.id
            );
            Ok(Some(!above))
        }
        _ => Ok(None),
    }
}

/// Apply [`popiii_flag`] to the star.
pub fn determine_popiii(
    star: &mut Star,
    ctx: &StarContext,
    criterion: &dyn PopIIICriterion,
) -> Result<(), InvariantViolation> {
    if let Some(flag) = popiii_flag(star, ctx, criterion)? {
        star.popiii = flag;
    }
    Ok(())
}

/// Whether the star is a Type Ia progenitor under the channel model.
pub fn snia_candidate(star: &Star, ctx: &StarContext) -> bool {
    let config = ctx.config();
    config.snia_model.tracks_channels()
        && star.birth_mass > config.snia_min_mass
        && star.birth_mass < config.snia_max_mass
        && star.type_code.kind() == StarKind::IndividualStarWd
}

/// Index of the first negative tracer among the four channel tracers.
pub fn first_negative_channel(tracers: &[f64]) -> Option<u8> {
    tracers
        .iter()
        .take(crate::schema::SNIA_CHANNELS)
        .position(|&v| v < 0.0)
        .map(|i| i as u8)
}

/// Derive the Type Ia channel from the star's live abundances.
///
/// Returns `None` when the star is not a candidate or no channel tracer
/// is negative. A `None` never resets the star's existing channel.
pub fn snia_channel(star: &Star, ctx: &StarContext) -> Result<Option<u8>, InvariantViolation> {
    require_live_abundances(ctx, "snia_channel")?;
    if !snia_candidate(star, ctx) {
        return Ok(None);
    }
    Ok(ctx
        .schema()
        .snia_slots()
        .and_then(|slots| first_negative_channel(&star.abundances[slots])))
}

/// Apply [`snia_channel`] to the star.
pub fn determine_snia_type(star: &mut Star, ctx: &StarContext) -> Result<(), InvariantViolation> {
    if let Some(channel) = snia_channel(star, ctx)? {
        star.snia_type = channel;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SniaModel, StarConfig};
    use starlist_core::{StarId, TypeCode};

    struct Fixed(bool);

    impl PopIIICriterion for Fixed {
        fn above_threshold(&self, _c: f64, _fe: f64, _h: f64) -> bool {
            self.0
        }
    }

    fn ctx(config: StarConfig) -> StarContext {
        StarContext::new(config).unwrap()
    }

    fn star(code: TypeCode) -> Star {
        let mut s = Star::new(StarId(3));
        s.type_code = code;
        s
    }

    fn composition_config() -> StarConfig {
        StarConfig {
            yield_atomic_numbers: vec![1, 2, 6, 26],
            popiii_formation: true,
            ..StarConfig::default()
        }
    }

    #[test]
    fn popiii_kind_always_flagged() {
        let ctx = ctx(StarConfig::default());
        let s = star(TypeCode::Pending(StarKind::IndividualStarPopIII));
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(true)), Ok(Some(true)));
    }

    #[test]
    fn ordinary_kind_left_alone() {
        let ctx = ctx(composition_config());
        let mut s = star(TypeCode::Active(StarKind::IndividualStar));
        s.popiii = true;
        determine_popiii(&mut s, &ctx, &Fixed(true)).unwrap();
        assert!(s.popiii);
    }

    #[test]
    fn remnant_ignored_without_popiii_formation() {
        let ctx = ctx(StarConfig::default());
        let s = star(TypeCode::Active(StarKind::IndividualStarRemnant));
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(false)), Ok(None));
    }

    #[test]
    fn remnant_uses_metallicity_threshold() {
        let ctx = ctx(StarConfig {
            popiii_formation: true,
            popiii_metal_critical_fraction: 1.0e-4,
            ..StarConfig::default()
        });
        let mut s = star(TypeCode::Active(StarKind::IndividualStarRemnant));
        s.metallicity = 1.0e-5;
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(true)), Ok(Some(true)));
        s.metallicity = 1.0e-3;
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(false)), Ok(Some(false)));
    }

    #[test]
    fn remnant_uses_composition_criterion() {
        let ctx = ctx(composition_config());
        let mut s = star(TypeCode::Active(StarKind::IndividualStarRemnant));
        s.abundances[..4].copy_from_slice(&[0.7, 0.28, 1.0e-6, 1.0e-7]);
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(false)), Ok(Some(true)));
        assert_eq!(popiii_flag(&s, &ctx, &Fixed(true)), Ok(Some(false)));
    }

    #[test]
    fn unset_fraction_is_fatal() {
        let ctx = ctx(composition_config());
        let mut s = star(TypeCode::Active(StarKind::IndividualStarRemnant));
        s.abundances[..4].copy_from_slice(&[0.7, 0.28, 1.0e-6, -1.0]);
        assert!(matches!(
            popiii_flag(&s, &ctx, &Fixed(true)),
            Err(InvariantViolation::CompositionUnset { iron, .. }) if iron == -1.0
        ));
    }

    #[test]
    fn tags_only_mode_is_fatal() {
        let ctx = ctx(StarConfig {
            chemical_tags_only: true,
            ..StarConfig::default()
        });
        let mut s = star(TypeCode::Active(StarKind::IndividualStar));
        assert_eq!(
            determine_popiii(&mut s, &ctx, &Fixed(true)),
            Err(InvariantViolation::ChemicalTagsOnly {
                operation: "popiii_flag"
            })
        );
        assert!(determine_snia_type(&mut s, &ctx).is_err());
    }

    fn snia_ctx() -> StarContext {
        ctx(StarConfig {
            yield_atomic_numbers: vec![1, 2],
            snia_model: SniaModel::Channels,
            ..StarConfig::default()
        })
    }

    fn white_dwarf(birth_mass: f64) -> Star {
        let mut s = star(TypeCode::Pending(StarKind::IndividualStarWd));
        s.birth_mass = birth_mass;
        s
    }

    #[test]
    fn first_negative_tracer_selects_channel() {
        let ctx = snia_ctx();
        let mut s = white_dwarf(5.0);
        s.abundances[2..6].copy_from_slice(&[0.0, 1.0, -1.0, -1.0]);
        determine_snia_type(&mut s, &ctx).unwrap();
        assert_eq!(s.snia_type, 2);
    }

    #[test]
    fn no_negative_tracer_keeps_prior_channel() {
        let ctx = snia_ctx();
        let mut s = white_dwarf(5.0);
        s.snia_type = 3;
        determine_snia_type(&mut s, &ctx).unwrap();
        assert_eq!(s.snia_type, 3);
    }

    #[test]
    fn mass_window_is_exclusive() {
        let ctx = snia_ctx();
        let mut s = white_dwarf(3.0);
        s.abundances[2] = -1.0;
        assert_eq!(snia_channel(&s, &ctx), Ok(None));
        s.birth_mass = 8.0;
        assert_eq!(snia_channel(&s, &ctx), Ok(None));
        s.birth_mass = 7.9;
        assert_eq!(snia_channel(&s, &ctx), Ok(Some(0)));
    }

    #[test]
    fn non_white_dwarf_is_not_candidate() {
        let ctx = snia_ctx();
        let mut s = white_dwarf(5.0);
        s.type_code = TypeCode::Active(StarKind::IndividualStarRemnant);
        s.abundances[2] = -1.0;
        assert!(!snia_candidate(&s, &ctx));
    }

    #[test]
    fn channel_model_off_never_derives() {
        let ctx = ctx(StarConfig::default());
        let mut s = white_dwarf(5.0);
        s.abundances[0] = -1.0;
        assert_eq!(snia_channel(&s, &ctx), Ok(None));
    }

    #[test]
    fn first_negative_only_scans_four() {
        assert_eq!(first_negative_channel(&[0.0, 0.0, 0.0, 0.0, -1.0]), None);
        assert_eq!(first_negative_channel(&[-2.0, -1.0]), Some(0));
    }
}
