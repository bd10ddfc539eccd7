//! Failure probabilities and rolls.
//!
//! Chances interpolate linearly between a "perfect" and a "terrible"
//! endpoint on `1 - reliability`. Rolls draw one uniform sample from an
//! injected [`Rng`] so tests can seed them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::reliability::{ComponentKind, FailureKind, ReliabilityState};

/// How a chance is interpreted when rolled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollScaling {
    /// Chance is a probability per check.
    PerCheck,
    /// Chance is a rate per second; scaled by the elapsed seconds.
    PerSecond(f32),
}

/// `perfect + (terrible - perfect) * (1 - reliability)`.
pub fn chance_to_fail(reliability: f64, perfect: f64, terrible: f64) -> f64 {
    perfect + (terrible - perfect) * (1.0 - reliability)
}

/// Stress limit in g: `perfect + (terrible - perfect) * (1 - reliability)`.
///
/// The limit falls as the component wears, so a worn instrument trips at
/// lower loads than a pristine one.
pub fn max_gees(reliability: f64, perfect: f64, terrible: f64) -> f64 {
    perfect + (terrible - perfect) * (1.0 - reliability)
}

/// One uniform draw compared against `chance`.
pub fn roll_failure(rng: &mut impl Rng, chance: f64, scaling: RollScaling) -> bool {
    let threshold = match scaling {
        RollScaling::PerCheck => chance,
        RollScaling::PerSecond(dt) => chance * dt.max(0.0) as f64,
    };
    rng.gen::<f64>() < threshold
}

/// Uniform choice among the failure kinds currently available.
pub fn choose_kind(rng: &mut impl Rng, available: &[FailureKind]) -> Option<FailureKind> {
    match available.len() {
        0 => None,
        1 => Some(available[0]),
        n => Some(available[rng.gen_range(0..n)]),
    }
}

/// Roll for a failure of `state` and enter it on success.
///
/// Never rolls while the state is already failed, so repeated checks are
/// no-ops. Returns the kind entered, if any.
pub fn check_failure(
    rng: &mut impl Rng,
    state: &mut ReliabilityState,
    chance: f64,
    scaling: RollScaling,
    available: &[FailureKind],
    requirement: u32,
) -> Option<FailureKind> {
    if state.is_failed() || available.is_empty() {
        return None;
    }
    if !roll_failure(rng, chance, scaling) {
        return None;
    }
    let kind = choose_kind(rng, available)?;
    state.set_failure(kind, requirement);
    Some(kind)
}

/// Host-visible consequence of entering a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    EngineShutdown,
    /// Engine keeps running but overheats.
    Overheating,
    ActuatorLocked,
    LeakStarted,
    LightFlickering,
    LightOff,
    AlternatorDisabled,
    ReadoutFrozen,
    DecoupleBlocked,
}

/// Effect the host should apply for a failure of `component`.
pub fn effect_of(component: ComponentKind, failure: FailureKind) -> Option<Effect> {
    let effect = match (component, failure) {
        (ComponentKind::Ignitor, _) => Effect::EngineShutdown,
        (ComponentKind::Cooling, _) => Effect::Overheating,
        (ComponentKind::Gimbal, _) => Effect::ActuatorLocked,
        (ComponentKind::Tank, _) => Effect::LeakStarted,
        (ComponentKind::Light, FailureKind::Flickering) => Effect::LightFlickering,
        (ComponentKind::Light, _) => Effect::LightOff,
        (ComponentKind::Alternator, _) => Effect::AlternatorDisabled,
        (ComponentKind::Altimeter | ComponentKind::ThrustGauge, _) => Effect::ReadoutFrozen,
        (ComponentKind::Decoupler, _) => Effect::DecoupleBlocked,
        (ComponentKind::Monitor, _) => return None,
    };
    Some(effect)
}

/// Result of firing a decoupler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoupleOutcome {
    Decoupled,
    Misfired,
    Exploded,
}

/// Quality scaling used by decoupler chances: `clamp01(quality / 0.75)`.
pub fn decoupler_quality_factor(quality: f32) -> f64 {
    (quality as f64 / 0.75).clamp(0.0, 1.0)
}

/// Decide a staging outcome from one draw.
///
/// Chances are divided by the quality factor, so below-default quality
/// raises both; a factor of zero always explodes.
pub fn roll_decouple(
    rng: &mut impl Rng,
    quality: f32,
    explosion_chance: f64,
    misfire_chance: f64,
) -> DecoupleOutcome {
    let factor = decoupler_quality_factor(quality);
    if factor <= 0.0 {
        return DecoupleOutcome::Exploded;
    }
    let roll: f64 = rng.gen();
    if roll < explosion_chance / factor {
        DecoupleOutcome::Exploded
    } else if roll < misfire_chance / factor {
        DecoupleOutcome::Misfired
    } else {
        DecoupleOutcome::Decoupled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_chance_at_zero_reliability_is_terrible() {
        assert_eq!(chance_to_fail(0.0, 0.0001, 0.01), 0.01);
        assert_eq!(chance_to_fail(1.0, 0.0001, 0.01), 0.0001);
    }

    #[test]
    fn test_chance_monotone_in_reliability() {
        let mut last = f64::INFINITY;
        for step in 0..=100 {
            let r = step as f64 / 100.0;
            let c = chance_to_fail(r, 0.0001, 0.01);
            assert!(c <= last, "r={} c={} last={}", r, c, last);
            last = c;
        }
    }

    #[test]
    fn test_max_gees_interpolation() {
        assert_eq!(max_gees(1.0, 12.5, 7.5), 12.5);
        assert_eq!(max_gees(0.0, 12.5, 7.5), 7.5);
        assert_eq!(max_gees(0.5, 12.5, 7.5), 10.0);
    }

    #[test]
    fn test_max_gees_falls_with_wear() {
        let mut last = f64::MAX;
        for step in (0..=10).rev() {
            let limit = max_gees(step as f64 / 10.0, 15.0, 10.0);
            assert!(limit <= last);
            last = limit;
        }
    }

    #[test]
    fn test_roll_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(!roll_failure(&mut rng, 0.0, RollScaling::PerCheck));
            assert!(roll_failure(&mut rng, 1.0, RollScaling::PerCheck));
        }
    }

    #[test]
    fn test_per_second_scaling() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(!roll_failure(&mut rng, 1.0, RollScaling::PerSecond(0.0)));
        }
    }

    #[test]
    fn test_choose_kind_uniform_subset() {
        let mut rng = StdRng::seed_from_u64(3);
        let kinds = [FailureKind::Burnt, FailureKind::CoolingLoss, FailureKind::Stuck];
        let mut seen = [0u32; 3];
        for _ in 0..3000 {
            let k = choose_kind(&mut rng, &kinds).unwrap();
            seen[kinds.iter().position(|x| *x == k).unwrap()] += 1;
        }
        assert!(seen.iter().all(|&n| n > 800), "{:?}", seen);
        assert_eq!(choose_kind(&mut rng, &[]), None);
    }

    #[test]
    fn test_check_failure_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = ReliabilityState::default();
        let first = check_failure(
            &mut rng,
            &mut state,
            1.0,
            RollScaling::PerCheck,
            &[FailureKind::Stuck],
            50,
        );
        assert_eq!(first, Some(FailureKind::Stuck));
        state.tick_repair(10);
        let snapshot = state.clone();
        for _ in 0..10 {
            let again = check_failure(
                &mut rng,
                &mut state,
                1.0,
                RollScaling::PerCheck,
                &[FailureKind::Burnt],
                50,
            );
            assert_eq!(again, None);
        }
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_effects() {
        assert_eq!(
            effect_of(ComponentKind::Ignitor, FailureKind::Burnt),
            Some(Effect::EngineShutdown)
        );
        assert_eq!(
            effect_of(ComponentKind::Light, FailureKind::Busted),
            Some(Effect::LightOff)
        );
        assert_eq!(effect_of(ComponentKind::Monitor, FailureKind::Burnt), None);
    }

    #[test]
    fn test_decouple_outcomes() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            roll_decouple(&mut rng, 0.0, 0.125, 0.5),
            DecoupleOutcome::Exploded
        );
        assert_eq!(
            roll_decouple(&mut rng, 1.0, 0.0, 0.0),
            DecoupleOutcome::Decoupled
        );
        assert_eq!(
            roll_decouple(&mut rng, 1.0, 0.0, 1.0),
            DecoupleOutcome::Misfired
        );
    }
}
