//! Reliability drain: quality-weighted wear applied on a periodic check cadence.
//!
//! Drain is only applied while a component is active. The base drain per
//! check comes from the lifetime curve; a per-kind intensity multiplier
//! scales it for load (throttle, over-g stress).

use serde::{Deserialize, Serialize};

use crate::curve::ReliabilityCurve;
use crate::reliability::{ComponentKind, ReliabilityState};

/// Periodic checks per day: a six-hour day in 10-second intervals.
pub const CHECKS_PER_DAY: f64 = 2160.0;

/// G-force above which alternators take extra wear.
pub const ALTERNATOR_STRESS_FLOOR_G: f64 = 5.0;

/// Host conditions a component sees during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatingConditions {
    /// Current throttle fraction [0, 1].
    pub throttle: f32,
    /// Vessel g-force.
    pub g_force: f64,
    pub engine_ignited: bool,
    pub staged: bool,
    pub light_on: bool,
}

/// Drain per check for a quality on the given curve.
pub fn current_drain_rate(quality: f32, curve: &ReliabilityCurve) -> f64 {
    let days = curve.lifetime_days(quality);
    if !(days.is_finite() && days > 0.0) {
        return 1.0;
    }
    1.0 / (days * CHECKS_PER_DAY)
}

/// Alternator over-g factor: `max(g - 5, 0) * 10`.
pub fn over_gees(g_force: f64) -> f64 {
    (g_force - ALTERNATOR_STRESS_FLOOR_G).max(0.0) * 10.0
}

/// Whether a component kind wears under these conditions.
pub fn is_active(kind: ComponentKind, conditions: &OperatingConditions) -> bool {
    match kind {
        ComponentKind::Ignitor => conditions.engine_ignited,
        ComponentKind::Cooling => conditions.staged || conditions.engine_ignited,
        ComponentKind::Gimbal => conditions.throttle > 0.0,
        ComponentKind::Light => conditions.light_on,
        ComponentKind::Decoupler => false,
        ComponentKind::Tank
        | ComponentKind::Alternator
        | ComponentKind::Altimeter
        | ComponentKind::ThrustGauge
        | ComponentKind::Monitor => true,
    }
}

/// Load multiplier applied to the base drain.
pub fn intensity(kind: ComponentKind, conditions: &OperatingConditions) -> f64 {
    let throttle = conditions.throttle.clamp(0.0, 1.0) as f64;
    match kind {
        ComponentKind::Ignitor | ComponentKind::Cooling => 1.0 + 9.0 * throttle,
        ComponentKind::Gimbal => 10.0,
        ComponentKind::Alternator => 1.0 + over_gees(conditions.g_force) + 5.0 * throttle,
        _ => 1.0,
    }
}

/// Drain policy for one component: its lifetime curve and the check cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    pub curve: ReliabilityCurve,
    pub check_interval: f32,
}

impl DecayPolicy {
    pub fn new(curve: ReliabilityCurve, check_interval: f32) -> Self {
        Self {
            curve,
            check_interval,
        }
    }

    pub fn current_drain_rate(&self, quality: f32) -> f64 {
        current_drain_rate(quality, &self.curve)
    }

    /// Advance the check timer by `dt` and drain once per elapsed check.
    ///
    /// `intensity` is `None` while the component is idle: the timer does not
    /// advance and nothing drains. Returns the number of checks that elapsed,
    /// which is how many failure rolls the caller owes.
    pub fn tick(&self, state: &mut ReliabilityState, dt: f32, intensity: Option<f64>) -> u32 {
        let Some(intensity) = intensity else {
            return 0;
        };
        let checks = advance_timer(&mut state.time_since_check, dt, self.check_interval);
        if checks > 0 {
            let drain = self.current_drain_rate(state.quality) * intensity.max(0.0);
            state.apply_drain(drain * checks as f64);
        }
        checks
    }

    /// Continuous over-limit wear: `drain * (g - limit) * dt` while `g > limit`.
    pub fn apply_stress(&self, state: &mut ReliabilityState, g_force: f64, limit: f64, dt: f32) {
        if g_force > limit {
            let drain = self.current_drain_rate(state.quality);
            state.apply_drain(drain * (g_force - limit) * dt as f64);
        }
    }
}

/// Accumulate `dt` and return how many whole intervals elapsed.
///
/// The remainder is carried over so variable step sizes do not drift.
pub fn advance_timer(accumulator: &mut f32, dt: f32, interval: f32) -> u32 {
    if !(dt.is_finite() && dt > 0.0) || !(interval > 0.0) {
        return 0;
    }
    *accumulator += dt;
    if *accumulator < interval {
        return 0;
    }
    let checks = (*accumulator / interval).floor();
    *accumulator -= checks * interval;
    if *accumulator < 0.0 {
        *accumulator = 0.0;
    }
    checks as u32
}
