//! Repair, maintenance and partial-failure models.
//!
//! A standard repair spends an abstract repair resource until the
//! component's `repair_progress` reaches zero. Kicks trade a small chance of
//! destroying the component for a small chance of a free fix. Leaking tanks
//! and flickering lights are partial failures with their own timers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::failure::{decoupler_quality_factor, DecoupleOutcome};
use crate::reliability::{ComponentKind, FailureKind, ReliabilityState};
use crate::tuning::ComponentTuning;

/// Reliability added by duct-taping a leak.
pub const DUCT_TAPE_BONUS: f64 = 0.1;

/// How reliability is restored when a repair completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Restoration {
    /// Add a fixed bonus, capped at 1.
    Bonus(f64),
    /// Replace the component outright.
    SetTo(f64),
}

impl Restoration {
    pub fn apply(self, state: &mut ReliabilityState) {
        match self {
            Restoration::Bonus(bonus) => state.restore_on_repair(bonus),
            Restoration::SetTo(value) => state.restore_to(value),
        }
    }
}

/// Restoration for a completed standard repair of `kind`.
///
/// Patched tanks and replaced bulbs are as good as new.
pub fn restoration_for(kind: ComponentKind, tuning: &ComponentTuning) -> Restoration {
    match kind {
        ComponentKind::Tank | ComponentKind::Light => Restoration::SetTo(1.0),
        _ => Restoration::Bonus(tuning.repair_bonus),
    }
}

/// Spend up to `available` units on a failed component.
///
/// Returns the amount consumed, `min(available, repair_progress)`. When the
/// requirement is met the failure clears and `restoration` is applied in
/// the same call. Locked actuators cannot be repaired and consume nothing.
pub fn apply_repair_resource(
    state: &mut ReliabilityState,
    available: u32,
    restoration: Restoration,
) -> u32 {
    if !state.is_failed() || state.failure == Some(FailureKind::Locked) {
        return 0;
    }
    let consumed = available.min(state.repair_progress);
    if state.tick_repair(consumed) {
        restoration.apply(state);
    }
    consumed
}

/// Units a standard repair action asks the supplier for.
pub fn repair_request(state: &ReliabilityState, batch: u32) -> u32 {
    state.repair_progress.min(batch)
}

/// Whether a technician of `skill` may attempt the repair.
pub fn skill_allows(skill: u8, required: u8, enforce: bool) -> bool {
    !enforce || skill >= required
}

/// Maintenance is offered only on operating components below `threshold`.
pub fn maintenance_available(state: &ReliabilityState, threshold: f64) -> bool {
    state.is_operating() && state.reliability < threshold
}

/// Preventive maintenance: add `per_unit` reliability for each unit granted.
pub fn apply_maintenance(state: &mut ReliabilityState, granted: u32, per_unit: f64) {
    state.reliability += per_unit * granted as f64;
    state.clamp();
}

/// Result of kicking a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickOutcome {
    /// The component exploded and must be removed.
    Destroyed,
    /// A gimbal kicked too hard: locked for good.
    Locked,
    /// Lucky: failure cleared with the kick bonus.
    Fixed,
    Nothing,
}

/// Kick a failed component. One uniform draw decides the outcome.
///
/// `roll < catastrophe` destroys (or locks, for gimbals); `roll > 1 - fix`
/// clears the failure with the smaller kick bonus.
pub fn kick(
    rng: &mut impl Rng,
    kind: ComponentKind,
    state: &mut ReliabilityState,
    tuning: &ComponentTuning,
) -> KickOutcome {
    if !state.is_failed() || state.failure == Some(FailureKind::Locked) {
        return KickOutcome::Nothing;
    }
    let roll: f64 = rng.gen();
    if roll < tuning.kick_catastrophe_chance {
        if kind == ComponentKind::Gimbal {
            state.escalate(FailureKind::Locked, 1);
            KickOutcome::Locked
        } else {
            KickOutcome::Destroyed
        }
    } else if roll > 1.0 - tuning.kick_fix_chance {
        state.restore_on_repair(tuning.kick_bonus);
        KickOutcome::Fixed
    } else {
        KickOutcome::Nothing
    }
}

/// Bash a misfired decoupler. Chances scale with quality like staging.
///
/// `roll < explosion / f` explodes, `roll >= nothing / f` decouples,
/// anything between leaves the decoupler stuck.
pub fn bash_decoupler(
    rng: &mut impl Rng,
    state: &mut ReliabilityState,
    tuning: &ComponentTuning,
) -> Option<DecoupleOutcome> {
    if state.failure != Some(FailureKind::Misfired) {
        return None;
    }
    let factor = decoupler_quality_factor(state.quality);
    if factor <= 0.0 {
        return Some(DecoupleOutcome::Exploded);
    }
    let roll: f64 = rng.gen();
    if roll < tuning.bash_explosion_chance / factor {
        Some(DecoupleOutcome::Exploded)
    } else if roll >= tuning.bash_nothing_chance / factor {
        state.restore_on_repair(0.0);
        Some(DecoupleOutcome::Decoupled)
    } else {
        Some(DecoupleOutcome::Misfired)
    }
}

/// An active tank leak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leak {
    pub resource: String,
    /// `1 / TC`, the exponential decay rate of the leaking quantity.
    pub pole: f64,
}

impl Leak {
    /// Pick a leaking resource and a severity.
    ///
    /// Blacklisted resources never leak. Returns `None` when nothing can.
    pub fn start(
        rng: &mut impl Rng,
        resources: &[String],
        blacklist: &[String],
        tuning: &ComponentTuning,
    ) -> Option<Leak> {
        let leakable: Vec<&String> = resources
            .iter()
            .filter(|r| !blacklist.contains(r))
            .collect();
        let resource = match leakable.len() {
            0 => return None,
            1 => leakable[0],
            n => leakable[rng.gen_range(0..n)],
        };
        let (lo, hi) = (tuning.leak_min_tc, tuning.leak_max_tc.max(tuning.leak_min_tc));
        let tc = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        Some(Leak {
            resource: resource.clone(),
            pole: 1.0 / tc.max(f64::EPSILON),
        })
    }

    /// Amount lost this tick: `pole * amount * (left / needed) * dt`.
    ///
    /// Patching slows the leak as progress is made.
    pub fn loss(&self, amount: f64, left: u32, needed: u32, dt: f32) -> f64 {
        if needed == 0 || amount <= 0.0 {
            return 0.0;
        }
        let fraction = left as f64 / needed as f64;
        (self.pole * amount * fraction * dt as f64).clamp(0.0, amount)
    }
}

/// Duct tape stops a leak at once and adds a little reliability.
pub fn apply_duct_tape(state: &mut ReliabilityState) -> bool {
    if state.failure != Some(FailureKind::Leaking) {
        return false;
    }
    state.restore_on_repair(DUCT_TAPE_BONUS);
    true
}

/// Step result of a flickering bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlickerStep {
    /// Still flickering; the bulb is lit or dark.
    Flicker { lit: bool },
    /// The flicker window ran out.
    Busted,
}

/// Flickering-light timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flicker {
    pub timeout: f32,
    pub elapsed: f32,
    pub toggle_after: f32,
    pub since_toggle: f32,
    pub lit: bool,
}

impl Flicker {
    pub fn start(rng: &mut impl Rng, tuning: &ComponentTuning) -> Flicker {
        let (lo, hi) = (tuning.flicker_min_time, tuning.flicker_max_time);
        let timeout = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        Flicker {
            timeout,
            elapsed: 0.0,
            toggle_after: rng.gen_range(0.1..0.4),
            since_toggle: 0.0,
            lit: true,
        }
    }

    /// Advance the flicker. Dark spells last [0.1, 0.4) s, lit ones [0.5, 5) s.
    pub fn tick(&mut self, rng: &mut impl Rng, dt: f32) -> FlickerStep {
        self.elapsed += dt;
        if self.elapsed >= self.timeout {
            self.lit = false;
            return FlickerStep::Busted;
        }
        self.since_toggle += dt;
        if self.since_toggle >= self.toggle_after {
            self.since_toggle = 0.0;
            self.lit = !self.lit;
            self.toggle_after = if self.lit {
                rng.gen_range(0.5..5.0)
            } else {
                rng.gen_range(0.1..0.4)
            };
        }
        FlickerStep::Flicker { lit: self.lit }
    }
}
