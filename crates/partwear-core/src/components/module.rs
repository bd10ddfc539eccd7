//! Reliability module components.
//!
//! A module entity carries a [`ReliabilityModule`] plus the small amount of
//! per-kind runtime state the systems need: [`Sensors`] for edge and peak
//! tracking and [`Degradation`] for partial failures in progress.

use partwear_logic::decay::DecayPolicy;
use partwear_logic::reliability::{failure_label, ComponentKind, ReliabilityState};
use partwear_logic::repair::{Flicker, Leak};
use partwear_logic::tuning::ComponentTuning;
use serde::{Deserialize, Serialize};

use super::part::PartId;

/// ReliabilityModule component - one part function that can wear out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityModule {
    pub part: PartId,
    pub kind: ComponentKind,
    pub state: ReliabilityState,
    pub tuning: ComponentTuning,
    /// False when the owning part lacks the capability this module needs
    pub enabled: bool,
}

impl ReliabilityModule {
    pub fn new(part: PartId, kind: ComponentKind, quality: f32, tuning: ComponentTuning) -> Self {
        Self {
            part,
            kind,
            state: ReliabilityState::new(quality),
            tuning,
            enabled: true,
        }
    }

    pub fn decay_policy(&self, check_interval: f32) -> DecayPolicy {
        DecayPolicy::new(self.tuning.curve(), check_interval)
    }
}

/// Host readings remembered between ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    /// Throttle seen last tick while ignited; 0 when shut down
    pub last_throttle: f32,
    /// Highest g-force since the last periodic check
    pub peak_g: f64,
}

/// Partial failure in progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Degradation {
    #[default]
    None,
    Leaking(Leak),
    Flickering(Flicker),
}

impl Degradation {
    pub fn leak(&self) -> Option<&Leak> {
        match self {
            Degradation::Leaking(leak) => Some(leak),
            _ => None,
        }
    }
}

/// Failure label for a module, e.g. "Ignition Coil Burnt"
pub fn module_label(module: &ReliabilityModule, degradation: &Degradation) -> Option<String> {
    let failure = module.state.failure?;
    let detail = degradation.leak().map(|l| l.resource.as_str());
    Some(failure_label(module.kind, failure, detail))
}
