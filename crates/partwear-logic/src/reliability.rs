//! Per-component reliability record and the kinds that describe it.
//!
//! A [`ReliabilityState`] is owned by exactly one component. Policies in
//! [`decay`](crate::decay), [`failure`](crate::failure) and
//! [`repair`](crate::repair) mutate it; every mutation leaves reliability
//! inside [0, 1].

use serde::{Deserialize, Serialize};

/// Quality assigned to a freshly attached component.
pub const DEFAULT_QUALITY: f32 = 0.75;

/// Reliability of a freshly attached component before quality penalties.
pub const DEFAULT_RELIABILITY: f64 = 1.0;

/// Kind of part function that can wear out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Ignitor,
    Cooling,
    Gimbal,
    Tank,
    Light,
    Alternator,
    Decoupler,
    Altimeter,
    ThrustGauge,
    Monitor,
}

/// Host capability a component needs on its part to function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Engine,
    Gimbal,
    Light,
    Alternator,
    Decoupler,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 10] = [
        ComponentKind::Ignitor,
        ComponentKind::Cooling,
        ComponentKind::Gimbal,
        ComponentKind::Tank,
        ComponentKind::Light,
        ComponentKind::Alternator,
        ComponentKind::Decoupler,
        ComponentKind::Altimeter,
        ComponentKind::ThrustGauge,
        ComponentKind::Monitor,
    ];

    /// Human-readable module name.
    pub fn display_name(self) -> &'static str {
        match self {
            ComponentKind::Ignitor => "Ignition Coil",
            ComponentKind::Cooling => "Cooling System",
            ComponentKind::Gimbal => "Gimbal",
            ComponentKind::Tank => "Tank",
            ComponentKind::Light => "Light",
            ComponentKind::Alternator => "Alternator",
            ComponentKind::Decoupler => "Decoupler",
            ComponentKind::Altimeter => "Altimeter",
            ComponentKind::ThrustGauge => "Thrust Gauge",
            ComponentKind::Monitor => "Part Monitor",
        }
    }

    /// Name used in loadout documents (`"ModuleReliabilityIgnitor"` etc.).
    pub fn module_name(self) -> &'static str {
        match self {
            ComponentKind::Ignitor => "ModuleReliabilityIgnitor",
            ComponentKind::Cooling => "ModuleReliabilityCooling",
            ComponentKind::Gimbal => "ModuleReliabilityGimbal",
            ComponentKind::Tank => "ModuleReliabilityTank",
            ComponentKind::Light => "ModuleReliabilityLight",
            ComponentKind::Alternator => "ModuleReliabilityAlternator",
            ComponentKind::Decoupler => "ModuleReliabilityDecoupler",
            ComponentKind::Altimeter => "ModuleReliabilityAltimeter",
            ComponentKind::ThrustGauge => "ModuleReliabilityThrust",
            ComponentKind::Monitor => "ModuleReliabilityMonitor",
        }
    }

    pub fn from_module_name(name: &str) -> Option<ComponentKind> {
        Self::ALL.iter().copied().find(|k| k.module_name() == name)
    }

    /// Capability that must be present on the owning part.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            ComponentKind::Ignitor | ComponentKind::Cooling => Some(Capability::Engine),
            ComponentKind::Gimbal => Some(Capability::Gimbal),
            ComponentKind::Light => Some(Capability::Light),
            ComponentKind::Alternator => Some(Capability::Alternator),
            ComponentKind::Decoupler => Some(Capability::Decoupler),
            _ => None,
        }
    }

    /// Instruments feed vessel-wide readouts.
    pub fn is_instrument(self) -> bool {
        matches!(self, ComponentKind::Altimeter | ComponentKind::ThrustGauge)
    }

    /// Engine hardware can be kicked back into service.
    pub fn is_kickable(self) -> bool {
        matches!(
            self,
            ComponentKind::Ignitor | ComponentKind::Cooling | ComponentKind::Gimbal
        )
    }

    /// Failure kinds this component can roll into from `Nominal`.
    pub fn failure_kinds(self) -> &'static [FailureKind] {
        match self {
            ComponentKind::Ignitor => &[FailureKind::Burnt],
            ComponentKind::Cooling => &[FailureKind::CoolingLoss],
            ComponentKind::Gimbal => &[FailureKind::Stuck],
            ComponentKind::Tank => &[FailureKind::Leaking],
            ComponentKind::Light => &[FailureKind::Flickering],
            ComponentKind::Alternator => &[FailureKind::Burnt],
            ComponentKind::Decoupler => &[FailureKind::Misfired],
            ComponentKind::Altimeter | ComponentKind::ThrustGauge => &[FailureKind::Stuck],
            ComponentKind::Monitor => &[],
        }
    }
}

/// Way in which a component has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    Burnt,
    CoolingLoss,
    Stuck,
    Locked,
    Leaking,
    Flickering,
    Busted,
    Misfired,
}

impl FailureKind {
    /// Partial failures allow degraded operation before full failure.
    pub fn is_partial(self) -> bool {
        matches!(self, FailureKind::Leaking | FailureKind::Flickering)
    }

    /// Stable token used by the flat field persistence.
    pub fn token(self) -> &'static str {
        match self {
            FailureKind::Burnt => "burnt",
            FailureKind::CoolingLoss => "cooling_loss",
            FailureKind::Stuck => "stuck",
            FailureKind::Locked => "locked",
            FailureKind::Leaking => "leaking",
            FailureKind::Flickering => "flickering",
            FailureKind::Busted => "busted",
            FailureKind::Misfired => "misfired",
        }
    }

    pub fn from_token(token: &str) -> Option<FailureKind> {
        [
            FailureKind::Burnt,
            FailureKind::CoolingLoss,
            FailureKind::Stuck,
            FailureKind::Locked,
            FailureKind::Leaking,
            FailureKind::Flickering,
            FailureKind::Busted,
            FailureKind::Misfired,
        ]
        .into_iter()
        .find(|k| k.token() == token)
    }
}

/// Label shown for a failed component, e.g. "Ignition Coil Burnt".
///
/// `detail` names the leaking resource for tank leaks.
pub fn failure_label(component: ComponentKind, failure: FailureKind, detail: Option<&str>) -> String {
    match (component, failure) {
        (ComponentKind::Ignitor, FailureKind::Burnt) => "Ignition Coil Burnt".to_string(),
        (ComponentKind::Cooling, _) => "Cooling Failure".to_string(),
        (ComponentKind::Gimbal, FailureKind::Locked) => "Gimbal Locked".to_string(),
        (ComponentKind::Gimbal, _) => "Gimbal Stuck".to_string(),
        (ComponentKind::Tank, _) => format!("{} leaking!", detail.unwrap_or("Resource")),
        (ComponentKind::Light, FailureKind::Flickering) => "Flickering Light Bulb".to_string(),
        (ComponentKind::Light, _) => "Busted Light Bulb".to_string(),
        (ComponentKind::Alternator, _) => "Alternator Failure".to_string(),
        (ComponentKind::Decoupler, _) => "Decouple failure".to_string(),
        (ComponentKind::Altimeter, _) => "Altimeter Stuck".to_string(),
        (ComponentKind::ThrustGauge, _) => "Thrust Gauge Stuck".to_string(),
        (kind, failure) => format!("{} {:?}", kind.display_name(), failure),
    }
}

/// Mutable reliability record of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityState {
    /// Design quality in [0, 1]; changed only by explicit user action.
    pub quality: f32,
    /// Current reliability in [0, 1].
    pub reliability: f64,
    /// `None` while operating.
    pub failure: Option<FailureKind>,
    /// Repair-resource units still needed to clear the failure.
    pub repair_progress: u32,
    /// Seconds accumulated towards the next periodic check.
    pub time_since_check: f32,
}

impl ReliabilityState {
    /// Fresh component at the given quality, with the low-quality penalty applied.
    pub fn new(quality: f32) -> Self {
        let quality = quality.clamp(0.0, 1.0);
        Self {
            quality,
            reliability: initial_reliability(quality),
            failure: None,
            repair_progress: 0,
            time_since_check: 0.0,
        }
    }

    /// Enforce reliability in [0, 1]. Called every tick regardless of state.
    pub fn clamp(&mut self) {
        if self.reliability.is_nan() {
            self.reliability = 0.0;
        }
        self.reliability = self.reliability.clamp(0.0, 1.0);
    }

    pub fn apply_drain(&mut self, amount: f64) {
        self.reliability -= amount.max(0.0);
        self.clamp();
    }

    /// Enter a failure with the given repair requirement.
    ///
    /// Returns false, leaving the state untouched, if already failed.
    pub fn set_failure(&mut self, kind: FailureKind, requirement: u32) -> bool {
        if self.failure.is_some() {
            return false;
        }
        self.failure = Some(kind);
        self.repair_progress = requirement.max(1);
        true
    }

    /// Escalate a partial failure to a full one with a new requirement.
    pub fn escalate(&mut self, kind: FailureKind, requirement: u32) {
        self.failure = Some(kind);
        self.repair_progress = requirement.max(1);
    }

    /// Spend repair resource; returns true when the repair requirement is met.
    pub fn tick_repair(&mut self, resource_spent: u32) -> bool {
        if self.failure.is_none() {
            return false;
        }
        self.repair_progress = self.repair_progress.saturating_sub(resource_spent);
        self.repair_progress == 0
    }

    /// Clear the failure and restore reliability by `bonus`.
    pub fn restore_on_repair(&mut self, bonus: f64) {
        self.failure = None;
        self.repair_progress = 0;
        self.reliability += bonus;
        self.clamp();
    }

    /// Clear the failure and set reliability outright (full replacement).
    pub fn restore_to(&mut self, reliability: f64) {
        self.failure = None;
        self.repair_progress = 0;
        self.reliability = reliability;
        self.clamp();
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn is_operating(&self) -> bool {
        self.failure.is_none()
    }
}

impl Default for ReliabilityState {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

/// Starting reliability for a quality: 1.0, minus 0.1 below 0.5 and another 0.1 below 0.25.
pub fn initial_reliability(quality: f32) -> f64 {
    let mut reliability = DEFAULT_RELIABILITY;
    if quality < 0.5 {
        reliability -= 0.1;
        if quality < 0.25 {
            reliability -= 0.1;
        }
    }
    reliability
}
