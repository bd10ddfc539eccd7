//! Tunable constants: per-component tuning and session-wide settings.
//!
//! Both are plain data. Loading never fails hard: unreadable files,
//! malformed JSON and bad individual values fall back to the built-in
//! defaults with a `log::warn!`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::curve::{ReliabilityCurve, DEFAULT_LIFETIME_PERFECT, DEFAULT_LIFETIME_TERRIBLE};
use crate::reliability::ComponentKind;

/// Errors raised while reading configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-component tunables. Defaults depend on the component kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTuning {
    /// Lifetime in days at 100% quality.
    pub lifetime_perfect: f64,
    /// Lifetime in days at 0% quality.
    pub lifetime_terrible: f64,
    /// Repair-resource units needed to clear a full failure.
    pub repair_requirement: u32,
    /// Units needed to clear a partial failure (flickering light).
    pub partial_repair_requirement: u32,
    /// Minimum technician skill for repairs when skill is enforced.
    pub repair_skill: u8,
    /// Reliability restored by a completed standard repair.
    pub repair_bonus: f64,
    /// Reliability restored by a lucky kick.
    pub kick_bonus: f64,
    /// Failure chance at reliability 1.0 (starting chance for ignitors).
    pub chance_perfect: f64,
    /// Failure chance at reliability 0.0.
    pub chance_terrible: f64,
    /// Stress failure chance at reliability 1.0 (over the g limit).
    pub stressed_chance_perfect: f64,
    pub stressed_chance_terrible: f64,
    /// G limit at reliability 1.0 and 0.0.
    pub max_gees_perfect: f64,
    pub max_gees_terrible: f64,
    /// Chance a kick destroys the component (locks it, for gimbals).
    pub kick_catastrophe_chance: f64,
    /// Chance a kick fixes the component.
    pub kick_fix_chance: f64,
    /// Decoupler: explosion and misfire chances on staging.
    pub explosion_chance: f64,
    pub misfire_chance: f64,
    /// Decoupler: explosion and "nothing happens" chances when bashed.
    pub bash_explosion_chance: f64,
    pub bash_nothing_chance: f64,
    /// Tank: leak time constant range in seconds.
    pub leak_min_tc: f64,
    pub leak_max_tc: f64,
    /// Light: flicker duration range in seconds before the bulb busts.
    pub flicker_min_time: f32,
    pub flicker_max_time: f32,
}

impl ComponentTuning {
    /// Built-in defaults for a component kind.
    pub fn defaults_for(kind: ComponentKind) -> Self {
        let mut tuning = Self::base();
        match kind {
            ComponentKind::Ignitor => {
                tuning.chance_perfect = 0.015625;
                tuning.chance_terrible = 0.875;
            }
            ComponentKind::Cooling => {
                tuning.chance_perfect = 0.000001;
                tuning.chance_terrible = 0.01;
            }
            ComponentKind::Gimbal => {
                tuning.chance_perfect = 0.00001;
                tuning.chance_terrible = 0.001;
                tuning.kick_catastrophe_chance = 0.05;
            }
            ComponentKind::Tank => {
                tuning.chance_perfect = 0.00001;
                tuning.chance_terrible = 0.001;
            }
            ComponentKind::Light => {
                tuning.chance_perfect = 0.000001;
                tuning.chance_terrible = 0.01;
            }
            ComponentKind::Alternator => {
                tuning.chance_perfect = 0.000001;
                tuning.chance_terrible = 0.00025;
                tuning.stressed_chance_perfect = 0.1;
                tuning.stressed_chance_terrible = 0.5;
                tuning.max_gees_perfect = 15.0;
                tuning.max_gees_terrible = 10.0;
                tuning.repair_bonus = 0.25;
            }
            ComponentKind::Altimeter | ComponentKind::ThrustGauge => {
                tuning.stressed_chance_perfect = 0.1;
                tuning.stressed_chance_terrible = 0.5;
                tuning.max_gees_perfect = 12.5;
                tuning.max_gees_terrible = 7.5;
                tuning.repair_bonus = 0.25;
            }
            ComponentKind::Decoupler | ComponentKind::Monitor => {}
        }
        tuning
    }

    fn base() -> Self {
        Self {
            lifetime_perfect: DEFAULT_LIFETIME_PERFECT,
            lifetime_terrible: DEFAULT_LIFETIME_TERRIBLE,
            repair_requirement: 50,
            partial_repair_requirement: 5,
            repair_skill: 0,
            repair_bonus: 0.2,
            kick_bonus: 0.05,
            chance_perfect: 0.0,
            chance_terrible: 0.0,
            stressed_chance_perfect: 0.0,
            stressed_chance_terrible: 0.0,
            max_gees_perfect: f64::MAX,
            max_gees_terrible: f64::MAX,
            kick_catastrophe_chance: 0.025,
            kick_fix_chance: 0.1,
            explosion_chance: 0.125,
            misfire_chance: 0.5,
            bash_explosion_chance: 0.125,
            bash_nothing_chance: 0.675,
            leak_min_tc: 10.0,
            leak_max_tc: 60.0,
            flicker_min_time: 5.0,
            flicker_max_time: 30.0,
        }
    }

    /// Lifetime curve built from this tuning's endpoints.
    pub fn curve(&self) -> ReliabilityCurve {
        ReliabilityCurve::from_lifetimes(self.lifetime_perfect, self.lifetime_terrible)
    }

    /// Defaults for `kind` with the recognised keys of `overrides` applied.
    ///
    /// Unknown keys and values that are not numbers (or numeric strings)
    /// are skipped with a warning.
    pub fn with_overrides(kind: ComponentKind, overrides: &Map<String, Value>) -> Self {
        let mut tuning = Self::defaults_for(kind);
        for (key, value) in overrides {
            let Some(number) = numeric(value) else {
                log::warn!(
                    "{}: value for '{}' is not a number ({}), keeping default",
                    kind.module_name(),
                    key,
                    value
                );
                continue;
            };
            let key = instrument_alias(kind, key);
            if !tuning.set(key, number) {
                log::warn!("{}: unknown tunable '{}' ignored", kind.module_name(), key);
            }
        }
        tuning
    }

    fn set(&mut self, key: &str, v: f64) -> bool {
        match key {
            "lifetimePerfect" | "lifetime_perfect" => self.lifetime_perfect = v,
            "lifetimeTerrible" | "lifetime_terrible" => self.lifetime_terrible = v,
            "rocketPartsNeededToFix" | "repair_requirement" => {
                self.repair_requirement = v.max(1.0) as u32
            }
            "rocketPartsNeededFlickering" | "partial_repair_requirement" => {
                self.partial_repair_requirement = v.max(1.0) as u32
            }
            "repairSkill" | "repair_skill" => self.repair_skill = v.clamp(0.0, 5.0) as u8,
            "repair_bonus" => self.repair_bonus = v,
            "kick_bonus" => self.kick_bonus = v,
            "chanceToFailPerfect"
            | "startingChanceToFailPerfect"
            | "runningChanceToFailPerfect"
            | "idleChanceToFailPerfect"
            | "chance_perfect" => self.chance_perfect = v,
            "chanceToFailTerrible"
            | "startingChanceToFailTerrible"
            | "runningChanceToFailTerrible"
            | "idleChanceToFailTerrible"
            | "chance_terrible" => self.chance_terrible = v,
            "stressedChanceToFailPerfect" | "stressed_chance_perfect" => {
                self.stressed_chance_perfect = v
            }
            "stressedChanceToFailTerrible" | "stressed_chance_terrible" => {
                self.stressed_chance_terrible = v
            }
            "maxGeesPerfect" | "max_gees_perfect" => self.max_gees_perfect = v,
            "maxGeesTerrible" | "max_gees_terrible" => self.max_gees_terrible = v,
            "chanceKickWillDestroy" | "chanceKickWillLock" | "kick_catastrophe_chance" => {
                self.kick_catastrophe_chance = v
            }
            "chanceKickWillFix" | "kick_fix_chance" => self.kick_fix_chance = v,
            "chanceOfExplosion" | "explosion_chance" => self.explosion_chance = v,
            "chanceOfNothing" | "misfire_chance" => self.misfire_chance = v,
            "chanceOfExplosionEVA" | "bash_explosion_chance" => self.bash_explosion_chance = v,
            "chanceOfNothingEVA" | "bash_nothing_chance" => self.bash_nothing_chance = v,
            "minTC" | "leak_min_tc" => self.leak_min_tc = v,
            "maxTC" | "leak_max_tc" => self.leak_max_tc = v,
            "flicker_min_time" => self.flicker_min_time = v as f32,
            "flicker_max_time" => self.flicker_max_time = v as f32,
            _ => return false,
        }
        true
    }
}

/// Instruments only roll under stress, so their plain chance keys address the stress chances.
fn instrument_alias(kind: ComponentKind, key: &str) -> &str {
    if !kind.is_instrument() {
        return key;
    }
    match key {
        "chanceToFailPerfect" => "stressed_chance_perfect",
        "chanceToFailTerrible" => "stressed_chance_terrible",
        other => other,
    }
}

/// Read a number, accepting numeric strings such as `"0.5"`.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Session-wide settings, passed explicitly into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds of simulated time between periodic checks.
    pub check_interval: f32,
    /// Units requested per standard repair action.
    pub repair_batch: u32,
    /// Units requested per maintenance action.
    pub maintenance_batch: u32,
    /// Reliability gained per maintenance unit granted.
    pub maintenance_bonus_per_unit: f64,
    /// Maintenance is offered only below this reliability.
    pub maintenance_threshold: f64,
    pub stop_time_warp_on_failure: bool,
    pub alert_message_on_failure: bool,
    pub highlight_failed_parts: bool,
    /// Gate repairs on technician skill (career games).
    pub enforce_repair_skill: bool,
    /// Resources that never leak.
    pub leak_blacklist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval: 10.0,
            repair_batch: 10,
            maintenance_batch: 2,
            maintenance_bonus_per_unit: 0.05,
            maintenance_threshold: 0.99,
            stop_time_warp_on_failure: true,
            alert_message_on_failure: true,
            highlight_failed_parts: true,
            enforce_repair_skill: false,
            leak_blacklist: vec!["ElectricCharge".to_string(), "RocketParts".to_string()],
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = serde_json::from_str(text)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Read settings from a file, falling back to defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sanitize(&mut self) {
        let defaults = Settings::default();
        if !(self.check_interval.is_finite() && self.check_interval > 0.0) {
            log::warn!(
                "check_interval {} is not positive, using {}",
                self.check_interval,
                defaults.check_interval
            );
            self.check_interval = defaults.check_interval;
        }
        if self.repair_batch == 0 {
            log::warn!("repair_batch must be at least 1, using {}", defaults.repair_batch);
            self.repair_batch = defaults.repair_batch;
        }
    }
}
