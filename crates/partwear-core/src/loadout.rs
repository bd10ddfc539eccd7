//! Loadout documents: which reliability modules attach to which parts.
//!
//! A loadout is a JSON list of part templates. Each template names the
//! part, its host capabilities and stored resources, and the reliability
//! modules to attach with optional tuning overrides:
//!
//! ```json
//! { "parts": [ {
//!     "part_name": "liquidEngine2_v2",
//!     "title": "LV-T45 Engine",
//!     "base_cost": 1200,
//!     "capabilities": ["Engine", "Gimbal"],
//!     "modules": [
//!         { "module_name": "ModuleReliabilityIgnitor", "overrides": { "chanceToFailPerfect": 0.02 } },
//!         { "module_name": "ModuleReliabilityGimbal" }
//!     ]
//! } ] }
//! ```
//!
//! Underscores in part names become dots. Problems with individual entries
//! are logged and the entry skipped; only unreadable or malformed documents
//! are errors.

use std::path::Path;

use partwear_logic::reliability::{Capability, ComponentKind, DEFAULT_QUALITY};
use partwear_logic::tuning::{numeric, ComponentTuning, ConfigError};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::components::StoredResource;

/// One module to attach, with tuning already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTemplate {
    pub kind: ComponentKind,
    pub quality: f32,
    pub tuning: ComponentTuning,
}

/// A part ready to be attached to a vessel
#[derive(Debug, Clone, PartialEq)]
pub struct PartTemplate {
    pub name: String,
    pub title: String,
    pub base_cost: f64,
    pub capabilities: Vec<Capability>,
    pub resources: Vec<StoredResource>,
    pub modules: Vec<ModuleTemplate>,
}

impl PartTemplate {
    /// Parts with reliability modules also carry a part manager
    pub fn has_manager(&self) -> bool {
        !self.modules.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLoadout {
    parts: Vec<RawPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPart {
    part_name: Option<String>,
    title: Option<String>,
    base_cost: Value,
    capabilities: Vec<String>,
    resources: Vec<RawResource>,
    modules: Vec<RawModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResource {
    name: String,
    amount: f64,
    capacity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawModule {
    module_name: Option<String>,
    quality: Value,
    overrides: Map<String, Value>,
}

/// Parsed loadout document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    pub parts: Vec<PartTemplate>,
}

impl Loadout {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawLoadout = serde_json::from_str(text)?;
        let parts = raw.parts.into_iter().filter_map(resolve_part).collect();
        Ok(Self { parts })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn part(&self, name: &str) -> Option<&PartTemplate> {
        self.parts.iter().find(|p| p.name == name)
    }
}

/// Host part names use dots where loadouts may only use underscores
pub fn normalize_part_name(name: &str) -> String {
    name.replace('_', ".")
}

pub fn parse_capability(name: &str) -> Option<Capability> {
    match name.to_ascii_lowercase().as_str() {
        "engine" => Some(Capability::Engine),
        "gimbal" => Some(Capability::Gimbal),
        "light" => Some(Capability::Light),
        "alternator" => Some(Capability::Alternator),
        "decoupler" => Some(Capability::Decoupler),
        _ => None,
    }
}

fn resolve_part(raw: RawPart) -> Option<PartTemplate> {
    let Some(part_name) = raw.part_name.filter(|n| !n.trim().is_empty()) else {
        log::warn!("skipping part template without a part_name");
        return None;
    };
    let name = normalize_part_name(part_name.trim());

    let base_cost = match (&raw.base_cost, numeric(&raw.base_cost)) {
        (Value::Null, _) => 0.0,
        (_, Some(cost)) if cost.is_finite() => cost.max(0.0),
        (bad, _) => {
            log::warn!("{}: bad base_cost {}, using 0", name, bad);
            0.0
        }
    };

    let mut capabilities = Vec::new();
    for cap in &raw.capabilities {
        match parse_capability(cap) {
            Some(c) if !capabilities.contains(&c) => capabilities.push(c),
            Some(_) => {}
            None => log::warn!("{}: unknown capability {:?}", name, cap),
        }
    }

    let resources = raw
        .resources
        .into_iter()
        .filter(|r| !r.name.is_empty())
        .map(|r| StoredResource {
            capacity: r.capacity.unwrap_or(r.amount),
            amount: r.amount,
            name: r.name,
        })
        .collect();

    let mut modules: Vec<ModuleTemplate> = Vec::new();
    for raw_module in raw.modules {
        let Some(module_name) = raw_module.module_name else {
            log::warn!("{}: skipping module without a module_name", name);
            continue;
        };
        let Some(kind) = ComponentKind::from_module_name(&module_name) else {
            log::warn!("{}: unknown module {:?}", name, module_name);
            continue;
        };
        if modules.iter().any(|m| m.kind == kind) {
            log::warn!("{}: duplicate module {}, keeping the first", name, module_name);
            continue;
        }
        let quality = match (&raw_module.quality, numeric(&raw_module.quality)) {
            (Value::Null, _) => DEFAULT_QUALITY,
            (_, Some(q)) if q.is_finite() => q.clamp(0.0, 1.0) as f32,
            (bad, _) => {
                log::warn!("{}: bad quality {} for {}, using default", name, bad, module_name);
                DEFAULT_QUALITY
            }
        };
        modules.push(ModuleTemplate {
            kind,
            quality,
            tuning: ComponentTuning::with_overrides(kind, &raw_module.overrides),
        });
    }

    Some(PartTemplate {
        title: raw.title.unwrap_or_else(|| name.clone()),
        name,
        base_cost,
        capabilities,
        resources,
        modules,
    })
}
