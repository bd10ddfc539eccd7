//! Part components: identity, capabilities, stored resources, manager.

use partwear_logic::fleet::InaccuracyDriver;
use partwear_logic::reliability::Capability;
use serde::{Deserialize, Serialize};

/// Stable part identifier. Survives save/load, unlike `hecs::Entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Part component - one physical part on the vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    /// Template name, e.g. "liquidEngine2.v2"
    pub name: String,
    /// Player-facing title used in failure messages
    pub title: String,
    pub base_cost: f64,
    pub capabilities: Vec<Capability>,
    /// Parts placed in symmetry share a group
    pub symmetry_group: Option<u32>,
}

impl Part {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// One stored resource on a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    pub name: String,
    pub amount: f64,
    pub capacity: f64,
}

/// Resources held by a part (tanks)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartResources {
    pub resources: Vec<StoredResource>,
}

impl PartResources {
    pub fn names(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&StoredResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StoredResource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    pub fn amount(&self, name: &str) -> f64 {
        self.get(name).map(|r| r.amount).unwrap_or(0.0)
    }
}

/// Per-part reliability summary, present on every part that carries
/// reliability modules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartManager {
    pub average_reliability: f64,
    /// Average as shown to the player, offset by monitor inaccuracy
    pub displayed_reliability: f64,
    pub any_failed: bool,
    /// Failed parts are highlighted when the setting is on
    pub highlighted: bool,
    pub inaccuracy: InaccuracyDriver,
}
