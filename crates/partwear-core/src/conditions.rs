//! Host inputs for one simulation tick.

use std::collections::HashMap;

use partwear_logic::decay::OperatingConditions;
use serde::{Deserialize, Serialize};

use crate::components::PartId;

/// What the host reports about one part this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartConditions {
    pub throttle: f32,
    pub engine_ignited: bool,
    pub staged: bool,
    pub light_on: bool,
    /// Engine heat output at full throttle, used when cooling fails
    pub heat_production: f64,
}

/// Vessel-wide readings plus per-part conditions. Parts that are not
/// listed are treated as idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselConditions {
    pub g_force: f64,
    pub true_altitude: f64,
    pub true_thrust: f64,
    pub parts: HashMap<PartId, PartConditions>,
}

impl VesselConditions {
    pub fn part(&self, id: PartId) -> PartConditions {
        self.parts.get(&id).copied().unwrap_or_default()
    }

    /// Conditions as seen by a module on part `id`
    pub fn operating(&self, id: PartId) -> OperatingConditions {
        let part = self.part(id);
        OperatingConditions {
            throttle: part.throttle,
            g_force: self.g_force,
            engine_ignited: part.engine_ignited,
            staged: part.staged,
            light_on: part.light_on,
        }
    }

    pub fn set_part(&mut self, id: PartId, conditions: PartConditions) -> &mut Self {
        self.parts.insert(id, conditions);
        self
    }
}
