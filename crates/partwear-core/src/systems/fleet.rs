//! Fleet system - vessel-wide instrument readouts and part summaries

use std::collections::HashMap;

use hecs::{Entity, World};
use partwear_logic::fleet::{AltimeterReadout, FleetSummary, ThrustReadout};
use partwear_logic::reliability::{ComponentKind, ReliabilityState};
use partwear_logic::tuning::Settings;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Part, PartId, PartManager, ReliabilityModule};
use crate::conditions::VesselConditions;

/// What the vessel's instruments show this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReadings {
    pub altitude: f64,
    pub thrust: f64,
    /// Every altimeter is failed; `altitude` is fabricated
    pub altimeters_failed: bool,
    /// Every thrust gauge is failed; `thrust` is frozen
    pub thrust_frozen: bool,
    /// Mean reliability of part monitors, 1.0 without any
    pub monitor_reliability: f64,
}

/// Instrument membership and latched readouts (singleton, stored in engine)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetState {
    pub altimeter: AltimeterReadout,
    pub thrust: ThrustReadout,
    pub readings: InstrumentReadings,
    #[serde(skip)]
    members: Members,
}

#[derive(Debug, Clone, Default)]
struct Members {
    generation: Option<u64>,
    altimeters: Vec<Entity>,
    thrust_gauges: Vec<Entity>,
    monitors: Vec<Entity>,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget cached membership; the next update recompiles it
    pub fn invalidate(&mut self) {
        self.members.generation = None;
    }

    pub fn member_count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Altimeter => self.members.altimeters.len(),
            ComponentKind::ThrustGauge => self.members.thrust_gauges.len(),
            ComponentKind::Monitor => self.members.monitors.len(),
            _ => 0,
        }
    }

    fn recompile(&mut self, world: &World, generation: u64) {
        let members = &mut self.members;
        members.altimeters.clear();
        members.thrust_gauges.clear();
        members.monitors.clear();
        for (entity, module) in world.query::<&ReliabilityModule>().iter() {
            match module.kind {
                ComponentKind::Altimeter => members.altimeters.push(entity),
                ComponentKind::ThrustGauge => members.thrust_gauges.push(entity),
                ComponentKind::Monitor => members.monitors.push(entity),
                _ => {}
            }
        }
        members.generation = Some(generation);
        log::debug!(
            "instrument membership: {} altimeters, {} thrust gauges, {} monitors",
            members.altimeters.len(),
            members.thrust_gauges.len(),
            members.monitors.len()
        );
    }
}

fn summarize(world: &World, entities: &[Entity]) -> FleetSummary {
    let states: Vec<ReliabilityState> = entities
        .iter()
        .filter_map(|e| world.get::<&ReliabilityModule>(*e).ok().map(|m| m.state.clone()))
        .collect();
    FleetSummary::from_states(&states)
}

/// Update instrument readouts. Membership is recompiled only when the
/// attached-module `generation` changes.
pub fn fleet_system(
    world: &World,
    fleet: &mut FleetState,
    generation: u64,
    conditions: &VesselConditions,
    rng: &mut impl Rng,
) -> InstrumentReadings {
    if fleet.members.generation != Some(generation) {
        fleet.recompile(world, generation);
    }

    let altimeters = summarize(world, &fleet.members.altimeters);
    let gauges = summarize(world, &fleet.members.thrust_gauges);
    let monitors = summarize(world, &fleet.members.monitors);

    let readings = InstrumentReadings {
        altitude: fleet
            .altimeter
            .update(rng, altimeters.all_failed(), conditions.true_altitude),
        thrust: fleet.thrust.update(gauges.all_failed(), conditions.true_thrust),
        altimeters_failed: altimeters.all_failed(),
        thrust_frozen: gauges.all_failed(),
        monitor_reliability: if monitors.count > 0 {
            monitors.mean_reliability
        } else {
            1.0
        },
    };
    fleet.readings = readings;
    readings
}

/// Refresh every part manager: average reliability, failure highlight and
/// the monitor-driven display inaccuracy.
pub fn part_manager_system(
    world: &mut World,
    settings: &Settings,
    monitor_reliability: f64,
    rng: &mut impl Rng,
    dt: f32,
) {
    let mut per_part: HashMap<PartId, Vec<ReliabilityState>> = HashMap::new();
    for (_, module) in world.query::<&ReliabilityModule>().iter() {
        per_part.entry(module.part).or_default().push(module.state.clone());
    }

    for (_, (part, manager)) in world.query_mut::<(&Part, &mut PartManager)>() {
        let summary = per_part
            .get(&part.id)
            .map(FleetSummary::from_states)
            .unwrap_or_default();
        manager.average_reliability = summary.mean_reliability;
        manager.any_failed = summary.any_failed();
        manager.highlighted = settings.highlight_failed_parts && manager.any_failed;
        manager.inaccuracy.tick(rng, dt, monitor_reliability);
        manager.displayed_reliability = manager.inaccuracy.displayed(summary.mean_reliability);
    }
}
