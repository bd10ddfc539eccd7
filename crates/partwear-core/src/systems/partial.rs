//! Partial failure system - leaks drain tanks, flickering bulbs bust,
//! failed cooling overheats its engine

use std::collections::HashMap;

use hecs::World;
use partwear_logic::reliability::{ComponentKind, FailureKind};
use partwear_logic::repair::FlickerStep;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::wear::FailureEvent;
use crate::components::{Degradation, Part, PartId, PartResources, ReliabilityModule};
use crate::conditions::VesselConditions;

/// Resource lost to a leak this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakLoss {
    pub part: PartId,
    pub resource: String,
    pub amount: f64,
}

/// Side effects of partial and ongoing failures for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialOutcome {
    /// Flickering bulbs that busted
    pub escalations: Vec<FailureEvent>,
    pub leaks: Vec<LeakLoss>,
    /// Extra heat added to parts whose cooling has failed
    pub heat: HashMap<PartId, f64>,
}

pub fn partial_failure_system(
    world: &mut World,
    conditions: &VesselConditions,
    rng: &mut impl Rng,
    dt: f32,
) -> PartialOutcome {
    let amounts = stored_amounts(world);
    let mut outcome = PartialOutcome::default();

    for (entity, (module, degradation)) in
        world.query_mut::<(&mut ReliabilityModule, &mut Degradation)>()
    {
        match degradation {
            Degradation::Flickering(flicker) => {
                if let FlickerStep::Busted = flicker.tick(rng, dt) {
                    module
                        .state
                        .escalate(FailureKind::Busted, module.tuning.repair_requirement);
                    *degradation = Degradation::None;
                    outcome.escalations.push(FailureEvent {
                        module: entity,
                        part: module.part,
                        component: module.kind,
                        failure: FailureKind::Busted,
                        detail: None,
                    });
                }
            }
            Degradation::Leaking(leak) => {
                let stored = amounts
                    .get(&(module.part, leak.resource.clone()))
                    .copied()
                    .unwrap_or(0.0);
                let amount = leak.loss(
                    stored,
                    module.state.repair_progress,
                    module.tuning.repair_requirement,
                    dt,
                );
                if amount > 0.0 {
                    outcome.leaks.push(LeakLoss {
                        part: module.part,
                        resource: leak.resource.clone(),
                        amount,
                    });
                }
            }
            Degradation::None => {}
        }

        if module.kind == ComponentKind::Cooling && module.state.failure == Some(FailureKind::CoolingLoss) {
            let part = conditions.part(module.part);
            if part.engine_ignited && part.throttle > 0.0 {
                let heat = part.heat_production * part.throttle as f64 * dt as f64;
                *outcome.heat.entry(module.part).or_insert(0.0) += heat;
            }
        }
    }

    apply_leaks(world, &outcome.leaks);
    outcome
}

fn stored_amounts(world: &World) -> HashMap<(PartId, String), f64> {
    let mut amounts = HashMap::new();
    for (_, (part, resources)) in world.query::<(&Part, &PartResources)>().iter() {
        for r in &resources.resources {
            amounts.insert((part.id, r.name.clone()), r.amount);
        }
    }
    amounts
}

fn apply_leaks(world: &mut World, leaks: &[LeakLoss]) {
    if leaks.is_empty() {
        return;
    }
    for (_, (part, resources)) in world.query_mut::<(&Part, &mut PartResources)>() {
        for loss in leaks.iter().filter(|l| l.part == part.id) {
            if let Some(stored) = resources.get_mut(&loss.resource) {
                stored.amount = (stored.amount - loss.amount).max(0.0);
            }
        }
    }
}
