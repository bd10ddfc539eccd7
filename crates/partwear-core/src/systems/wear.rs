//! Wear system - periodic drain and failure rolls for every module

use std::collections::HashMap;

use hecs::{Entity, World};
use partwear_logic::decay::{intensity, is_active, OperatingConditions};
use partwear_logic::failure::{chance_to_fail, check_failure, max_gees, RollScaling};
use partwear_logic::reliability::{ComponentKind, FailureKind};
use partwear_logic::repair::{Flicker, Leak};
use partwear_logic::tuning::Settings;
use rand::Rng;

use crate::components::{Degradation, Part, PartId, PartResources, ReliabilityModule, Sensors};
use crate::conditions::VesselConditions;

/// A module that entered a failure this tick
#[derive(Debug, Clone, PartialEq)]
pub struct FailureEvent {
    pub module: Entity,
    pub part: PartId,
    pub component: ComponentKind,
    pub failure: FailureKind,
    /// Leaking resource, for tank failures
    pub detail: Option<String>,
}

/// Advance check timers, drain reliability and roll failures.
///
/// Ignitors roll their starting chance on the ignition edge rather than on
/// the check cadence. Stress rolls for instruments and alternators use the
/// peak g seen since the previous check.
pub fn wear_system(
    world: &mut World,
    conditions: &VesselConditions,
    settings: &Settings,
    rng: &mut impl Rng,
    dt: f32,
) -> Vec<FailureEvent> {
    let leakable = leakable_resources(world);
    let mut events = Vec::new();

    for (entity, (module, sensors, degradation)) in
        world.query_mut::<(&mut ReliabilityModule, &mut Sensors, &mut Degradation)>()
    {
        module.state.clamp();
        if !module.enabled {
            continue;
        }
        let operating = conditions.operating(module.part);
        sensors.peak_g = sensors.peak_g.max(operating.g_force);

        let mut failure = None;
        if module.kind == ComponentKind::Ignitor {
            failure = ignition_roll(module, sensors, &operating, rng);
        }

        if module.kind.is_instrument() && module.state.is_operating() {
            let limit = stress_limit(module);
            module
                .decay_policy(settings.check_interval)
                .apply_stress(&mut module.state, operating.g_force, limit, dt);
        }

        let load = (module.state.is_operating() && is_active(module.kind, &operating))
            .then(|| intensity(module.kind, &operating));
        let checks = module
            .decay_policy(settings.check_interval)
            .tick(&mut module.state, dt, load);

        if checks > 0 {
            for _ in 0..checks {
                if failure.is_some() {
                    break;
                }
                failure = periodic_roll(module, sensors, &operating, rng);
            }
            sensors.peak_g = operating.g_force;
        }

        let Some(kind) = failure else {
            continue;
        };

        let mut detail = None;
        match kind {
            FailureKind::Leaking => {
                let resources = leakable.get(&module.part).map(Vec::as_slice).unwrap_or(&[]);
                match Leak::start(rng, resources, &settings.leak_blacklist, &module.tuning) {
                    Some(leak) => {
                        detail = Some(leak.resource.clone());
                        *degradation = Degradation::Leaking(leak);
                    }
                    None => continue,
                }
            }
            FailureKind::Flickering => {
                *degradation = Degradation::Flickering(Flicker::start(rng, &module.tuning));
            }
            _ => {}
        }

        let requirement = if kind == FailureKind::Flickering {
            module.tuning.partial_repair_requirement
        } else {
            module.tuning.repair_requirement
        };
        module.state.set_failure(kind, requirement);
        log::debug!("module {:?} on part {} failed: {:?}", entity, module.part, kind);

        events.push(FailureEvent {
            module: entity,
            part: module.part,
            component: module.kind,
            failure: kind,
            detail,
        });
    }

    events
}

/// Resource names per part, for choosing what a tank leaks
fn leakable_resources(world: &World) -> HashMap<PartId, Vec<String>> {
    world
        .query::<(&Part, &PartResources)>()
        .iter()
        .map(|(_, (part, resources))| (part.id, resources.names()))
        .collect()
}

fn stress_limit(module: &ReliabilityModule) -> f64 {
    max_gees(
        module.state.reliability,
        module.tuning.max_gees_perfect,
        module.tuning.max_gees_terrible,
    )
}

fn ignition_roll(
    module: &ReliabilityModule,
    sensors: &mut Sensors,
    operating: &OperatingConditions,
    rng: &mut impl Rng,
) -> Option<FailureKind> {
    let throttle = if operating.engine_ignited {
        operating.throttle
    } else {
        0.0
    };
    let ignited_now = sensors.last_throttle <= 0.0 && throttle > 0.0;
    sensors.last_throttle = throttle;
    if !ignited_now || module.state.is_failed() {
        return None;
    }
    let chance = chance_to_fail(
        module.state.reliability,
        module.tuning.chance_perfect,
        module.tuning.chance_terrible,
    );
    roll_kind(module, chance, rng)
}

fn periodic_roll(
    module: &ReliabilityModule,
    sensors: &Sensors,
    operating: &OperatingConditions,
    rng: &mut impl Rng,
) -> Option<FailureKind> {
    let tuning = &module.tuning;
    let running = chance_to_fail(
        module.state.reliability,
        tuning.chance_perfect,
        tuning.chance_terrible,
    );
    let stressed = chance_to_fail(
        module.state.reliability,
        tuning.stressed_chance_perfect,
        tuning.stressed_chance_terrible,
    );
    let over_limit = sensors.peak_g > stress_limit(module);
    let throttle = operating.throttle.clamp(0.0, 1.0) as f64;

    match module.kind {
        ComponentKind::Cooling if operating.throttle > 0.0 => roll_kind(module, running, rng),
        ComponentKind::Gimbal | ComponentKind::Tank | ComponentKind::Light => {
            roll_kind(module, running, rng)
        }
        ComponentKind::Alternator => {
            let idle = roll_kind(module, running * throttle, rng);
            if idle.is_some() || !over_limit {
                idle
            } else {
                roll_kind(module, stressed, rng)
            }
        }
        ComponentKind::Altimeter | ComponentKind::ThrustGauge if over_limit => {
            roll_kind(module, stressed, rng)
        }
        _ => None,
    }
}

/// Roll `chance` without entering the failure; the caller finishes the
/// transition once side effects (leak selection) are known.
fn roll_kind(module: &ReliabilityModule, chance: f64, rng: &mut impl Rng) -> Option<FailureKind> {
    let mut trial = module.state.clone();
    check_failure(rng, &mut trial, chance, RollScaling::PerCheck, module.kind.failure_kinds(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::StoredResource;
    use crate::conditions::PartConditions;
    use partwear_logic::tuning::ComponentTuning;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn_module(world: &mut World, part: PartId, kind: ComponentKind) -> Entity {
        let module = ReliabilityModule::new(part, kind, 0.75, ComponentTuning::defaults_for(kind));
        world.spawn((module, Sensors::default(), Degradation::None))
    }

    fn firing(part: PartId) -> VesselConditions {
        let mut conditions = VesselConditions::default();
        conditions.set_part(
            part,
            PartConditions {
                throttle: 1.0,
                engine_ignited: true,
                staged: true,
                ..Default::default()
            },
        );
        conditions
    }

    #[test]
    fn test_idle_modules_do_not_wear() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(1), ComponentKind::Gimbal);
        for _ in 0..100 {
            wear_system(&mut world, &VesselConditions::default(), &Settings::default(), &mut rng, 1.0);
        }
        let module = world.get::<&ReliabilityModule>(e).unwrap();
        assert_eq!(module.state.reliability, 1.0);
    }

    #[test]
    fn test_running_engine_wears() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(1), ComponentKind::Cooling);
        let conditions = firing(PartId(1));
        for _ in 0..100 {
            wear_system(&mut world, &conditions, &Settings::default(), &mut rng, 1.0);
        }
        let module = world.get::<&ReliabilityModule>(e).unwrap();
        assert!(module.state.reliability < 1.0);
    }

    #[test]
    fn test_ignition_edge_rolls_once() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(1), ComponentKind::Ignitor);
        {
            let mut module = world.get::<&mut ReliabilityModule>(e).unwrap();
            module.tuning.chance_perfect = 1.0;
            module.tuning.chance_terrible = 1.0;
        }
        let conditions = firing(PartId(1));
        let events = wear_system(&mut world, &conditions, &Settings::default(), &mut rng, 0.1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].failure, FailureKind::Burnt);
        let events = wear_system(&mut world, &conditions, &Settings::default(), &mut rng, 0.1);
        assert!(events.is_empty());
        let module = world.get::<&ReliabilityModule>(e).unwrap();
        assert_eq!(module.state.repair_progress, 50);
    }

    #[test]
    fn test_tank_leak_picks_part_resource() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        world.spawn((
            Part {
                id: PartId(7),
                name: "fuelTank".to_string(),
                title: "FL-T400".to_string(),
                base_cost: 500.0,
                capabilities: Vec::new(),
                symmetry_group: None,
            },
            PartResources {
                resources: vec![StoredResource {
                    name: "LiquidFuel".to_string(),
                    amount: 180.0,
                    capacity: 180.0,
                }],
            },
        ));
        let e = spawn_module(&mut world, PartId(7), ComponentKind::Tank);
        {
            let mut module = world.get::<&mut ReliabilityModule>(e).unwrap();
            module.tuning.chance_perfect = 1.0;
            module.tuning.chance_terrible = 1.0;
        }
        let events = wear_system(&mut world, &VesselConditions::default(), &Settings::default(), &mut rng, 10.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail.as_deref(), Some("LiquidFuel"));
        let degradation = world.get::<&Degradation>(e).unwrap();
        assert!(matches!(*degradation, Degradation::Leaking(_)));
    }

    #[test]
    fn test_tank_without_leakables_stays_nominal() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(2), ComponentKind::Tank);
        {
            let mut module = world.get::<&mut ReliabilityModule>(e).unwrap();
            module.tuning.chance_perfect = 1.0;
            module.tuning.chance_terrible = 1.0;
        }
        let events = wear_system(&mut world, &VesselConditions::default(), &Settings::default(), &mut rng, 10.0);
        assert!(events.is_empty());
        assert!(world.get::<&ReliabilityModule>(e).unwrap().state.is_operating());
    }

    #[test]
    fn test_instrument_stress_uses_interval_peak() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(1), ComponentKind::Altimeter);
        {
            let mut module = world.get::<&mut ReliabilityModule>(e).unwrap();
            module.tuning.stressed_chance_perfect = 1.0;
            module.tuning.stressed_chance_terrible = 1.0;
        }
        let mut spike = VesselConditions::default();
        spike.g_force = 20.0;
        let calm = VesselConditions::default();

        assert!(wear_system(&mut world, &spike, &Settings::default(), &mut rng, 1.0).is_empty());
        for _ in 0..8 {
            assert!(wear_system(&mut world, &calm, &Settings::default(), &mut rng, 1.0).is_empty());
        }
        let events = wear_system(&mut world, &calm, &Settings::default(), &mut rng, 1.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].failure, FailureKind::Stuck);
    }

    #[test]
    fn test_worn_instruments_fail_sooner_under_load() {
        let mut loaded = VesselConditions::default();
        loaded.g_force = 10.0;

        let mut failures = Vec::new();
        for reliability in [1.0, 0.8, 0.2, 0.0] {
            let mut count = 0;
            for seed in 0..20 {
                let mut world = World::new();
                let mut rng = StdRng::seed_from_u64(seed);
                let e = spawn_module(&mut world, PartId(1), ComponentKind::Altimeter);
                {
                    let mut module = world.get::<&mut ReliabilityModule>(e).unwrap();
                    module.state.reliability = reliability;
                    module.tuning.stressed_chance_perfect = 1.0;
                    module.tuning.stressed_chance_terrible = 1.0;
                }
                for _ in 0..10 {
                    count += wear_system(&mut world, &loaded, &Settings::default(), &mut rng, 1.0).len();
                }
            }
            failures.push(count);
        }

        assert_eq!(failures[0], 0);
        assert_eq!(failures[3], 20);
        assert!(failures.windows(2).all(|w| w[0] <= w[1]), "{:?}", failures);
    }

    #[test]
    fn test_disabled_module_is_inert() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let e = spawn_module(&mut world, PartId(1), ComponentKind::Cooling);
        world.get::<&mut ReliabilityModule>(e).unwrap().enabled = false;
        let conditions = firing(PartId(1));
        for _ in 0..100 {
            wear_system(&mut world, &conditions, &Settings::default(), &mut rng, 1.0);
        }
        assert_eq!(world.get::<&ReliabilityModule>(e).unwrap().state.reliability, 1.0);
    }
}
