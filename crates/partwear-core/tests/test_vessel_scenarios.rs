//! End-to-end vessel scenarios.
//!
//! Exercises: loadout → attach → fly → fail → notify → repair
//!
//! Failure chances are forced to 1.0 where a scenario needs a failure, so
//! every test is deterministic under its seed.

use partwear_core::prelude::*;
use partwear_core::systems::FailureEvent;
use partwear_logic::reliability::ReliabilityState;

const LOADOUT: &str = r#"{ "parts": [
    { "part_name": "liquidEngine", "title": "LV-T30", "base_cost": 1000,
      "capabilities": ["Engine", "Gimbal"],
      "modules": [ { "module_name": "ModuleReliabilityIgnitor" },
                   { "module_name": "ModuleReliabilityCooling" },
                   { "module_name": "ModuleReliabilityGimbal" } ] },
    { "part_name": "fuelTank", "title": "FL-T400", "base_cost": 500,
      "resources": [ { "name": "ElectricCharge", "amount": 50 },
                     { "name": "LiquidFuel", "amount": 180 } ],
      "modules": [ { "module_name": "ModuleReliabilityTank" } ] },
    { "part_name": "probeCore", "title": "Stayputnik",
      "modules": [ { "module_name": "ModuleReliabilityAltimeter" } ] },
    { "part_name": "spotLight", "title": "Illuminator", "capabilities": ["Light"],
      "modules": [ { "module_name": "ModuleReliabilityLight" } ] }
] }"#;

// ── Helpers ────────────────────────────────────────────────────────────

fn loadout() -> Loadout {
    Loadout::from_json(LOADOUT).unwrap()
}

fn vessel(seed: u64) -> VesselSimulation {
    VesselSimulation::new(Settings::default(), seed)
}

fn force_failures(sim: &mut VesselSimulation, module: hecs::Entity) {
    let mut m = sim.world.get::<&mut ReliabilityModule>(module).unwrap();
    m.tuning.chance_perfect = 1.0;
    m.tuning.chance_terrible = 1.0;
}

fn set_state(sim: &mut VesselSimulation, module: hecs::Entity, f: impl FnOnce(&mut ReliabilityState)) {
    let mut m = sim.world.get::<&mut ReliabilityModule>(module).unwrap();
    f(&mut m.state);
}

fn full_throttle(engine: PartId) -> VesselConditions {
    let mut conditions = VesselConditions::default();
    conditions.set_part(
        engine,
        PartConditions {
            throttle: 1.0,
            engine_ignited: true,
            staged: true,
            heat_production: 400.0,
            ..Default::default()
        },
    );
    conditions
}

fn run(sim: &mut VesselSimulation, seconds: u32, conditions: &VesselConditions) -> Vec<FailureEvent> {
    let mut failures = Vec::new();
    for _ in 0..seconds {
        failures.extend(sim.update(1.0, conditions).failures);
    }
    failures
}

// ── Engine ─────────────────────────────────────────────────────────────

#[test]
fn test_idle_engine_does_not_wear() {
    let mut sim = vessel(1);
    let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
    run(&mut sim, 3600, &VesselConditions::default());

    for module in sim.modules_on(engine) {
        let state = sim.state(module).unwrap();
        assert_eq!(state.reliability, 1.0);
        assert_eq!(state.time_since_check, 0.0);
    }
}

#[test]
fn test_running_engine_wears() {
    let mut sim = vessel(1);
    let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
    let cooling = sim.module_of(engine, ComponentKind::Cooling).unwrap();
    run(&mut sim, 600, &full_throttle(engine));
    assert!(sim.state(cooling).unwrap().reliability < 1.0);
}

#[test]
fn test_ignition_failure_notice_and_repair() {
    let mut sim = vessel(2);
    let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
    let ignitor = sim.module_of(engine, ComponentKind::Ignitor).unwrap();
    force_failures(&mut sim, ignitor);

    let failures = run(&mut sim, 1, &full_throttle(engine));
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].failure, FailureKind::Burnt);

    let notices = sim.notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "FAILURE: LV-T30's ignition coil has burnt out!");
    assert!(notices[0].halt_time_warp);
    assert!(sim.part_manager(engine).unwrap().any_failed);

    let mut pack = Stockpile::with(REPAIR_RESOURCE, 60);
    let mut repairs = 0;
    while !sim.repair(ignitor, &mut pack, 0).unwrap().completed {
        repairs += 1;
    }
    assert_eq!(repairs, 4);
    assert_eq!(pack.amount(REPAIR_RESOURCE), 10);
    assert_eq!(sim.status(ignitor).unwrap().label, None);

    // Throttle never dropped, so there is no new ignition to roll
    let failures = run(&mut sim, 2, &full_throttle(engine));
    assert!(failures.is_empty());
    let manager = sim.part_manager(engine).unwrap();
    assert!(!manager.any_failed);
    assert!(!manager.highlighted);
}

#[test]
fn test_failed_cooling_overheats() {
    let mut sim = vessel(3);
    let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
    let cooling = sim.module_of(engine, ComponentKind::Cooling).unwrap();
    set_state(&mut sim, cooling, |s| {
        s.set_failure(FailureKind::CoolingLoss, 50);
    });
    let report = sim.update(0.5, &full_throttle(engine));
    assert!((report.heat[&engine] - 200.0).abs() < 1e-9);
    assert_eq!(sim.status(cooling).unwrap().label.as_deref(), Some("Cooling Failure"));
}

// ── Tanks ──────────────────────────────────────────────────────────────

#[test]
fn test_tank_leak_drains_until_taped() {
    let mut sim = vessel(4);
    let tank = sim.attach_part(loadout().part("fuelTank").unwrap());
    let module = sim.module_of(tank, ComponentKind::Tank).unwrap();
    force_failures(&mut sim, module);
    let idle = VesselConditions::default();

    let failures = run(&mut sim, 10, &idle);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].detail.as_deref(), Some("LiquidFuel"));
    assert_eq!(
        sim.notices.drain()[0].message,
        "FAILURE: FL-T400 has begun leaking LiquidFuel!"
    );

    let at_failure = sim.stored_amount(tank, "LiquidFuel");
    run(&mut sim, 3, &idle);
    let leaked = sim.stored_amount(tank, "LiquidFuel");
    assert!(leaked < at_failure);
    assert_eq!(sim.stored_amount(tank, "ElectricCharge"), 50.0);

    sim.duct_tape(module).unwrap();
    run(&mut sim, 3, &idle);
    assert_eq!(sim.stored_amount(tank, "LiquidFuel"), leaked);
    assert!(sim.state(module).unwrap().is_operating());
}

// ── Lights ─────────────────────────────────────────────────────────────

#[test]
fn test_flickering_light_busts_then_replaced() {
    let mut sim = vessel(5);
    let light = sim.attach_part(loadout().part("spotLight").unwrap());
    let module = sim.module_of(light, ComponentKind::Light).unwrap();
    force_failures(&mut sim, module);

    let mut conditions = VesselConditions::default();
    conditions.set_part(
        light,
        PartConditions {
            light_on: true,
            ..Default::default()
        },
    );

    let failures = run(&mut sim, 10, &conditions);
    assert_eq!(failures[0].failure, FailureKind::Flickering);
    assert_eq!(sim.state(module).unwrap().repair_progress, 5);

    let failures = run(&mut sim, 40, &conditions);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].failure, FailureKind::Busted);
    assert_eq!(sim.notices.len(), 2);

    let mut pack = Stockpile::with(REPAIR_RESOURCE, 100);
    assert_eq!(sim.actions_for(module, 0), vec![ActionKind::ReplaceBulb]);
    while !sim.replace_bulb(module, &mut pack, 0).unwrap().completed {}
    assert_eq!(pack.amount(REPAIR_RESOURCE), 50);
    assert_eq!(sim.state(module).unwrap().reliability, 1.0);
}

// ── Instruments ────────────────────────────────────────────────────────

#[test]
fn test_altimeters_fail_as_a_fleet() {
    let mut sim = vessel(6);
    let loadout = loadout();
    let a = sim.attach_part(loadout.part("probeCore").unwrap());
    let b = sim.attach_part(loadout.part("probeCore").unwrap());
    let alt_a = sim.module_of(a, ComponentKind::Altimeter).unwrap();
    let alt_b = sim.module_of(b, ComponentKind::Altimeter).unwrap();

    let conditions = VesselConditions {
        true_altitude: 8_000.0,
        ..Default::default()
    };

    set_state(&mut sim, alt_a, |s| {
        s.set_failure(FailureKind::Stuck, 50);
    });
    let readings = sim.update(1.0, &conditions).readings;
    assert_eq!(readings.altitude, 8_000.0);

    set_state(&mut sim, alt_b, |s| {
        s.set_failure(FailureKind::Stuck, 50);
    });
    let first = sim.update(1.0, &conditions).readings;
    let second = sim.update(1.0, &conditions).readings;
    assert!(first.altimeters_failed);
    assert_eq!(first.altitude, second.altitude);

    let mut pack = Stockpile::with(REPAIR_RESOURCE, 100);
    while !sim.repair(alt_b, &mut pack, 0).unwrap().completed {}
    let readings = sim.update(1.0, &conditions).readings;
    assert!(!readings.altimeters_failed);
    assert_eq!(readings.altitude, 8_000.0);
}

// ── Vessel ─────────────────────────────────────────────────────────────

#[test]
fn test_same_seed_same_history() {
    let history = |seed: u64| {
        let mut sim = vessel(seed);
        let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
        let ignitor = sim.module_of(engine, ComponentKind::Ignitor).unwrap();
        {
            let mut m = sim.world.get::<&mut ReliabilityModule>(ignitor).unwrap();
            m.tuning.chance_perfect = 0.3;
        }
        let on = full_throttle(engine);
        let off = VesselConditions::default();
        let mut failures = Vec::new();
        for frame in 0..200 {
            let conditions = if frame % 2 == 0 { &on } else { &off };
            failures.extend(sim.update(1.0, conditions).failures);
            if sim.state(ignitor).unwrap().is_failed() {
                let mut pack = Stockpile::with(REPAIR_RESOURCE, 100);
                while !sim.repair(ignitor, &mut pack, 0).unwrap().completed {}
            }
        }
        (failures, sim.state(ignitor).unwrap())
    };

    let (first, first_state) = history(11);
    let (second, second_state) = history(11);
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first_state, second_state);
}

#[test]
fn test_part_cost_follows_quality() {
    let mut sim = vessel(7);
    let engine = sim.attach_part(loadout().part("liquidEngine").unwrap());
    assert_eq!(sim.part_cost(engine), Some(1000.0));

    let ignitor = sim.module_of(engine, ComponentKind::Ignitor).unwrap();
    sim.set_quality(ignitor, 0.0).unwrap();
    assert_eq!(sim.part_cost(engine), Some(833.0));
    assert!((sim.state(ignitor).unwrap().reliability - 0.8).abs() < 1e-9);
}

#[test]
fn test_save_and_resume() {
    let mut sim = vessel(8);
    let tank = sim.attach_part(loadout().part("fuelTank").unwrap());
    run(&mut sim, 50, &VesselConditions::default());

    let mut buffer = Vec::new();
    sim.save(&mut buffer).unwrap();
    let mut resumed = VesselSimulation::default();
    resumed.load(&buffer[..]).unwrap();

    let module = resumed.module_of(tank, ComponentKind::Tank).unwrap();
    let original = sim.module_of(tank, ComponentKind::Tank).unwrap();
    assert_eq!(resumed.state(module), sim.state(original));
    assert_eq!(resumed.stored_amount(tank, "LiquidFuel"), sim.stored_amount(tank, "LiquidFuel"));
    resumed.update(1.0, &VesselConditions::default());
    assert!(resumed.sim_time() > sim.sim_time());
}
