//! PartWear Headless Simulation Harness
//!
//! Sweeps the reliability logic and the vessel engine and prints a
//! pass/fail report. Runs entirely in-process with seeded randomness.
//!
//! Usage:
//!   cargo run -p partwear-simtest
//!   cargo run -p partwear-simtest -- --verbose
//!   cargo run -p partwear-simtest -- --json

use partwear_core::prelude::*;
use partwear_logic::curve::{evaluate, Point, ReliabilityCurve};
use partwear_logic::decay::{current_drain_rate, CHECKS_PER_DAY};
use partwear_logic::failure::{chance_to_fail, roll_decouple, roll_failure, DecoupleOutcome, RollScaling};
use partwear_logic::reliability::ReliabilityState;
use partwear_logic::repair::{apply_repair_resource, kick, KickOutcome, Restoration};
use partwear_logic::schema::{from_fields, to_fields};
use partwear_logic::tuning::ComponentTuning;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

// ── Vessel loadout used by the engine sweeps ────────────────────────────
const LOADOUT_JSON: &str = r#"{ "parts": [
    { "part_name": "liquidEngine", "title": "LV-T30", "base_cost": 1100,
      "capabilities": ["Engine", "Gimbal", "Alternator"],
      "modules": [ { "module_name": "ModuleReliabilityIgnitor" },
                   { "module_name": "ModuleReliabilityCooling" },
                   { "module_name": "ModuleReliabilityGimbal" },
                   { "module_name": "ModuleReliabilityAlternator" } ] },
    { "part_name": "fuelTank", "title": "FL-T400", "base_cost": 500,
      "resources": [ { "name": "LiquidFuel", "amount": 180 }, { "name": "Oxidizer", "amount": 220 } ],
      "modules": [ { "module_name": "ModuleReliabilityTank" } ] },
    { "part_name": "probeCore", "title": "Stayputnik",
      "modules": [ { "module_name": "ModuleReliabilityAltimeter" },
                   { "module_name": "ModuleReliabilityThrustGauge" },
                   { "module_name": "ModuleReliabilityMonitor" } ] }
] }"#;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    if !json {
        println!("=== PartWear Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Lifetime curve and drain
    results.extend(validate_curve(json, verbose));

    // 2. Failure chances and rolls
    results.extend(validate_failure_rolls(json, verbose));

    // 3. Repair, kick and staging odds
    results.extend(validate_repair(json, verbose));

    // 4. Settings, tuning and persisted fields
    results.extend(validate_config(json, verbose));

    // 5. Vessel wear sweep across qualities
    results.extend(validate_vessel_wear(json, verbose));

    // 6. Instruments and save/load
    results.extend(validate_instruments_and_saves(json, verbose));

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("failed to encode report: {}", e),
        }
    } else {
        // ── Summary ──
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed, total, failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn section(json: bool, title: &str) {
    if !json {
        println!("--- {} ---", title);
    }
}

fn loadout() -> Result<Loadout, String> {
    Loadout::from_json(LOADOUT_JSON).map_err(|e| e.to_string())
}

// ── 1. Curve ────────────────────────────────────────────────────────────

fn validate_curve(json: bool, verbose: bool) -> Vec<TestResult> {
    section(json, "Lifetime Curve");
    let mut results = Vec::new();
    let curve = ReliabilityCurve::default();

    let points = [
        Point::new(0.0, 43.0),
        Point::new(0.75, 43.0),
        Point::new(0.25, 425.0),
        Point::new(1.0, 425.0),
    ];
    let start = evaluate(&points, 0.0);
    let end = evaluate(&points, 1.0);
    results.push(TestResult {
        name: "curve_endpoints".into(),
        passed: start == points[0] && end == points[3],
        detail: format!("t=0 → {:?}, t=1 → {:?}", start, end),
    });

    // Lifetime never shrinks as quality rises
    let samples: Vec<f64> = (0..=20).map(|i| curve.lifetime_days(i as f32 / 20.0)).collect();
    let monotone = samples.windows(2).all(|w| w[1] >= w[0] - 1e-9);
    results.push(TestResult {
        name: "curve_monotone".into(),
        passed: monotone,
        detail: format!(
            "lifetime {:.1} → {:.1} days across quality",
            samples[0],
            samples[samples.len() - 1]
        ),
    });

    let days = evaluate(&points, 0.75).y;
    let drain = current_drain_rate(0.75, &curve);
    let expected = 1.0 / (days * CHECKS_PER_DAY);
    results.push(TestResult {
        name: "drain_default_quality".into(),
        passed: (drain - expected).abs() < 1e-15,
        detail: format!("{:.3e} per check ({:.1} day lifetime)", drain, days),
    });

    if verbose && !json {
        println!("  Lifetime by quality:");
        for q in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
            println!("    q={:.2}: {:6.1} days", q, curve.lifetime_days(q));
        }
    }

    results
}

// ── 2. Failure Rolls ────────────────────────────────────────────────────

fn validate_failure_rolls(json: bool, verbose: bool) -> Vec<TestResult> {
    section(json, "Failure Rolls");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "chance_at_zero_reliability".into(),
        passed: (chance_to_fail(0.0, 0.0001, 0.01) - 0.01).abs() < 1e-15,
        detail: format!("{}", chance_to_fail(0.0, 0.0001, 0.01)),
    });

    let monotone = (0..100).all(|i| {
        let r = i as f64 / 100.0;
        chance_to_fail(r, 0.0001, 0.01) >= chance_to_fail(r + 0.01, 0.0001, 0.01)
    });
    results.push(TestResult {
        name: "chance_monotone".into(),
        passed: monotone,
        detail: "failure chance never rises with reliability".into(),
    });

    // Ignition rate at full reliability should match the starting chance
    let tuning = ComponentTuning::defaults_for(ComponentKind::Ignitor);
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 100_000;
    let failures = (0..trials)
        .filter(|_| roll_failure(&mut rng, tuning.chance_perfect, RollScaling::PerCheck))
        .count();
    let rate = failures as f64 / trials as f64;
    results.push(TestResult {
        name: "ignition_rate".into(),
        passed: (rate - tuning.chance_perfect).abs() < 0.002,
        detail: format!("{:.4} observed vs {:.4} expected", rate, tuning.chance_perfect),
    });

    // Decoupler odds fall with quality
    let tuning = ComponentTuning::defaults_for(ComponentKind::Decoupler);
    let mut misfire_rates = Vec::new();
    for quality in [0.25f32, 0.5, 0.75, 1.0] {
        let misfires = (0..20_000)
            .filter(|_| {
                roll_decouple(&mut rng, quality, tuning.explosion_chance, tuning.misfire_chance)
                    != DecoupleOutcome::Decoupled
            })
            .count();
        misfire_rates.push((quality, misfires as f64 / 20_000.0));
    }
    let falling = misfire_rates.windows(2).all(|w| w[1].1 <= w[0].1 + 0.01);
    results.push(TestResult {
        name: "decoupler_quality_scaling".into(),
        passed: falling,
        detail: misfire_rates
            .iter()
            .map(|(q, r)| format!("q={:.2}:{:.3}", q, r))
            .collect::<Vec<_>>()
            .join(" "),
    });

    if verbose && !json {
        println!("  Failed staging rate by quality: {:?}", misfire_rates);
    }

    results
}

// ── 3. Repair ───────────────────────────────────────────────────────────

fn validate_repair(json: bool, _verbose: bool) -> Vec<TestResult> {
    section(json, "Repair");
    let mut results = Vec::new();

    let mut state = ReliabilityState::default();
    state.reliability = 0.4;
    state.set_failure(FailureKind::Burnt, 50);
    let first = apply_repair_resource(&mut state, 25, Restoration::Bonus(0.2));
    let after_first = state.is_failed();
    let second = apply_repair_resource(&mut state, 25, Restoration::Bonus(0.2));
    results.push(TestResult {
        name: "repair_half_twice".into(),
        passed: first == 25 && second == 25 && after_first && state.is_operating(),
        detail: format!("reliability {:.2} after repair", state.reliability),
    });

    let mut state = ReliabilityState::default();
    state.set_failure(FailureKind::Burnt, 50);
    let consumed = apply_repair_resource(&mut state, 500, Restoration::Bonus(0.2));
    results.push(TestResult {
        name: "repair_surplus_single_call".into(),
        passed: consumed == 50 && state.is_operating(),
        detail: format!("{} of 500 units consumed", consumed),
    });

    // Kick odds
    let tuning = ComponentTuning::defaults_for(ComponentKind::Ignitor);
    let mut rng = StdRng::seed_from_u64(7);
    let (mut destroyed, mut fixed) = (0usize, 0usize);
    let trials = 50_000;
    for _ in 0..trials {
        let mut state = ReliabilityState::default();
        state.set_failure(FailureKind::Burnt, 50);
        match kick(&mut rng, ComponentKind::Ignitor, &mut state, &tuning) {
            KickOutcome::Destroyed => destroyed += 1,
            KickOutcome::Fixed => fixed += 1,
            _ => {}
        }
    }
    let destroy_rate = destroyed as f64 / trials as f64;
    let fix_rate = fixed as f64 / trials as f64;
    results.push(TestResult {
        name: "kick_odds".into(),
        passed: (destroy_rate - tuning.kick_catastrophe_chance).abs() < 0.005
            && (fix_rate - tuning.kick_fix_chance).abs() < 0.01,
        detail: format!("destroyed {:.3}, fixed {:.3}", destroy_rate, fix_rate),
    });

    results
}

// ── 4. Config ───────────────────────────────────────────────────────────

fn validate_config(json: bool, _verbose: bool) -> Vec<TestResult> {
    section(json, "Configuration");
    let mut results = Vec::new();

    let settings = Settings::default();
    let round_trip = settings
        .to_json()
        .ok()
        .and_then(|text| Settings::from_json(&text).ok());
    results.push(TestResult {
        name: "settings_round_trip".into(),
        passed: round_trip.as_ref() == Some(&settings),
        detail: format!("check interval {}s", settings.check_interval),
    });

    let partial = Settings::from_json(r#"{ "repair_batch": 25 }"#);
    results.push(TestResult {
        name: "settings_partial_document".into(),
        passed: matches!(&partial, Ok(s) if s.repair_batch == 25 && s.maintenance_batch == 2),
        detail: "missing keys take defaults".into(),
    });

    let mut state = ReliabilityState::new(0.3);
    state.reliability = 0.42;
    state.set_failure(FailureKind::Leaking, 17);
    let fields = to_fields(&state);
    let restored = from_fields(fields.iter().map(|(k, v)| (*k, v.as_str())));
    results.push(TestResult {
        name: "fields_round_trip".into(),
        passed: restored == state,
        detail: format!("{} persisted fields", fields.len()),
    });

    match loadout() {
        Ok(loadout) => {
            let modules: usize = loadout.parts.iter().map(|p| p.modules.len()).sum();
            results.push(TestResult {
                name: "loadout_parse".into(),
                passed: loadout.parts.len() == 3 && modules == 8,
                detail: format!("{} parts, {} modules", loadout.parts.len(), modules),
            });
        }
        Err(e) => results.push(TestResult {
            name: "loadout_parse".into(),
            passed: false,
            detail: e,
        }),
    }

    results
}

// ── 5. Vessel Wear ──────────────────────────────────────────────────────

struct WearSample {
    quality: f32,
    mean_reliability: f64,
    failures: usize,
}

fn fly(loadout: &Loadout, quality: f32, hours: u32, seed: u64) -> Option<WearSample> {
    let mut sim = VesselSimulation::new(Settings::default(), seed);
    let mut conditions = VesselConditions {
        g_force: 1.5,
        true_altitude: 20_000.0,
        true_thrust: 215.0,
        ..Default::default()
    };
    for _ in 0..4 {
        let engine = sim.attach_part(loadout.part("liquidEngine")?);
        sim.attach_part(loadout.part("fuelTank")?);
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
    }
    let modules: Vec<hecs::Entity> = sim
        .part_ids()
        .into_iter()
        .flat_map(|id| sim.modules_on(id))
        .collect();
    for module in &modules {
        let _ = sim.set_quality(*module, quality);
    }

    let mut failures = 0;
    for _ in 0..hours * 60 {
        failures += sim.update(60.0, &conditions).failures.len();
    }
    let states: Vec<ReliabilityState> = modules.iter().filter_map(|m| sim.state(*m)).collect();
    let mean_reliability = partwear_logic::fleet::mean_reliability(&states).unwrap_or(0.0);
    Some(WearSample {
        quality,
        mean_reliability,
        failures,
    })
}

fn validate_vessel_wear(json: bool, verbose: bool) -> Vec<TestResult> {
    section(json, "Vessel Wear");
    let mut results = Vec::new();

    let loadout = match loadout() {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "vessel_wear".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };

    let samples: Vec<WearSample> = [0.1f32, 0.5, 0.75, 1.0]
        .iter()
        .filter_map(|q| fly(&loadout, *q, 6, 1234))
        .collect();

    results.push(TestResult {
        name: "vessel_wear_runs".into(),
        passed: samples.len() == 4,
        detail: format!("{} quality levels flown for 6 hours", samples.len()),
    });

    let ordered = samples
        .windows(2)
        .all(|w| w[1].mean_reliability >= w[0].mean_reliability);
    results.push(TestResult {
        name: "vessel_wear_quality_order".into(),
        passed: ordered,
        detail: samples
            .iter()
            .map(|s| format!("q={:.2}:{:.4}", s.quality, s.mean_reliability))
            .collect::<Vec<_>>()
            .join(" "),
    });

    let in_range = samples
        .iter()
        .all(|s| (0.0..=1.0).contains(&s.mean_reliability));
    results.push(TestResult {
        name: "vessel_wear_bounds".into(),
        passed: in_range,
        detail: "reliability stays within [0, 1]".into(),
    });

    if verbose && !json {
        println!("  Six-hour burn, 4 engines + 4 tanks:");
        for s in &samples {
            println!(
                "    q={:.2}: mean reliability {:.4}, {} failures",
                s.quality, s.mean_reliability, s.failures
            );
        }
    }

    results
}

// ── 6. Instruments & Saves ──────────────────────────────────────────────

fn validate_instruments_and_saves(json: bool, _verbose: bool) -> Vec<TestResult> {
    section(json, "Instruments & Saves");
    let mut results = Vec::new();

    let loadout = match loadout() {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "instruments".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };
    let Some(probe) = loadout.part("probeCore") else {
        results.push(TestResult {
            name: "instruments".into(),
            passed: false,
            detail: "probeCore missing from loadout".into(),
        });
        return results;
    };

    let mut sim = VesselSimulation::new(Settings::default(), 99);
    let core = sim.attach_part(probe);
    let conditions = VesselConditions {
        true_altitude: 4_500.0,
        true_thrust: 60.0,
        ..Default::default()
    };
    let healthy = sim.update(0.1, &conditions).readings;

    for kind in [ComponentKind::Altimeter, ComponentKind::ThrustGauge] {
        if let Some(module) = sim.module_of(core, kind) {
            if let Ok(mut m) = sim.world.get::<&mut ReliabilityModule>(module) {
                m.state.set_failure(FailureKind::Stuck, 50);
            }
        }
    }
    let mut moving = conditions.clone();
    moving.true_altitude = 5_000.0;
    moving.true_thrust = 90.0;
    let failed = sim.update(0.1, &moving).readings;

    results.push(TestResult {
        name: "instruments_healthy".into(),
        passed: healthy.altitude == 4_500.0 && healthy.thrust == 60.0,
        detail: format!("alt {} thrust {}", healthy.altitude, healthy.thrust),
    });
    results.push(TestResult {
        name: "instruments_failed".into(),
        passed: failed.altimeters_failed && failed.thrust_frozen && failed.thrust == 60.0,
        detail: format!("alt {:.0} (false), thrust frozen at {}", failed.altitude, failed.thrust),
    });

    let mut buffer = Vec::new();
    let saved = sim.save(&mut buffer);
    let mut restored = VesselSimulation::default();
    let loaded = saved.is_ok() && restored.load(&buffer[..]).is_ok();
    results.push(TestResult {
        name: "save_load".into(),
        passed: loaded
            && restored.module_count() == sim.module_count()
            && restored.failed_count() == 2,
        detail: format!("{} bytes, {} failed modules restored", buffer.len(), restored.failed_count()),
    });

    results
}
