use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use partwear_core::loadout::{ModuleTemplate, PartTemplate};
use partwear_core::prelude::*;
use partwear_logic::reliability::{Capability, DEFAULT_QUALITY};
use partwear_logic::tuning::ComponentTuning;

fn module(kind: ComponentKind) -> ModuleTemplate {
    ModuleTemplate {
        kind,
        quality: DEFAULT_QUALITY,
        tuning: ComponentTuning::defaults_for(kind),
    }
}

fn engine_part() -> PartTemplate {
    PartTemplate {
        name: "liquidEngine".to_string(),
        title: "LV-T30".to_string(),
        base_cost: 1000.0,
        capabilities: vec![Capability::Engine, Capability::Gimbal, Capability::Alternator],
        resources: Vec::new(),
        modules: vec![
            module(ComponentKind::Ignitor),
            module(ComponentKind::Cooling),
            module(ComponentKind::Gimbal),
            module(ComponentKind::Alternator),
        ],
    }
}

fn tank_part() -> PartTemplate {
    PartTemplate {
        name: "fuelTank".to_string(),
        title: "FL-T400".to_string(),
        base_cost: 500.0,
        capabilities: Vec::new(),
        resources: vec![StoredResource {
            name: "LiquidFuel".to_string(),
            amount: 180.0,
            capacity: 180.0,
        }],
        modules: vec![module(ComponentKind::Tank), module(ComponentKind::Altimeter)],
    }
}

fn vessel(stacks: usize) -> (VesselSimulation, VesselConditions) {
    let mut sim = VesselSimulation::new(Settings::default(), 42);
    let mut conditions = VesselConditions {
        g_force: 2.5,
        true_altitude: 12_000.0,
        true_thrust: 215.0,
        ..Default::default()
    };
    for _ in 0..stacks {
        let engine = sim.attach_part(&engine_part());
        sim.attach_part(&tank_part());
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
    (sim, conditions)
}

fn benchmark_vessel_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("vessel_update");

    for stacks in [1usize, 10, 100] {
        let (mut sim, conditions) = vessel(stacks);
        group.throughput(Throughput::Elements(sim.module_count() as u64));
        group.bench_with_input(BenchmarkId::new("frame", stacks), &stacks, |b, &_stacks| {
            b.iter(|| {
                let report = sim.update(black_box(1.0 / 60.0), &conditions);
                black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_vessel_update);
criterion_main!(benches);
