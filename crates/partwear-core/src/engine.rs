//! Simulation engine - main entry point for running a vessel

use std::collections::HashMap;

use hecs::{Entity, World};
use partwear_logic::cost::part_cost;
use partwear_logic::reliability::{ComponentKind, ReliabilityState};
use partwear_logic::tuning::Settings;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::conditions::VesselConditions;
use crate::loadout::PartTemplate;
use crate::notices::{FailureNotice, NoticeBoard};
use crate::systems::*;

/// Seconds between part manager refreshes
const MANAGER_INTERVAL: f64 = 0.25;

/// Everything that happened during one `update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub failures: Vec<FailureEvent>,
    pub leaks: Vec<LeakLoss>,
    pub heat: HashMap<PartId, f64>,
    pub readings: InstrumentReadings,
}

/// Read-only view of one module for the host UI
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStatus {
    pub part: PartId,
    pub kind: ComponentKind,
    pub reliability: f64,
    pub quality: f32,
    /// Failure label, `None` while operating
    pub label: Option<String>,
    pub repair_progress: u32,
    pub enabled: bool,
}

/// Reliability simulation for one vessel. Owns the ECS world, the RNG and
/// the session settings; nothing is global.
pub struct VesselSimulation {
    /// ECS world containing parts and reliability modules
    pub world: World,
    /// Simulated seconds since start
    pub sim_time: f64,
    pub settings: Settings,
    /// Instrument membership and readouts
    pub fleet: FleetState,
    /// Failure notices waiting for the host
    pub notices: NoticeBoard,

    pub(crate) rng: StdRng,
    pub(crate) seed: u64,
    /// Bumped whenever modules are attached or removed
    pub(crate) generation: u64,
    pub(crate) next_part_id: u32,
    pub(crate) next_symmetry_group: u32,

    last_manager_update: f64,
    time_scale: f32,
}

impl VesselSimulation {
    /// Create an empty vessel. `seed` makes every roll reproducible.
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            world: World::new(),
            sim_time: 0.0,
            settings,
            fleet: FleetState::new(),
            notices: NoticeBoard::new(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            generation: 0,
            next_part_id: 1,
            next_symmetry_group: 1,
            last_manager_update: 0.0,
            time_scale: 1.0,
        }
    }

    /// Attach a part and its reliability modules.
    ///
    /// A module whose required capability is missing on the part is logged
    /// and attached disabled.
    pub fn attach_part(&mut self, template: &PartTemplate) -> PartId {
        self.spawn_part(template, None)
    }

    /// Attach `count` copies of a part placed in symmetry
    pub fn attach_symmetric(&mut self, template: &PartTemplate, count: usize) -> Vec<PartId> {
        let group = self.next_symmetry_group;
        self.next_symmetry_group += 1;
        (0..count)
            .map(|_| self.spawn_part(template, Some(group)))
            .collect()
    }

    fn spawn_part(&mut self, template: &PartTemplate, symmetry_group: Option<u32>) -> PartId {
        let id = PartId(self.next_part_id);
        self.next_part_id += 1;

        let part = Part {
            id,
            name: template.name.clone(),
            title: template.title.clone(),
            base_cost: template.base_cost,
            capabilities: template.capabilities.clone(),
            symmetry_group,
        };
        let resources = PartResources {
            resources: template.resources.clone(),
        };

        for module_template in &template.modules {
            let mut module = ReliabilityModule::new(
                id,
                module_template.kind,
                module_template.quality,
                module_template.tuning.clone(),
            );
            if let Some(cap) = module_template.kind.required_capability() {
                if !part.has(cap) {
                    log::error!(
                        "{} on {} needs {:?}, which the part does not have; disabling it",
                        module_template.kind.module_name(),
                        part.name,
                        cap
                    );
                    module.enabled = false;
                }
            }
            self.world
                .spawn((module, Sensors::default(), Degradation::None));
        }

        if template.has_manager() {
            self.world.spawn((part, resources, PartManager::default()));
        } else {
            self.world.spawn((part, resources));
        }
        self.generation += 1;
        id
    }

    /// Remove a part and every module on it
    pub fn detach_part(&mut self, id: PartId) -> bool {
        let Some(entity) = self.part_entity(id) else {
            return false;
        };
        let modules = self.modules_on(id);
        for module in modules {
            let _ = self.world.despawn(module);
        }
        let _ = self.world.despawn(entity);
        self.generation += 1;
        true
    }

    /// Update the simulation by `delta_seconds` of real time
    pub fn update(&mut self, delta_seconds: f32, conditions: &VesselConditions) -> TickReport {
        let dt = delta_seconds * self.time_scale;
        self.sim_time += dt as f64;

        // Wear and failure rolls (check cadence is tracked per module)
        let mut failures = wear_system(&mut self.world, conditions, &self.settings, &mut self.rng, dt);

        // Partial failures: leaks, flickering, overheating
        let partial = partial_failure_system(&mut self.world, conditions, &mut self.rng, dt);
        failures.extend(partial.escalations);
        self.announce(&failures);

        // Instruments (every frame)
        let readings = fleet_system(
            &self.world,
            &mut self.fleet,
            self.generation,
            conditions,
            &mut self.rng,
        );

        // Part managers (4 Hz)
        if self.sim_time - self.last_manager_update >= MANAGER_INTERVAL || !failures.is_empty() {
            let elapsed = (self.sim_time - self.last_manager_update) as f32;
            part_manager_system(
                &mut self.world,
                &self.settings,
                readings.monitor_reliability,
                &mut self.rng,
                elapsed,
            );
            self.last_manager_update = self.sim_time;
        }

        TickReport {
            failures,
            leaks: partial.leaks,
            heat: partial.heat,
            readings,
        }
    }

    /// Post a notice for every new failure and drop out of time warp if asked
    pub(crate) fn announce(&mut self, failures: &[FailureEvent]) {
        for event in failures {
            let title = self
                .part(event.part)
                .map(|p| p.title)
                .unwrap_or_else(|| event.part.to_string());
            let notice = FailureNotice::new(
                event.part,
                &title,
                event.component,
                event.failure,
                event.detail.as_deref(),
                &self.settings,
            );
            if notice.halt_time_warp && self.time_scale > 1.0 {
                log::info!("failure during time warp, dropping to 1x");
                self.time_scale = 1.0;
            }
            self.notices.post(notice);
        }
    }

    /// Set time scale (1.0 = real-time, 4.0 = 4x warp, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn part_count(&self) -> usize {
        self.world.query::<&Part>().iter().count()
    }

    pub fn module_count(&self) -> usize {
        self.world.query::<&ReliabilityModule>().iter().count()
    }

    pub fn failed_count(&self) -> usize {
        self.world
            .query::<&ReliabilityModule>()
            .iter()
            .filter(|(_, m)| m.state.is_failed())
            .count()
    }

    pub fn part_ids(&self) -> Vec<PartId> {
        let mut ids: Vec<PartId> = self.world.query::<&Part>().iter().map(|(_, p)| p.id).collect();
        ids.sort();
        ids
    }

    pub fn part_entity(&self, id: PartId) -> Option<Entity> {
        self.world
            .query::<&Part>()
            .iter()
            .find(|(_, p)| p.id == id)
            .map(|(e, _)| e)
    }

    pub fn part(&self, id: PartId) -> Option<Part> {
        let entity = self.part_entity(id)?;
        self.world.get::<&Part>(entity).ok().map(|p| (*p).clone())
    }

    pub fn part_manager(&self, id: PartId) -> Option<PartManager> {
        let entity = self.part_entity(id)?;
        self.world.get::<&PartManager>(entity).ok().map(|m| (*m).clone())
    }

    pub fn stored_amount(&self, id: PartId, resource: &str) -> f64 {
        self.part_entity(id)
            .and_then(|e| self.world.get::<&PartResources>(e).ok().map(|r| r.amount(resource)))
            .unwrap_or(0.0)
    }

    /// Module entities on a part, in spawn order
    pub fn modules_on(&self, id: PartId) -> Vec<Entity> {
        let mut modules: Vec<Entity> = self
            .world
            .query::<&ReliabilityModule>()
            .iter()
            .filter(|(_, m)| m.part == id)
            .map(|(e, _)| e)
            .collect();
        modules.sort_by_key(|e| e.id());
        modules
    }

    /// First module of `kind` on a part
    pub fn module_of(&self, id: PartId, kind: ComponentKind) -> Option<Entity> {
        self.modules_on(id).into_iter().find(|e| {
            self.world
                .get::<&ReliabilityModule>(*e)
                .map(|m| m.kind == kind)
                .unwrap_or(false)
        })
    }

    pub fn state(&self, module: Entity) -> Option<ReliabilityState> {
        self.world
            .get::<&ReliabilityModule>(module)
            .ok()
            .map(|m| m.state.clone())
    }

    pub fn status(&self, module: Entity) -> Option<ModuleStatus> {
        let m = self.world.get::<&ReliabilityModule>(module).ok()?;
        let degradation = self
            .world
            .get::<&Degradation>(module)
            .map(|d| (*d).clone())
            .unwrap_or_default();
        Some(ModuleStatus {
            part: m.part,
            kind: m.kind,
            reliability: m.state.reliability,
            quality: m.state.quality,
            label: module_label(&m, &degradation),
            repair_progress: m.state.repair_progress,
            enabled: m.enabled,
        })
    }

    /// Current price of a part from its module qualities
    pub fn part_cost(&self, id: PartId) -> Option<f64> {
        let part = self.part(id)?;
        let qualities: Vec<f32> = self
            .modules_on(id)
            .into_iter()
            .filter_map(|e| self.world.get::<&ReliabilityModule>(e).ok().map(|m| m.state.quality))
            .collect();
        Some(part_cost(part.base_cost, &qualities))
    }
}

impl VesselSimulation {
    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_simulation(
            writer,
            crate::persistence::SaveSource {
                world: &self.world,
                sim_time: self.sim_time,
                time_scale: self.time_scale,
                seed: self.seed,
                next_part_id: self.next_part_id,
                next_symmetry_group: self.next_symmetry_group,
                settings: &self.settings,
                fleet: &self.fleet,
                notices: &self.notices,
            },
        )
    }

    /// Load simulation state from a reader, replacing the current vessel.
    /// The RNG is reseeded from the saved seed and time.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        let loaded = crate::persistence::load_simulation(reader)?;

        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.time_scale = loaded.time_scale;
        self.seed = loaded.seed;
        self.next_part_id = loaded.next_part_id;
        self.next_symmetry_group = loaded.next_symmetry_group;
        self.settings = loaded.settings;
        self.fleet = loaded.fleet;
        self.notices = loaded.notices;
        self.rng = StdRng::seed_from_u64(self.seed ^ self.sim_time.to_bits());
        self.generation += 1;
        self.last_manager_update = self.sim_time;

        log::info!(
            "loaded vessel: {} parts, {} modules at t={:.1}s",
            self.part_count(),
            self.module_count(),
            self.sim_time
        );
        Ok(())
    }
}

impl Default for VesselSimulation {
    fn default() -> Self {
        Self::new(Settings::default(), 0)
    }
}
