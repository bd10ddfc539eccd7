//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for binary serialization of the whole vessel. Components
//! are serialized individually then reconstructed on load. Restored
//! failures are not announced again.

use std::io::{Read, Write};

use hecs::World;
use partwear_logic::tuning::Settings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::*;
use crate::notices::NoticeBoard;
use crate::systems::FleetState;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Simulated seconds
    pub sim_time: f64,
    pub time_scale: f32,
    pub seed: u64,
    pub next_part_id: u32,
    pub next_symmetry_group: u32,
    pub settings: Settings,
    /// Latched instrument readouts
    pub fleet: FleetState,
    pub notices: NoticeBoard,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    // Parts
    pub part: Option<Part>,
    pub resources: Option<PartResources>,
    pub manager: Option<PartManager>,

    // Reliability modules
    pub module: Option<ReliabilityModule>,
    pub sensors: Option<Sensors>,
    pub degradation: Option<Degradation>,
}

/// Extract all entities from a world into serializable form.
/// Modules are written in spawn order so lookups stay stable after load.
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut handles: Vec<hecs::Entity> = world.iter().map(|e| e.entity()).collect();
    handles.sort_by_key(|e| e.id());

    let mut entities = Vec::with_capacity(handles.len());
    for handle in handles {
        let Ok(entity_ref) = world.entity(handle) else {
            continue;
        };
        let mut se = SerializableEntity::default();

        if let Some(c) = entity_ref.get::<&Part>() {
            se.part = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&PartResources>() {
            se.resources = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&PartManager>() {
            se.manager = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&ReliabilityModule>() {
            se.module = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Sensors>() {
            se.sensors = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Degradation>() {
            se.degradation = Some((*c).clone());
        }

        entities.push(se);
    }

    entities
}

/// Rebuild a world from serialized entities
fn deserialize_entities(world: &mut World, entities: Vec<SerializableEntity>) {
    for se in entities {
        spawn_entity(world, se);
    }
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.part {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.resources {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.manager {
        let _ = world.insert_one(entity, c);
    }
    if let Some(mut c) = se.module {
        c.state.clamp();
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.sensors {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.degradation {
        let _ = world.insert_one(entity, c);
    }
}

/// Everything the engine hands to `save_simulation`
pub struct SaveSource<'a> {
    pub world: &'a World,
    pub sim_time: f64,
    pub time_scale: f32,
    pub seed: u64,
    pub next_part_id: u32,
    pub next_symmetry_group: u32,
    pub settings: &'a Settings,
    pub fleet: &'a FleetState,
    pub notices: &'a NoticeBoard,
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(writer: W, source: SaveSource<'_>) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time: source.sim_time,
        time_scale: source.time_scale,
        seed: source.seed,
        next_part_id: source.next_part_id,
        next_symmetry_group: source.next_symmetry_group,
        settings: source.settings.clone(),
        fleet: source.fleet.clone(),
        notices: source.notices.clone(),
        entities: serialize_entities(source.world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    deserialize_entities(&mut world, save_data.entities);

    let mut fleet = save_data.fleet;
    fleet.invalidate();

    Ok(LoadedSimulation {
        world,
        sim_time: save_data.sim_time,
        time_scale: save_data.time_scale,
        seed: save_data.seed,
        next_part_id: save_data.next_part_id,
        next_symmetry_group: save_data.next_symmetry_group,
        settings: save_data.settings,
        fleet,
        notices: save_data.notices,
    })
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub sim_time: f64,
    pub time_scale: f32,
    pub seed: u64,
    pub next_part_id: u32,
    pub next_symmetry_group: u32,
    pub settings: Settings,
    pub fleet: FleetState,
    pub notices: NoticeBoard,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{PartConditions, VesselConditions};
    use crate::engine::VesselSimulation;
    use crate::loadout::Loadout;
    use partwear_logic::reliability::{ComponentKind, FailureKind};
    use partwear_logic::repair::Leak;

    const LOADOUT: &str = r#"{ "parts": [
        { "part_name": "engine", "title": "LV-T30", "base_cost": 1000,
          "capabilities": ["Engine"],
          "modules": [ { "module_name": "ModuleReliabilityIgnitor", "quality": 0.6 },
                       { "module_name": "ModuleReliabilityCooling" } ] },
        { "part_name": "tank", "title": "FL-T400",
          "resources": [ { "name": "LiquidFuel", "amount": 180 } ],
          "modules": [ { "module_name": "ModuleReliabilityTank" } ] }
    ] }"#;

    #[test]
    fn test_save_load_roundtrip() {
        let loadout = Loadout::from_json(LOADOUT).unwrap();
        let mut engine = VesselSimulation::new(Settings::default(), 7);
        let motor = engine.attach_part(loadout.part("engine").unwrap());
        let tank = engine.attach_part(loadout.part("tank").unwrap());

        let mut conditions = VesselConditions::default();
        conditions.set_part(
            motor,
            PartConditions {
                throttle: 1.0,
                engine_ignited: true,
                staged: true,
                ..Default::default()
            },
        );
        for _ in 0..120 {
            engine.update(1.0, &conditions);
        }

        let leaking = engine.module_of(tank, ComponentKind::Tank).unwrap();
        {
            let mut m = engine.world.get::<&mut ReliabilityModule>(leaking).unwrap();
            m.state.set_failure(FailureKind::Leaking, 50);
        }
        {
            let mut d = engine.world.get::<&mut Degradation>(leaking).unwrap();
            *d = Degradation::Leaking(Leak {
                resource: "LiquidFuel".to_string(),
                pole: 0.05,
            });
        }

        let original_time = engine.sim_time();
        let cooling = engine.module_of(motor, ComponentKind::Cooling).unwrap();
        let original_cooling = engine.state(cooling).unwrap();

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = VesselSimulation::default();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert!((loaded.sim_time() - original_time).abs() < 0.001);
        assert_eq!(loaded.part_count(), 2);
        assert_eq!(loaded.module_count(), 3);
        assert_eq!(loaded.notices.len(), engine.notices.len());

        let cooling = loaded.module_of(motor, ComponentKind::Cooling).unwrap();
        assert_eq!(loaded.state(cooling).unwrap(), original_cooling);
        let ignitor = loaded.module_of(motor, ComponentKind::Ignitor).unwrap();
        assert_eq!(loaded.state(ignitor).unwrap().quality, 0.6);

        let tank_module = loaded.module_of(tank, ComponentKind::Tank).unwrap();
        assert_eq!(
            loaded.status(tank_module).unwrap().label.as_deref(),
            Some("LiquidFuel leaking!")
        );

        let next = loaded.attach_part(loadout.part("tank").unwrap());
        assert!(next.0 > tank.0);
    }

    #[test]
    fn test_version_mismatch() {
        let save_data = SaveData {
            version: SAVE_VERSION + 1,
            sim_time: 0.0,
            time_scale: 1.0,
            seed: 0,
            next_part_id: 1,
            next_symmetry_group: 1,
            settings: Settings::default(),
            fleet: FleetState::new(),
            notices: NoticeBoard::new(),
            entities: Vec::new(),
        };
        let mut buffer = Vec::new();
        bincode::serialize_into(&mut buffer, &save_data).unwrap();
        assert!(matches!(
            load_simulation(&buffer[..]),
            Err(SaveError::VersionMismatch { found, .. }) if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_save() {
        let engine = VesselSimulation::default();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(load_simulation(&buffer[..]), Err(SaveError::Bincode(_))));
    }
}
