//! Partwear Core - Vessel Reliability Simulation Engine
//!
//! An ECS-based simulation of parts that wear out, fail and get repaired.
//! Every reliability module on a vessel drains reliability while it works,
//! rolls for failure on a fixed check cadence and waits for a player to
//! repair, kick, tape or bash it back into service.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Parts and the reliability modules attached to them
//! - **Components**: Pure data (Part, ReliabilityModule, Degradation, etc.)
//! - **Systems**: Wear, partial failures, instrument fleets, part managers
//!
//! The host feeds a [`conditions::VesselConditions`] snapshot every frame
//! and reads back failures, leaks, extra heat and instrument readings.
//!
//! # Example
//!
//! ```rust,no_run
//! use partwear_core::prelude::*;
//!
//! let loadout = Loadout::load("loadout.json").unwrap();
//! let mut sim = VesselSimulation::new(Settings::default(), 42);
//! let engine = sim.attach_part(loadout.part("liquidEngine").unwrap());
//!
//! let mut conditions = VesselConditions::default();
//! conditions.set_part(engine, PartConditions { throttle: 1.0, engine_ignited: true, ..Default::default() });
//!
//! loop {
//!     let report = sim.update(1.0 / 60.0, &conditions);
//!     for notice in sim.notices.drain() {
//!         println!("{} ({} failures this frame)", notice.message, report.failures.len());
//!     }
//! }
//! ```

pub mod actions;
pub mod components;
pub mod conditions;
pub mod engine;
pub mod loadout;
pub mod notices;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::actions::{ActionError, ActionKind, RepairSupply, Stockpile, REPAIR_RESOURCE};
    pub use crate::components::*;
    pub use crate::conditions::{PartConditions, VesselConditions};
    pub use crate::engine::{ModuleStatus, TickReport, VesselSimulation};
    pub use crate::loadout::{Loadout, PartTemplate};
    pub use crate::notices::FailureNotice;
    pub use partwear_logic::reliability::{ComponentKind, FailureKind};
    pub use partwear_logic::tuning::Settings;
}
