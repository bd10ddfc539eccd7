//! Player actions on reliability modules: repair, kick, maintain, duct
//! tape, decoupler staging and bashing, quality changes.
//!
//! Every action validates first and leaves the world untouched on error.

use std::collections::HashMap;

use hecs::Entity;
use partwear_logic::failure::{roll_decouple, DecoupleOutcome};
use partwear_logic::reliability::{ComponentKind, FailureKind, ReliabilityState};
use partwear_logic::repair::{
    apply_duct_tape, apply_maintenance, apply_repair_resource, bash_decoupler, kick,
    maintenance_available, repair_request, restoration_for, skill_allows, KickOutcome,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Degradation, PartId, ReliabilityModule};
use crate::engine::VesselSimulation;
use crate::systems::FailureEvent;

/// Resource spent by repairs and maintenance
pub const REPAIR_RESOURCE: &str = "RocketParts";

/// Something that hands out repair resource, e.g. a technician's pack
pub trait RepairSupply {
    /// Take up to `amount` units of `resource`; returns what was granted
    fn request(&mut self, resource: &str, amount: u32) -> u32;
}

/// Plain resource store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    pub resources: HashMap<String, u32>,
}

impl Stockpile {
    pub fn with(resource: &str, amount: u32) -> Self {
        let mut resources = HashMap::new();
        resources.insert(resource.to_string(), amount);
        Self { resources }
    }

    pub fn amount(&self, resource: &str) -> u32 {
        self.resources.get(resource).copied().unwrap_or(0)
    }
}

impl RepairSupply for Stockpile {
    fn request(&mut self, resource: &str, amount: u32) -> u32 {
        let Some(stored) = self.resources.get_mut(resource) else {
            return 0;
        };
        let granted = amount.min(*stored);
        *stored -= granted;
        granted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Repair,
    Kick,
    Maintain,
    DuctTape,
    ReplaceBulb,
    Stage,
    Bash,
    SetQuality,
}

#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("no reliability module {0:?}")]
    UnknownModule(Entity),
    #[error("no part {0}")]
    UnknownPart(PartId),
    #[error("{0:?} is not available on {1:?}")]
    Unavailable(ActionKind, ComponentKind),
    #[error("{0:?} has not failed")]
    NotFailed(ComponentKind),
    #[error("{0:?} is locked and cannot be repaired")]
    Locked(ComponentKind),
    #[error("repair needs skill {required}, technician has {skill}")]
    InsufficientSkill { required: u8, skill: u8 },
    #[error("no {0} available")]
    NoResource(&'static str),
}

/// Result of one repair action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub consumed: u32,
    /// Units still needed; 0 once the failure is cleared
    pub remaining: u32,
    pub completed: bool,
}

/// Actions a player could attempt on a module in its current state
pub fn available_actions(module: &ReliabilityModule, enforce_skill: bool, skill: u8) -> Vec<ActionKind> {
    let state = &module.state;
    let mut actions = Vec::new();
    if !module.enabled {
        return actions;
    }
    match state.failure {
        None => {
            if module.kind != ComponentKind::Monitor {
                actions.push(ActionKind::Maintain);
            }
        }
        Some(FailureKind::Locked) => {}
        Some(FailureKind::Misfired) => actions.push(ActionKind::Bash),
        Some(FailureKind::Leaking) => {
            actions.push(ActionKind::DuctTape);
            actions.push(ActionKind::Repair);
        }
        Some(FailureKind::Flickering) | Some(FailureKind::Busted) => {
            actions.push(ActionKind::ReplaceBulb);
        }
        Some(_) => {
            if skill_allows(skill, module.tuning.repair_skill, enforce_skill) {
                actions.push(ActionKind::Repair);
            }
            if module.kind.is_kickable() {
                actions.push(ActionKind::Kick);
            }
        }
    }
    actions
}

impl VesselSimulation {
    fn module_mut(&self, module: Entity) -> Result<hecs::RefMut<'_, ReliabilityModule>, ActionError> {
        self.world
            .get::<&mut ReliabilityModule>(module)
            .map_err(|_| ActionError::UnknownModule(module))
    }

    fn module_snapshot(&self, module: Entity) -> Result<ReliabilityModule, ActionError> {
        self.world
            .get::<&ReliabilityModule>(module)
            .map(|m| (*m).clone())
            .map_err(|_| ActionError::UnknownModule(module))
    }

    fn clear_degradation(&self, module: Entity) {
        if let Ok(mut degradation) = self.world.get::<&mut Degradation>(module) {
            *degradation = Degradation::None;
        }
    }

    /// Spend repair resource on a failed module.
    ///
    /// Asks `supply` for at most `repair_batch` units. Bulbs (flickering or
    /// busted) are repaired with this too, as a replacement.
    pub fn repair(
        &mut self,
        module: Entity,
        supply: &mut impl RepairSupply,
        skill: u8,
    ) -> Result<RepairReport, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        match snapshot.state.failure {
            None => return Err(ActionError::NotFailed(snapshot.kind)),
            Some(FailureKind::Locked) => return Err(ActionError::Locked(snapshot.kind)),
            Some(FailureKind::Misfired) => {
                return Err(ActionError::Unavailable(ActionKind::Repair, snapshot.kind))
            }
            Some(_) => {}
        }
        let required = snapshot.tuning.repair_skill;
        if !skill_allows(skill, required, self.settings.enforce_repair_skill) {
            return Err(ActionError::InsufficientSkill { required, skill });
        }

        let wanted = repair_request(&snapshot.state, self.settings.repair_batch);
        let granted = supply.request(REPAIR_RESOURCE, wanted);
        if granted == 0 {
            return Err(ActionError::NoResource(REPAIR_RESOURCE));
        }

        let (consumed, remaining, completed) = {
            let mut m = self.module_mut(module)?;
            let restoration = restoration_for(m.kind, &m.tuning);
            let consumed = apply_repair_resource(&mut m.state, granted, restoration);
            (consumed, m.state.repair_progress, m.state.is_operating())
        };
        if completed {
            self.clear_degradation(module);
            log::info!("{:?} on part {} repaired", snapshot.kind, snapshot.part);
        }
        Ok(RepairReport {
            consumed,
            remaining,
            completed,
        })
    }

    /// Swap a flickering or busted bulb. Costs the same resource as a repair.
    pub fn replace_bulb(
        &mut self,
        module: Entity,
        supply: &mut impl RepairSupply,
        skill: u8,
    ) -> Result<RepairReport, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        if snapshot.kind != ComponentKind::Light {
            return Err(ActionError::Unavailable(ActionKind::ReplaceBulb, snapshot.kind));
        }
        self.repair(module, supply, skill)
    }

    /// Kick a failed module. A destroyed module takes its part with it.
    pub fn kick(&mut self, module: Entity) -> Result<KickOutcome, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        if !snapshot.kind.is_kickable() {
            return Err(ActionError::Unavailable(ActionKind::Kick, snapshot.kind));
        }
        match snapshot.state.failure {
            None => return Err(ActionError::NotFailed(snapshot.kind)),
            Some(FailureKind::Locked) => return Err(ActionError::Locked(snapshot.kind)),
            Some(_) => {}
        }

        let outcome = {
            let mut m = self
                .world
                .get::<&mut ReliabilityModule>(module)
                .map_err(|_| ActionError::UnknownModule(module))?;
            let ReliabilityModule {
                kind, state, tuning, ..
            } = &mut *m;
            kick(&mut self.rng, *kind, state, tuning)
        };
        match outcome {
            KickOutcome::Destroyed => {
                log::warn!("kick destroyed {:?} on part {}", snapshot.kind, snapshot.part);
                self.detach_part(snapshot.part);
            }
            KickOutcome::Locked => {
                log::warn!("gimbal on part {} locked for good", snapshot.part);
                self.announce(&[FailureEvent {
                    module,
                    part: snapshot.part,
                    component: snapshot.kind,
                    failure: FailureKind::Locked,
                    detail: None,
                }]);
            }
            KickOutcome::Fixed => log::info!("kick fixed {:?} on part {}", snapshot.kind, snapshot.part),
            KickOutcome::Nothing => {}
        }
        Ok(outcome)
    }

    /// Preventive maintenance on an operating module below the threshold.
    /// Returns the units spent.
    pub fn maintain(
        &mut self,
        module: Entity,
        supply: &mut impl RepairSupply,
    ) -> Result<u32, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        if snapshot.kind == ComponentKind::Monitor
            || !maintenance_available(&snapshot.state, self.settings.maintenance_threshold)
        {
            return Err(ActionError::Unavailable(ActionKind::Maintain, snapshot.kind));
        }
        let granted = supply.request(REPAIR_RESOURCE, self.settings.maintenance_batch);
        if granted == 0 {
            return Err(ActionError::NoResource(REPAIR_RESOURCE));
        }
        let per_unit = self.settings.maintenance_bonus_per_unit;
        let mut m = self.module_mut(module)?;
        apply_maintenance(&mut m.state, granted, per_unit);
        Ok(granted)
    }

    /// Stop a tank leak at once
    pub fn duct_tape(&mut self, module: Entity) -> Result<(), ActionError> {
        let snapshot = self.module_snapshot(module)?;
        if snapshot.kind != ComponentKind::Tank {
            return Err(ActionError::Unavailable(ActionKind::DuctTape, snapshot.kind));
        }
        let taped = {
            let mut m = self.module_mut(module)?;
            apply_duct_tape(&mut m.state)
        };
        if !taped {
            return Err(ActionError::NotFailed(snapshot.kind));
        }
        self.clear_degradation(module);
        Ok(())
    }

    /// Fire the decoupler on a part.
    ///
    /// A misfire leaves the decoupler failed until bashed; an explosion
    /// removes the part.
    pub fn stage_decoupler(&mut self, part: PartId) -> Result<DecoupleOutcome, ActionError> {
        let module = self
            .module_of(part, ComponentKind::Decoupler)
            .ok_or(ActionError::UnknownPart(part))?;
        let snapshot = self.module_snapshot(module)?;
        if !snapshot.enabled {
            return Err(ActionError::Unavailable(ActionKind::Stage, snapshot.kind));
        }
        if snapshot.state.is_failed() {
            return Ok(DecoupleOutcome::Misfired);
        }

        let outcome = roll_decouple(
            &mut self.rng,
            snapshot.state.quality,
            snapshot.tuning.explosion_chance,
            snapshot.tuning.misfire_chance,
        );
        match outcome {
            DecoupleOutcome::Decoupled => {}
            DecoupleOutcome::Misfired => {
                {
                    let mut m = self.module_mut(module)?;
                    let requirement = m.tuning.repair_requirement;
                    m.state.set_failure(FailureKind::Misfired, requirement);
                }
                self.announce(&[FailureEvent {
                    module,
                    part,
                    component: ComponentKind::Decoupler,
                    failure: FailureKind::Misfired,
                    detail: None,
                }]);
            }
            DecoupleOutcome::Exploded => {
                log::warn!("decoupler on part {} exploded", part);
                self.detach_part(part);
            }
        }
        Ok(outcome)
    }

    /// Bash a misfired decoupler
    pub fn bash(&mut self, module: Entity) -> Result<DecoupleOutcome, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        if snapshot.kind != ComponentKind::Decoupler {
            return Err(ActionError::Unavailable(ActionKind::Bash, snapshot.kind));
        }
        let outcome = {
            let mut m = self
                .world
                .get::<&mut ReliabilityModule>(module)
                .map_err(|_| ActionError::UnknownModule(module))?;
            let ReliabilityModule { state, tuning, .. } = &mut *m;
            bash_decoupler(&mut self.rng, state, tuning)
        };
        let outcome = outcome.ok_or(ActionError::NotFailed(snapshot.kind))?;
        if outcome == DecoupleOutcome::Exploded {
            log::warn!("bashed decoupler on part {} exploded", snapshot.part);
            self.detach_part(snapshot.part);
        }
        Ok(outcome)
    }

    /// Change a module's design quality. Applies to the same module on
    /// every part in the symmetry group and resets them to fresh.
    /// Returns how many modules changed.
    pub fn set_quality(&mut self, module: Entity, quality: f32) -> Result<usize, ActionError> {
        let snapshot = self.module_snapshot(module)?;
        let quality = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            return Err(ActionError::Unavailable(ActionKind::SetQuality, snapshot.kind));
        };

        let group = self.part(snapshot.part).and_then(|p| p.symmetry_group);
        let mut targets = vec![snapshot.part];
        if let Some(group) = group {
            targets = self
                .part_ids()
                .into_iter()
                .filter(|id| self.part(*id).and_then(|p| p.symmetry_group) == Some(group))
                .collect();
        }

        let mut changed = 0;
        for (_, m) in self.world.query_mut::<&mut ReliabilityModule>() {
            if m.kind == snapshot.kind && targets.contains(&m.part) {
                m.state = ReliabilityState::new(quality);
                changed += 1;
            }
        }
        let modules: Vec<Entity> = targets.iter().flat_map(|p| self.modules_on(*p)).collect();
        for e in modules {
            let same_kind = self
                .world
                .get::<&ReliabilityModule>(e)
                .map(|m| m.kind == snapshot.kind)
                .unwrap_or(false);
            if same_kind {
                self.clear_degradation(e);
            }
        }
        Ok(changed)
    }

    /// Actions available on a module right now
    pub fn actions_for(&self, module: Entity, skill: u8) -> Vec<ActionKind> {
        self.world
            .get::<&ReliabilityModule>(module)
            .map(|m| available_actions(&m, self.settings.enforce_repair_skill, skill))
            .unwrap_or_default()
    }
}
