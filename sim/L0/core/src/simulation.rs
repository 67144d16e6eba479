//! The simulation driver.
//!
//! [`Simulation`] owns the [`World`] and the configured engines, and runs the
//! tick loop:
//!
//! 1. Apply commands queued since the last tick
//! 2. `update` every engine, in configuration order
//! 3. Write canonical poses and velocities back to the world
//! 4. Run the transfer pass (per [`TransferTrigger`])
//!
//! The visualizer drives it through [`play`](Simulation::play),
//! [`pause`](Simulation::pause), [`step`](Simulation::step) and
//! [`reset`](Simulation::reset), and reads it through
//! [`pose`](Simulation::pose) and
//! [`check_intersection_with_ray`](Simulation::check_intersection_with_ray).

use std::collections::BTreeMap;

use nalgebra::Point3;
use sim_types::{EngineConfig, EngineId, EntityId, Pose, Ray3, Result, SimError};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::commands::{Command, CommandQueue};
use crate::engine::PhysicsEngine;
use crate::entity::Entity;
use crate::query::{self, RayHit};
use crate::transfer::{self, TransferReport, TransferTrigger};
use crate::world::World;

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SimulationConfig {
    /// When the transfer pass runs.
    pub transfer: TransferTrigger,
}

impl SimulationConfig {
    /// Set the transfer trigger.
    #[must_use]
    pub const fn with_transfer(mut self, transfer: TransferTrigger) -> Self {
        self.transfer = transfer;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a zero transfer interval.
    pub fn validate(&self) -> Result<()> {
        if self.transfer == TransferTrigger::EveryNTicks(0) {
            return Err(SimError::invalid_config(
                "simulation",
                "transfer",
                "transfer interval must be at least one tick",
            ));
        }
        Ok(())
    }
}

/// Outcome of one tick.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Tick count after this step.
    pub tick: u64,
    /// Recoverable errors from queued commands.
    pub command_failures: Vec<SimError>,
    /// Transfers performed after the update.
    pub transfers: TransferReport,
}

/// World, engines and the tick loop.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    engines: Vec<Box<dyn PhysicsEngine>>,
    config: SimulationConfig,
    commands: CommandQueue,
    // Engines each entity was placed in when it was added; reset restores them.
    placements: BTreeMap<EntityId, Vec<EngineId>>,
    tick: u64,
    playing: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create an empty simulation with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            engines: Vec::new(),
            config: SimulationConfig::default(),
            commands: CommandQueue::new(),
            placements: BTreeMap::new(),
            tick: 0,
            playing: false,
        }
    }

    /// Create an empty simulation with `config`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is rejected.
    pub fn with_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Driver configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ==================== Engines ====================

    /// Initialize `engine` with `config` and append it to the update order.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the id is already used or `init` rejects the
    /// configuration. A rejected engine is destroyed and dropped.
    pub fn add_engine(&mut self, mut engine: Box<dyn PhysicsEngine>, config: &EngineConfig) -> Result<()> {
        if self.engine(engine.id()).is_some() {
            return Err(SimError::invalid_config(
                engine.id().as_str(),
                "id",
                "an engine with this id is already configured",
            ));
        }
        if let Err(err) = engine.init(config) {
            if let Err(cleanup) = engine.destroy() {
                debug!(engine = %engine.id(), error = %cleanup, "cleanup after failed init");
            }
            return Err(err);
        }
        info!(engine = %engine.id(), order = self.engines.len(), "engine configured");
        self.engines.push(engine);
        Ok(())
    }

    /// Engine with `id`.
    #[must_use]
    pub fn engine(&self, id: &EngineId) -> Option<&dyn PhysicsEngine> {
        self.engines
            .iter()
            .find(|engine| engine.id() == id)
            .map(|engine| &**engine)
    }

    /// Engines in configuration order.
    pub fn engines(&self) -> impl Iterator<Item = &dyn PhysicsEngine> {
        self.engines.iter().map(|engine| &**engine)
    }

    fn engine_index(&self, id: &EngineId) -> Result<usize> {
        self.engines
            .iter()
            .position(|engine| engine.id() == id)
            .ok_or_else(|| SimError::UnknownEngine {
                engine: id.to_string(),
            })
    }

    // ==================== Entities ====================

    /// The entity store.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// All entities, in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.world.iter()
    }

    /// Canonical pose of an entity, as of the last step.
    #[must_use]
    pub fn pose(&self, id: &EntityId) -> Option<Pose> {
        self.world.get(id).map(|entity| *entity.pose())
    }

    /// Queue for add/remove requests applied at the start of the next step.
    pub fn commands(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    /// Add `entity` to the world and to the first live engine (in
    /// configuration order) whose volume contains its position.
    ///
    /// # Errors
    ///
    /// `DuplicateEntity`, `NoEngineForEntity` when no engine contains it, or
    /// the engine's add error. On error the world is unchanged.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<()> {
        self.ensure_new(&entity)?;
        let position = entity.position();
        let engine = self
            .engines
            .iter_mut()
            .find(|engine| engine.state().is_live() && engine.is_point_contained(&position))
            .ok_or_else(|| SimError::NoEngineForEntity {
                entity: entity.id().to_string(),
            })?;
        engine.add_entity(&mut entity)?;
        debug!(entity = %entity.id(), engine = %engine.id(), "entity added");
        self.placements.insert(entity.id().clone(), vec![engine.id().clone()]);
        self.world.insert(entity)
    }

    /// Add `entity` to the world and to each engine in `engines`.
    ///
    /// # Errors
    ///
    /// `DuplicateEntity`, `UnknownEngine`, or the first engine add error.
    /// Models created before the failure are removed again.
    pub fn add_entity_to(&mut self, mut entity: Entity, engines: &[EngineId]) -> Result<()> {
        self.ensure_new(&entity)?;
        let indices = engines
            .iter()
            .map(|id| self.engine_index(id))
            .collect::<Result<Vec<_>>>()?;

        for (done, &index) in indices.iter().enumerate() {
            if let Err(err) = self.engines[index].add_entity(&mut entity) {
                for &added in indices[..done].iter().rev() {
                    if let Err(rollback) = self.engines[added].remove_entity(&mut entity) {
                        warn!(entity = %entity.id(), error = %rollback, "rollback of partial add failed");
                    }
                }
                return Err(err);
            }
        }
        debug!(entity = %entity.id(), engines = indices.len(), "entity added");
        self.placements.insert(entity.id().clone(), engines.to_vec());
        self.world.insert(entity)
    }

    /// Remove an entity's models from every engine, then the entity itself.
    ///
    /// All or nothing: if an engine refuses the removal, the models already
    /// removed are created again from the entity's current state and the
    /// entity stays in the world.
    ///
    /// # Errors
    ///
    /// `EntityNotFound`, or the engine remove error.
    pub fn remove_entity(&mut self, id: &EntityId) -> Result<Entity> {
        let entity = self.world.entity_mut(id)?;
        let holders: Vec<usize> = self
            .engines
            .iter()
            .enumerate()
            .filter(|(_, engine)| engine.contains_model(id))
            .map(|(index, _)| index)
            .collect();

        for (done, &index) in holders.iter().enumerate() {
            if let Err(err) = self.engines[index].remove_entity(entity) {
                warn!(entity = %id, engine = %self.engines[index].id(), error = %err, "model removal failed");
                for &removed in holders[..done].iter().rev() {
                    if let Err(restore) = self.engines[removed].add_entity(entity) {
                        warn!(
                            entity = %id,
                            engine = %self.engines[removed].id(),
                            error = %restore,
                            "restoring removed model failed"
                        );
                    }
                }
                return Err(err);
            }
        }

        let entity = self.world.remove(id)?;
        self.placements.remove(id);
        debug!(entity = %id, "entity removed");
        Ok(entity)
    }

    fn ensure_new(&self, entity: &Entity) -> Result<()> {
        if self.world.contains(entity.id()) {
            return Err(SimError::DuplicateEntity {
                entity: entity.id().to_string(),
            });
        }
        Ok(())
    }

    // ==================== Stepping ====================

    /// Completed ticks since creation or the last reset.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one tick.
    ///
    /// # Errors
    ///
    /// Fatal errors (configuration, state misuse) abort the tick; the
    /// failing command is dropped and the ones behind it stay queued.
    /// Recoverable errors are returned in the report.
    pub fn step(&mut self) -> Result<StepReport> {
        let mut report = StepReport::default();

        let mut commands = self.commands.drain().collect::<Vec<Command>>().into_iter();
        while let Some(command) = commands.next() {
            if let Err(err) = self.apply(command) {
                if err.is_fatal() {
                    if !commands.as_slice().is_empty() {
                        warn!(remaining = commands.len(), "commands left queued after a fatal error");
                    }
                    self.commands.requeue(commands);
                    return Err(err);
                }
                warn!(error = %err, "queued command failed");
                report.command_failures.push(err);
            }
        }

        for engine in &mut self.engines {
            engine.update()?;
        }
        self.sync_world();
        self.tick += 1;
        report.tick = self.tick;

        if self.config.transfer.fires(self.tick)
            && self.engines.iter().any(|engine| engine.is_entity_transfer_needed())
        {
            report.transfers = self.transfer_entities();
        }

        Ok(report)
    }

    /// Run the transfer pass now, regardless of the trigger.
    pub fn transfer_entities(&mut self) -> TransferReport {
        transfer::transfer_entities(&mut self.engines, &mut self.world)
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::AddEntity(entity) => self.add_entity(entity),
            Command::AddEntityTo { entity, engines } => self.add_entity_to(entity, &engines),
            Command::RemoveEntity(id) => self.remove_entity(&id).map(drop),
        }
    }

    /// Copy model state into the world; with several engines holding the
    /// same entity, the last in configuration order wins.
    fn sync_world(&mut self) {
        for engine in &self.engines {
            for id in engine.entity_ids() {
                let Some(entity) = self.world.get_mut(&id) else {
                    continue;
                };
                if let Some(pose) = engine.model_pose(&id) {
                    entity.set_pose(pose);
                }
                if let (Some(twist), Ok(body)) = (engine.model_twist(&id), entity.body_mut()) {
                    body.set_velocity(twist);
                }
            }
        }
    }

    /// Restart the run: pending commands are dropped, engines reset and
    /// entities return to their creation pose and velocity, in the engines
    /// they were placed in when added.
    ///
    /// # Errors
    ///
    /// The first engine reset error, or the first error moving an entity
    /// back to its initial engines.
    pub fn reset(&mut self) -> Result<()> {
        self.commands.clear();
        for engine in &mut self.engines {
            engine.reset()?;
        }
        for entity in self.world.iter_mut() {
            let Ok(body) = entity.body_mut() else {
                continue;
            };
            let origin = *body.origin();
            let velocity = *body.origin_velocity();
            body.set_velocity(velocity);
            entity.set_pose(origin);
        }
        self.tick = 0;
        self.restore_placements()?;
        info!("simulation reset");
        Ok(())
    }

    /// Move every entity back to the engines it was placed in. Models are
    /// created in the initial engines before any other model is removed.
    fn restore_placements(&mut self) -> Result<()> {
        let mut first_error = None;
        for (id, placed) in &self.placements {
            let Ok(entity) = self.world.entity_mut(id) else {
                continue;
            };
            let mut restored = true;
            for engine in &mut self.engines {
                if !placed.contains(engine.id()) || engine.contains_model(id) {
                    continue;
                }
                if let Err(err) = engine.add_entity(entity) {
                    warn!(entity = %id, engine = %engine.id(), error = %err, "re-adding entity on reset failed");
                    first_error.get_or_insert(err);
                    restored = false;
                }
            }
            if !restored {
                continue;
            }
            for engine in &mut self.engines {
                if placed.contains(engine.id()) || !engine.contains_model(id) {
                    continue;
                }
                match engine.remove_entity(entity) {
                    Ok(()) => debug!(entity = %id, engine = %engine.id(), "entity returned to its initial engine"),
                    Err(err) => {
                        warn!(entity = %id, engine = %engine.id(), error = %err, "removing entity on reset failed");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Tear down every engine in reverse configuration order.
    ///
    /// Best effort: every engine is visited even if one fails.
    ///
    /// # Errors
    ///
    /// The first destroy error.
    pub fn destroy(&mut self) -> Result<()> {
        self.playing = false;
        self.commands.clear();
        let mut first_error = None;
        for engine in self.engines.iter_mut().rev() {
            if let Err(err) = engine.destroy() {
                warn!(engine = %engine.id(), error = %err, "engine destroy failed");
                first_error.get_or_insert(err);
            }
        }
        for entity in self.world.iter_mut() {
            if let Ok(body) = entity.body_mut() {
                body.clear_physics_models();
            }
        }
        info!("simulation destroyed");
        first_error.map_or(Ok(()), Err)
    }

    // ==================== Visualizer controls ====================

    /// Start advancing on [`advance`](Self::advance).
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stop advancing; [`step`](Self::step) still works.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Whether the simulation is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Step once if playing.
    ///
    /// # Errors
    ///
    /// As [`step`](Self::step).
    pub fn advance(&mut self) -> Result<Option<StepReport>> {
        if self.playing {
            self.step().map(Some)
        } else {
            Ok(None)
        }
    }

    // ==================== Queries ====================

    /// Nearest entity hit by `ray` across all live engines. Ties go to the
    /// earlier engine, then to the earlier model.
    #[must_use]
    pub fn check_intersection_with_ray(&self, ray: &Ray3) -> Option<RayHit> {
        self.engines
            .iter()
            .filter(|engine| engine.state().is_live())
            .fold(None, |best, engine| {
                query::nearer(best, engine.check_intersection_with_ray(ray))
            })
    }

    /// Engines whose volume contains `point`, in configuration order.
    pub fn engines_containing(&self, point: Point3<f64>) -> impl Iterator<Item = &EngineId> {
        self.engines
            .iter()
            .filter(move |engine| engine.state().is_live() && engine.is_point_contained(&point))
            .map(|engine| engine.id())
    }
}
