// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The simulation model: bodies, resolvers, and the notification surface.
//!
//! [`SimulationModel`] owns the body collection and a registration-ordered
//! list of resolvers, and advances them together one fixed step at a time.
//! Observers subscribe to a synchronous [`EventChannel`]; every event is
//! also mirrored onto a thread-safe [`EventBus`] so a consumer on another
//! thread can drain the same stream. Observers never mutate the model
//! directly from a callback; they queue commands on a [`DeferredCommands`]
//! handle and the model applies them between notification waves.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::{Body, BodyId, BodyKind, BodySet, BodyStateError, EnergyLevel};
use crate::core::clock::TickListener;
use crate::core::config::{ConfigError, SimulationConfig};
use crate::event::{EventBus, EventChannel, Subscription};
use crate::math::{Segment, Vec2};
use crate::resolver::{ResolveContext, Resolver};

/// Everything the model announces to its observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    BodyAdded(BodyId),
    BodyRemoved(BodyId),
    /// A body's observable state changed this tick.
    BodyChanged(BodyId),
    /// One full step completed; `time` is the new simulated time.
    Stepped { time: f64 },
    /// A batch of structural edits closed and resolvers re-derived their
    /// network state.
    TopologyChanged,
    Reset,
}

/// Failed model operations addressed at a specific body.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no body with id {0:?}")]
    UnknownBody(BodyId),
    #[error(transparent)]
    State(#[from] BodyStateError),
}

/// Portable kinematic state of one body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyState {
    pub id: BodyId,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// A serializable snapshot of the model's mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub time: f64,
    pub bodies: Vec<BodyState>,
}

enum Command {
    AddBody(Body),
    RemoveBody(BodyId),
}

/// A cloneable handle observers use to request structural changes from
/// inside a notification callback.
///
/// Commands are queued, not applied; the model drains the queue after the
/// current notification wave, so the body collection is never mutated
/// under an iterating observer.
#[derive(Clone)]
pub struct DeferredCommands {
    queue: Rc<RefCell<Vec<Command>>>,
}

impl DeferredCommands {
    /// Queues a body for insertion after the current wave.
    pub fn add_body(&self, body: Body) {
        self.queue.borrow_mut().push(Command::AddBody(body));
    }

    /// Queues a body for removal after the current wave.
    pub fn remove_body(&self, id: BodyId) {
        self.queue.borrow_mut().push(Command::RemoveBody(id));
    }
}

impl std::fmt::Debug for DeferredCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredCommands")
            .field("pending", &self.queue.borrow().len())
            .finish()
    }
}

/// The aggregate root of one simulation.
pub struct SimulationModel {
    config: SimulationConfig,
    bodies: BodySet,
    resolvers: Vec<Box<dyn Resolver>>,
    time: f64,
    rng: Pcg64Mcg,
    channel: EventChannel<SimulationEvent>,
    bus: EventBus<SimulationEvent>,
    pending: Rc<RefCell<Vec<Command>>>,
    initial: Option<BodySet>,
    batch_depth: u32,
    batch_dirty: bool,
}

impl SimulationModel {
    /// Creates an empty model from a validated configuration.
    ///
    /// ## Errors
    /// The first invalid configuration field, as a [`ConfigError`].
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "simulation model initialized (dt = {}, seed = {})",
            config.dt,
            config.seed
        );
        let rng = Pcg64Mcg::seed_from_u64(config.seed);
        Ok(Self {
            config,
            bodies: BodySet::new(),
            resolvers: Vec::new(),
            time: 0.0,
            rng,
            channel: EventChannel::new(),
            bus: EventBus::new(),
            pending: Rc::new(RefCell::new(Vec::new())),
            initial: None,
            batch_depth: 0,
            batch_dirty: false,
        })
    }

    // --- Accessors ---

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulated time elapsed, in seconds.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Summed kinetic energy of every movable body.
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Summed momentum of every movable body.
    pub fn total_momentum(&self) -> Vec2 {
        self.bodies
            .iter()
            .fold(Vec2::ZERO, |acc, b| acc + b.momentum())
    }

    // --- Observation ---

    /// Registers a synchronous observer; callbacks run on the stepping
    /// thread in registration order.
    pub fn observe<F>(&mut self, callback: F) -> Subscription
    where
        F: Fn(&SimulationEvent) + 'static,
    {
        self.channel.subscribe(callback)
    }

    pub fn unobserve(&mut self, subscription: Subscription) {
        self.channel.unsubscribe(subscription);
    }

    /// A receiver draining the same event stream from any thread.
    pub fn event_receiver(&self) -> flume::Receiver<SimulationEvent> {
        self.bus.receiver().clone()
    }

    /// A handle observers use to request structural changes from inside a
    /// callback.
    pub fn deferred(&self) -> DeferredCommands {
        DeferredCommands {
            queue: Rc::clone(&self.pending),
        }
    }

    // --- Structure ---

    /// Registers a resolver and syncs it with the current body collection.
    pub fn add_resolver(&mut self, resolver: Box<dyn Resolver>) {
        self.resolvers.push(resolver);
        self.structure_changed_pass();
    }

    /// Inserts a body, notifies observers, and re-derives resolver state.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = self.bodies.insert(body);
        log::debug!("body {id:?} added");
        self.after_structural_change(SimulationEvent::BodyAdded(id));
        id
    }

    /// Removes a body by id. Unknown ids return `None` and announce nothing.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let removed = self.bodies.remove(id)?;
        log::debug!("body {id:?} removed");
        self.after_structural_change(SimulationEvent::BodyRemoved(id));
        Some(removed)
    }

    /// Builds the four bounding walls of the configured world rectangle.
    pub fn add_bounds_walls(&mut self) -> Vec<BodyId> {
        let b = self.config.bounds;
        let bl = b.min;
        let br = Vec2::new(b.max.x, b.min.y);
        let tr = b.max;
        let tl = Vec2::new(b.min.x, b.max.y);
        [
            Segment::new(bl, br),
            Segment::new(br, tr),
            Segment::new(tr, tl),
            Segment::new(tl, bl),
        ]
        .into_iter()
        .map(|segment| self.add_body(Body::wall(segment)))
        .collect()
    }

    /// Runs several structural edits as one transaction: resolvers see one
    /// re-derivation and observers one `TopologyChanged` when the outermost
    /// batch closes, instead of a full solve per edit.
    pub fn batch<F>(&mut self, edits: F)
    where
        F: FnOnce(&mut Self),
    {
        self.batch_depth += 1;
        edits(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.batch_dirty {
            self.batch_dirty = false;
            self.structure_changed_pass();
            self.notify(SimulationEvent::TopologyChanged);
            self.drain_pending();
        }
    }

    // --- Per-body mutation ---

    pub fn set_body_position(&mut self, id: BodyId, position: Vec2) -> Result<(), ModelError> {
        let body = self.bodies.get_mut(id).ok_or(ModelError::UnknownBody(id))?;
        body.set_position(position)?;
        self.after_body_change(id);
        Ok(())
    }

    pub fn set_body_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), ModelError> {
        let body = self.bodies.get_mut(id).ok_or(ModelError::UnknownBody(id))?;
        body.set_velocity(velocity)?;
        self.after_body_change(id);
        Ok(())
    }

    pub fn translate_body(&mut self, id: BodyId, dx: f64, dy: f64) -> Result<(), ModelError> {
        let body = self.bodies.get_mut(id).ok_or(ModelError::UnknownBody(id))?;
        body.translate(dx, dy)?;
        self.after_body_change(id);
        Ok(())
    }

    pub fn set_body_energy_level(
        &mut self,
        id: BodyId,
        level: Option<EnergyLevel>,
    ) -> Result<(), ModelError> {
        let body = self.bodies.get_mut(id).ok_or(ModelError::UnknownBody(id))?;
        body.set_energy_level(level);
        self.after_body_change(id);
        Ok(())
    }

    // --- Stepping ---

    /// Advances the whole model one step of length `dt`.
    ///
    /// Order within the step is fixed: time advances, every body integrates
    /// its local dynamics, resolvers run in registration order, per-body
    /// change events fire, resolver-requested removals apply, and finally
    /// one `Stepped` event closes the tick.
    pub fn step(&mut self, dt: f64) {
        if self.initial.is_none() {
            // The configuration present when stepping begins is the
            // deterministic initial condition reset() returns to.
            self.initial = Some(self.bodies.clone());
        }

        self.time += dt;
        let gravity = self.config.gravity;
        for body in self.bodies.iter_mut() {
            body.step_in_time(dt, gravity);
        }

        // Branch currents are rewritten by the network resolver; remember
        // them so electrical changes show up in the dirty check below.
        let prior_currents: Vec<(BodyId, f64)> = self
            .bodies
            .iter()
            .filter_map(|b| match b.kind() {
                BodyKind::Branch { current, .. } => Some((b.id(), *current)),
                _ => None,
            })
            .collect();

        let mut removals = Vec::new();
        {
            let mut ctx = ResolveContext {
                rng: &mut self.rng,
                removals: &mut removals,
                config: &self.config,
            };
            for resolver in &mut self.resolvers {
                resolver.resolve(&mut self.bodies, &mut ctx, dt);
            }
        }

        let changed: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|b| !removals.contains(&b.id()))
            .filter(|b| {
                if b.position() != b.prev_position() || b.velocity() != b.prev_velocity() {
                    return true;
                }
                match b.kind() {
                    BodyKind::Branch { current, .. } => prior_currents
                        .iter()
                        .find(|(id, _)| *id == b.id())
                        .is_some_and(|(_, prior)| prior != current),
                    _ => false,
                }
            })
            .map(Body::id)
            .collect();
        for id in changed {
            self.notify(SimulationEvent::BodyChanged(id));
        }

        for id in removals {
            if self.bodies.remove(id).is_some() {
                log::debug!("body {id:?} removed by resolver");
                self.structure_changed_pass();
                self.notify(SimulationEvent::BodyRemoved(id));
            }
        }

        self.notify(SimulationEvent::Stepped { time: self.time });
        self.drain_pending();
    }

    /// Rewinds the model to the initial condition captured at the first
    /// step: bodies, simulated time, and the random generator all return
    /// to their seeded state, so a re-run reproduces the original exactly.
    pub fn reset(&mut self) {
        log::info!("simulation reset at t = {:.4}", self.time);
        if let Some(initial) = &self.initial {
            self.bodies = initial.clone();
        }
        self.time = 0.0;
        self.rng = Pcg64Mcg::seed_from_u64(self.config.seed);
        self.pending.borrow_mut().clear();
        self.structure_changed_pass();
        self.notify(SimulationEvent::Reset);
        self.drain_pending();
    }

    // --- Snapshots ---

    /// Captures the kinematic state of every body.
    pub fn export_state(&self) -> StateSnapshot {
        StateSnapshot {
            time: self.time,
            bodies: self
                .bodies
                .iter()
                .map(|b| BodyState {
                    id: b.id(),
                    position: b.position(),
                    velocity: b.velocity(),
                })
                .collect(),
        }
    }

    /// Restores a previously exported snapshot onto the current body
    /// collection.
    ///
    /// ## Errors
    /// Fails on the first snapshot entry naming an unknown body or carrying
    /// non-finite state. Validation happens before any mutation, so a
    /// rejected snapshot leaves the model exactly as it was.
    pub fn import_state(&mut self, snapshot: &StateSnapshot) -> Result<(), ModelError> {
        for entry in &snapshot.bodies {
            if self.bodies.get(entry.id).is_none() {
                return Err(ModelError::UnknownBody(entry.id));
            }
            if !entry.position.is_finite() {
                return Err(BodyStateError::NonFinitePosition(
                    entry.position.x,
                    entry.position.y,
                )
                .into());
            }
            if !entry.velocity.is_finite() {
                return Err(BodyStateError::NonFiniteVelocity(
                    entry.velocity.x,
                    entry.velocity.y,
                )
                .into());
            }
        }
        for entry in &snapshot.bodies {
            // Every entry was vetted above.
            if let Some(body) = self.bodies.get_mut(entry.id) {
                body.set_position(entry.position)?;
                body.set_velocity(entry.velocity)?;
            }
        }
        self.time = snapshot.time;
        for entry in &snapshot.bodies {
            self.notify(SimulationEvent::BodyChanged(entry.id));
        }
        self.drain_pending();
        Ok(())
    }

    // --- Internals ---

    fn notify(&self, event: SimulationEvent) {
        if self.batch_depth > 0 {
            return;
        }
        self.channel.emit(&event);
        self.bus.publish(event);
    }

    fn after_structural_change(&mut self, event: SimulationEvent) {
        if self.batch_depth > 0 {
            self.batch_dirty = true;
            return;
        }
        self.structure_changed_pass();
        self.notify(event);
        self.drain_pending();
    }

    fn after_body_change(&mut self, id: BodyId) {
        if self.batch_depth > 0 {
            return;
        }
        self.notify(SimulationEvent::BodyChanged(id));
        self.drain_pending();
    }

    fn structure_changed_pass(&mut self) {
        let mut removals = Vec::new();
        let mut ctx = ResolveContext {
            rng: &mut self.rng,
            removals: &mut removals,
            config: &self.config,
        };
        for resolver in &mut self.resolvers {
            resolver.structure_changed(&mut self.bodies, &mut ctx);
        }
        debug_assert!(
            removals.is_empty(),
            "structural re-derivation must not remove bodies"
        );
    }

    /// Applies commands queued by observers. Each applied command triggers
    /// its own notification, which may queue further commands; waves are
    /// capped to break pathological feedback loops.
    fn drain_pending(&mut self) {
        const MAX_WAVES: u32 = 64;
        let mut waves = 0;
        loop {
            let commands: Vec<Command> = self.pending.borrow_mut().drain(..).collect();
            if commands.is_empty() {
                return;
            }
            waves += 1;
            if waves > MAX_WAVES {
                log::warn!("deferred command feedback loop; dropping remaining commands");
                return;
            }
            for command in commands {
                match command {
                    Command::AddBody(body) => {
                        let id = self.bodies.insert(body);
                        log::debug!("deferred body {id:?} added");
                        self.structure_changed_pass();
                        self.notify(SimulationEvent::BodyAdded(id));
                    }
                    Command::RemoveBody(id) => {
                        if self.bodies.remove(id).is_some() {
                            log::debug!("deferred body {id:?} removed");
                            self.structure_changed_pass();
                            self.notify(SimulationEvent::BodyRemoved(id));
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SimulationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationModel")
            .field("time", &self.time)
            .field("bodies", &self.bodies.len())
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

impl TickListener for SimulationModel {
    fn on_tick(&mut self, dt: f64) {
        self.step(dt);
    }
}
