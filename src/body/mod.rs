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

//! The mutable physical state of simulated entities.
//!
//! A [`Body`] is one simulated entity: a moving disc, an immovable wall, or
//! a circuit branch. The kind is a closed sum type; resolvers dispatch on it
//! by pattern matching. Every positional mutation records the previous
//! value, which is what the swept (anti-tunneling) contact tests read.

pub mod energy_level;

pub use energy_level::EnergyLevel;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Segment, Vec2};

/// Opaque handle to a body owned by a simulation model.
///
/// Ids are assigned monotonically on insertion and never reused, so a stale
/// handle can never alias a newer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

/// Rejected state mutations. Setting a non-finite position or velocity is a
/// programming error in the caller; the body stays unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum BodyStateError {
    #[error("position must be finite, got ({0}, {1})")]
    NonFinitePosition(f64, f64),
    #[error("velocity must be finite, got ({0}, {1})")]
    NonFiniteVelocity(f64, f64),
    #[error("mass must be positive (or +inf for immovable bodies), got {0}")]
    InvalidMass(f64),
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f64),
}

/// The electrical element a circuit branch carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchElement {
    /// Ohmic resistor.
    Resistor { resistance: f64 },
    /// Ideal EMF source in series with its internal resistance.
    Battery { emf: f64, internal_resistance: f64 },
}

/// The closed set of body kinds the resolvers know how to interact.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyKind {
    /// A circular body with a radius and an electric charge.
    Disc { radius: f64, charge: f64 },
    /// An immovable finite wall. `absorbing` is the probability that a disc
    /// touching the wall is absorbed (removed) instead of reflected.
    Wall {
        segment: Segment,
        absorbing: Option<f64>,
    },
    /// A branch of a circuit network between two node indices. `current` is
    /// written by the network resolver each solve.
    Branch {
        node_a: usize,
        node_b: usize,
        element: BranchElement,
        current: f64,
    },
}

/// One simulated physical entity.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    kind: BodyKind,
    position: Vec2,
    prev_position: Vec2,
    velocity: Vec2,
    prev_velocity: Vec2,
    mass: f64,
    energy_level: Option<EnergyLevel>,
}

impl Body {
    /// Creates a movable disc.
    ///
    /// ## Arguments
    /// * `position` - Initial position of the center.
    /// * `velocity` - Initial velocity.
    /// * `mass` - Must be positive; `f64::INFINITY` makes the disc immovable.
    /// * `radius` - Geometric extent used by contact detection; must be
    ///   finite and positive.
    pub fn disc(position: Vec2, velocity: Vec2, mass: f64, radius: f64) -> Result<Self, BodyStateError> {
        if !position.is_finite() {
            return Err(BodyStateError::NonFinitePosition(position.x, position.y));
        }
        if !velocity.is_finite() {
            return Err(BodyStateError::NonFiniteVelocity(velocity.x, velocity.y));
        }
        if !(mass > 0.0) {
            return Err(BodyStateError::InvalidMass(mass));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(BodyStateError::InvalidRadius(radius));
        }
        Ok(Self {
            id: BodyId(0),
            kind: BodyKind::Disc {
                radius,
                charge: 0.0,
            },
            position,
            prev_position: position,
            velocity,
            prev_velocity: velocity,
            mass,
            energy_level: None,
        })
    }

    /// Creates an immovable wall spanning the given segment. Walls carry
    /// infinite mass so no impulse can move them.
    pub fn wall(segment: Segment) -> Self {
        // Position the wall at its first endpoint, prev == current.
        Self {
            id: BodyId(0),
            kind: BodyKind::Wall {
                segment,
                absorbing: None,
            },
            position: segment.end1,
            prev_position: segment.end1,
            velocity: Vec2::ZERO,
            prev_velocity: Vec2::ZERO,
            mass: f64::INFINITY,
            energy_level: None,
        }
    }

    /// Creates an absorbing wall: a disc contacting it is removed with the
    /// given probability (sampled from the model's seeded generator) instead
    /// of being reflected.
    pub fn absorbing_wall(segment: Segment, probability: f64) -> Self {
        let mut wall = Self::wall(segment);
        if let BodyKind::Wall { absorbing, .. } = &mut wall.kind {
            *absorbing = Some(probability.clamp(0.0, 1.0));
        }
        wall
    }

    /// Creates a circuit branch between two network nodes. Branches take no
    /// part in spatial dynamics; their state lives in the element fields.
    pub fn branch(node_a: usize, node_b: usize, element: BranchElement) -> Self {
        Self {
            id: BodyId(0),
            kind: BodyKind::Branch {
                node_a,
                node_b,
                element,
                current: 0.0,
            },
            position: Vec2::ZERO,
            prev_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            prev_velocity: Vec2::ZERO,
            mass: f64::INFINITY,
            energy_level: None,
        }
    }

    /// Sets the electric charge of a disc. No-op for other kinds.
    pub fn with_charge(mut self, charge: f64) -> Self {
        if let BodyKind::Disc { charge: c, .. } = &mut self.kind {
            *c = charge;
        }
        self
    }

    // --- Accessors ---

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
    }

    #[inline]
    pub fn kind(&self) -> &BodyKind {
        &self.kind
    }

    /// Mutable access to the kind, for resolvers that write domain state
    /// back (branch currents). Structural invariants (a wall stays a wall)
    /// are the caller's responsibility within the crate.
    pub(crate) fn kind_mut(&mut self) -> &mut BodyKind {
        &mut self.kind
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn prev_position(&self) -> Vec2 {
        self.prev_position
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[inline]
    pub fn prev_velocity(&self) -> Vec2 {
        self.prev_velocity
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// `true` when the body has finite mass and can respond to impulses.
    #[inline]
    pub fn is_movable(&self) -> bool {
        self.mass.is_finite()
    }

    /// The disc radius, if this body is a disc.
    pub fn radius(&self) -> Option<f64> {
        match self.kind {
            BodyKind::Disc { radius, .. } => Some(radius),
            _ => None,
        }
    }

    /// The wall segment, if this body is a wall.
    pub fn wall_segment(&self) -> Option<&Segment> {
        match &self.kind {
            BodyKind::Wall { segment, .. } => Some(segment),
            _ => None,
        }
    }

    #[inline]
    pub fn energy_level(&self) -> Option<EnergyLevel> {
        self.energy_level
    }

    pub fn set_energy_level(&mut self, level: Option<EnergyLevel>) {
        self.energy_level = level;
    }

    // --- State mutation ---

    /// Moves the body, recording the prior position for swept contact tests.
    ///
    /// ## Errors
    /// Rejects non-finite coordinates; the body is left unchanged.
    pub fn set_position(&mut self, position: Vec2) -> Result<(), BodyStateError> {
        if !position.is_finite() {
            return Err(BodyStateError::NonFinitePosition(position.x, position.y));
        }
        self.prev_position = self.position;
        self.position = position;
        Ok(())
    }

    /// Changes the velocity, recording the prior value.
    ///
    /// ## Errors
    /// Rejects non-finite components; the body is left unchanged.
    pub fn set_velocity(&mut self, velocity: Vec2) -> Result<(), BodyStateError> {
        if !velocity.is_finite() {
            return Err(BodyStateError::NonFiniteVelocity(velocity.x, velocity.y));
        }
        self.prev_velocity = self.velocity;
        self.velocity = velocity;
        Ok(())
    }

    /// Displaces the body by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<(), BodyStateError> {
        self.set_position(self.position + Vec2::new(dx, dy))
    }

    /// Advances body-local dynamics by `dt`: semi-implicit Euler under the
    /// given constant acceleration. Immovable bodies and branches have no
    /// free dynamics.
    pub fn step_in_time(&mut self, dt: f64, gravity: Vec2) {
        if !self.is_movable() {
            return;
        }
        if let BodyKind::Disc { .. } = self.kind {
            self.prev_velocity = self.velocity;
            self.velocity = self.velocity + gravity * dt;
            self.prev_position = self.position;
            self.position = self.position + self.velocity * dt;
        }
    }

    /// Kinetic energy of the body. Immovable bodies report zero: they are
    /// infinitely massive but never move.
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_movable() {
            0.5 * self.mass * self.velocity.length_squared()
        } else {
            0.0
        }
    }

    /// Momentum of the body; zero for immovable bodies.
    pub fn momentum(&self) -> Vec2 {
        if self.is_movable() {
            self.velocity * self.mass
        } else {
            Vec2::ZERO
        }
    }
}

/// The insertion-ordered collection of bodies a simulation model owns.
///
/// Iteration order is insertion order, which keeps pairwise resolver passes
/// deterministic: identical initial conditions produce identical pair
/// orderings and therefore identical trajectories.
#[derive(Debug, Default, Clone)]
pub struct BodySet {
    bodies: Vec<Body>,
    next_id: u64,
}

impl BodySet {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 0,
        }
    }

    /// Inserts a body, assigning it a fresh id.
    pub fn insert(&mut self, mut body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.assign_id(id);
        self.bodies.push(body);
        id
    }

    /// Removes and returns the body with the given id, preserving the order
    /// of the remaining bodies.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(index))
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Mutable access to two distinct bodies at once, by index.
    ///
    /// Returns `None` if the indices are equal or out of range.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut Body, &mut Body)> {
        if i == j || i >= self.bodies.len() || j >= self.bodies.len() {
            return None;
        }
        if i < j {
            let (left, right) = self.bodies.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.bodies.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    /// Ids of all bodies, in insertion order.
    pub fn ids(&self) -> Vec<BodyId> {
        self.bodies.iter().map(|b| b.id).collect()
    }

    pub(crate) fn by_index(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    fn unit_disc(x: f64) -> Body {
        Body::disc(Vec2::new(x, 0.0), Vec2::ZERO, 1.0, 1.0).unwrap()
    }

    #[test]
    fn disc_rejects_bad_initial_state() {
        assert!(Body::disc(Vec2::new(f64::NAN, 0.0), Vec2::ZERO, 1.0, 1.0).is_err());
        assert!(Body::disc(Vec2::ZERO, Vec2::new(0.0, f64::INFINITY), 1.0, 1.0).is_err());
        assert!(matches!(
            Body::disc(Vec2::ZERO, Vec2::ZERO, -2.0, 1.0),
            Err(BodyStateError::InvalidMass(_))
        ));
        assert!(matches!(
            Body::disc(Vec2::ZERO, Vec2::ZERO, f64::NAN, 1.0),
            Err(BodyStateError::InvalidMass(_))
        ));
        assert!(matches!(
            Body::disc(Vec2::ZERO, Vec2::ZERO, 1.0, 0.0),
            Err(BodyStateError::InvalidRadius(_))
        ));
        assert!(matches!(
            Body::disc(Vec2::ZERO, Vec2::ZERO, 1.0, f64::NAN),
            Err(BodyStateError::InvalidRadius(_))
        ));
        assert!(matches!(
            Body::disc(Vec2::ZERO, Vec2::ZERO, 1.0, -1.0),
            Err(BodyStateError::InvalidRadius(_))
        ));
        // Infinite mass is a valid immovable body.
        let immovable = Body::disc(Vec2::ZERO, Vec2::ZERO, f64::INFINITY, 1.0).unwrap();
        assert!(!immovable.is_movable());
    }

    #[test]
    fn setters_record_previous_state() {
        let mut body = unit_disc(0.0);
        body.set_position(Vec2::new(2.0, 3.0)).unwrap();
        assert_eq!(body.prev_position(), Vec2::ZERO);
        assert_eq!(body.position(), Vec2::new(2.0, 3.0));

        body.set_velocity(Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(body.prev_velocity(), Vec2::ZERO);
        assert_eq!(body.velocity(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn setters_reject_non_finite_and_leave_state_intact() {
        let mut body = unit_disc(1.0);
        let before = body.position();
        assert!(body.set_position(Vec2::new(f64::NAN, 0.0)).is_err());
        assert_eq!(body.position(), before);
        assert!(body.set_velocity(Vec2::new(f64::NEG_INFINITY, 0.0)).is_err());
        assert_eq!(body.velocity(), Vec2::ZERO);
    }

    #[test]
    fn step_in_time_is_semi_implicit_euler() {
        let mut body = Body::disc(Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0, 0.5).unwrap();
        let gravity = Vec2::new(0.0, -10.0);
        body.step_in_time(0.1, gravity);
        // Velocity updates first, then position uses the new velocity.
        assert_eq!(body.velocity(), Vec2::new(1.0, -1.0));
        assert_eq!(body.position(), Vec2::new(0.1, -0.1));
        assert_eq!(body.prev_position(), Vec2::ZERO);
    }

    #[test]
    fn walls_are_immovable_and_inert() {
        let segment = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0));
        let mut wall = Body::wall(segment);
        assert!(!wall.is_movable());
        assert_eq!(wall.mass(), f64::INFINITY);
        assert!(approx_eq(wall.kinetic_energy(), 0.0));
        assert_eq!(wall.momentum(), Vec2::ZERO);

        wall.step_in_time(0.1, Vec2::new(0.0, -10.0));
        assert_eq!(wall.position(), segment.end1);
    }

    #[test]
    fn derived_energy_and_momentum() {
        let body = Body::disc(Vec2::ZERO, Vec2::new(3.0, 4.0), 2.0, 1.0).unwrap();
        assert!(approx_eq(body.kinetic_energy(), 0.5 * 2.0 * 25.0));
        assert_eq!(body.momentum(), Vec2::new(6.0, 8.0));
    }

    #[test]
    fn body_set_assigns_monotonic_ids_in_order() {
        let mut set = BodySet::new();
        let a = set.insert(unit_disc(0.0));
        let b = set.insert(unit_disc(1.0));
        let c = set.insert(unit_disc(2.0));
        assert!(a < b && b < c);
        assert_eq!(set.ids(), vec![a, b, c]);

        set.remove(b);
        assert_eq!(set.ids(), vec![a, c]);
        // Ids are never reused.
        let d = set.insert(unit_disc(3.0));
        assert!(d > c);
    }

    #[test]
    fn pair_mut_returns_distinct_bodies() {
        let mut set = BodySet::new();
        set.insert(unit_disc(0.0));
        set.insert(unit_disc(1.0));

        let (a, b) = set.pair_mut(0, 1).unwrap();
        a.set_velocity(Vec2::new(1.0, 0.0)).unwrap();
        b.set_velocity(Vec2::new(-1.0, 0.0)).unwrap();

        assert!(set.pair_mut(0, 0).is_none());
        assert!(set.pair_mut(0, 5).is_none());
    }

    #[test]
    fn branch_carries_element_state() {
        let branch = Body::branch(0, 1, BranchElement::Resistor { resistance: 5.0 });
        match branch.kind() {
            BodyKind::Branch {
                node_a,
                node_b,
                element,
                current,
            } => {
                assert_eq!((*node_a, *node_b), (0, 1));
                assert_eq!(*element, BranchElement::Resistor { resistance: 5.0 });
                assert_eq!(*current, 0.0);
            }
            other => panic!("expected a branch, got {other:?}"),
        }
    }
}
