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

//! Impulse-based contact resolution.
//!
//! Runs the narrow-phase over every unordered body pair, then applies an
//! impulse along the contact normal scaled by the inverse masses. Immovable
//! bodies have inverse mass zero and absorb no velocity, which is how walls
//! reflect discs without moving. Contacts against an absorbing wall first
//! roll the model's seeded generator; on success the disc is queued for
//! removal instead of being reflected.

use rand::Rng;

use crate::body::{Body, BodyKind, BodySet};
use crate::resolver::contact::{detect, Contact};
use crate::resolver::{ResolveContext, Resolver};

/// Resolves rigid contacts with elastic (or partially inelastic) impulses.
///
/// The coefficient of restitution comes from the simulation configuration;
/// `1.0` gives perfectly elastic collisions that conserve kinetic energy.
#[derive(Debug, Default)]
pub struct ImpulseResolver;

impl ImpulseResolver {
    pub fn new() -> Self {
        Self
    }

    fn inverse_mass(body: &Body) -> f64 {
        if body.is_movable() {
            1.0 / body.mass()
        } else {
            0.0
        }
    }

    /// `Some(probability)` when this pair is a movable disc against an
    /// absorbing wall; the returned flag tells which side is the disc.
    fn absorption(a: &Body, b: &Body) -> Option<(f64, bool)> {
        match (a.kind(), b.kind()) {
            (BodyKind::Disc { .. }, BodyKind::Wall { absorbing: Some(p), .. })
                if a.is_movable() =>
            {
                Some((*p, true))
            }
            (BodyKind::Wall { absorbing: Some(p), .. }, BodyKind::Disc { .. })
                if b.is_movable() =>
            {
                Some((*p, false))
            }
            _ => None,
        }
    }

    /// Applies the contact impulse and positional correction to one pair.
    fn apply(&self, a: &mut Body, b: &mut Body, contact: &Contact, restitution: f64) {
        let inv_ma = Self::inverse_mass(a);
        let inv_mb = Self::inverse_mass(b);
        let total_inv = inv_ma + inv_mb;
        if total_inv <= 0.0 {
            return;
        }

        let normal = contact.normal;
        let relative = b.velocity() - a.velocity();
        let approach = relative.dot(normal);
        if approach > 0.0 {
            // Already separating; an impulse here would inject energy.
            return;
        }

        let j = -(1.0 + restitution) * approach / total_inv;
        let impulse = normal * j;

        if inv_ma > 0.0 {
            if let Err(e) = a.set_velocity(a.velocity() - impulse * inv_ma) {
                log::error!("impulse produced invalid velocity for {:?}: {e}", a.id());
            }
        }
        if inv_mb > 0.0 {
            if let Err(e) = b.set_velocity(b.velocity() + impulse * inv_mb) {
                log::error!("impulse produced invalid velocity for {:?}: {e}", b.id());
            }
        }

        // Positional correction, shared by inverse mass. For a tunneled
        // disc against a wall the depth exceeds the radius, so this mirrors
        // the center back to the contact side of the plane.
        if contact.depth > 0.0 {
            let share_a = inv_ma / total_inv;
            let share_b = inv_mb / total_inv;
            if share_a > 0.0 {
                let shift = normal * (contact.depth * share_a);
                if let Err(e) = a.translate(-shift.x, -shift.y) {
                    log::error!("correction produced invalid position for {:?}: {e}", a.id());
                }
            }
            if share_b > 0.0 {
                let shift = normal * (contact.depth * share_b);
                if let Err(e) = b.translate(shift.x, shift.y) {
                    log::error!("correction produced invalid position for {:?}: {e}", b.id());
                }
            }
        }
    }
}

impl Resolver for ImpulseResolver {
    fn resolve(&mut self, bodies: &mut BodySet, ctx: &mut ResolveContext<'_>, _dt: f64) {
        let count = bodies.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let contact = {
                    let (Some(a), Some(b)) = (bodies.by_index(i), bodies.by_index(j)) else {
                        continue;
                    };
                    if ctx.removals.contains(&a.id()) || ctx.removals.contains(&b.id()) {
                        continue;
                    }
                    match detect(a, b) {
                        Some(c) => c,
                        None => continue,
                    }
                };

                let Some((a, b)) = bodies.pair_mut(i, j) else {
                    continue;
                };

                if let Some((probability, a_is_disc)) = Self::absorption(a, b) {
                    if ctx.rng.gen::<f64>() < probability {
                        let disc_id = if a_is_disc { a.id() } else { b.id() };
                        log::debug!("disc {disc_id:?} absorbed by wall contact");
                        ctx.removals.push(disc_id);
                        continue;
                    }
                }

                self.apply(a, b, &contact, ctx.config.restitution);
            }
        }
    }
}
