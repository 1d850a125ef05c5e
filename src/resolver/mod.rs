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

//! Interaction and constraint resolution.
//!
//! A [`Resolver`] is the pluggable rule that detects and resolves
//! interactions between bodies once per tick: rigid contacts, circuit
//! network equations, or field propagation. The simulation model invokes
//! every registered resolver after body-local dynamics, in registration
//! order, so interaction decisions always see the latest local state.

pub mod circuit;
pub mod contact;
pub mod field;
pub mod impulse;

pub use circuit::{CircuitResolver, CircuitSolution};
pub use contact::{detect, Contact};
pub use field::{FieldRegion, FieldResolver, WaveField};
pub use impulse::ImpulseResolver;

use rand_pcg::Pcg64Mcg;

use crate::body::{BodyId, BodySet};
use crate::core::config::SimulationConfig;

/// Per-invocation context handed to resolvers.
///
/// Carries the model's seeded random generator (so stochastic rules stay
/// reproducible), the deferred-removal queue, and the immutable simulation
/// configuration.
pub struct ResolveContext<'a> {
    /// Seeded generator for stochastic gates (e.g. absorption sampling).
    pub rng: &'a mut Pcg64Mcg,
    /// Bodies to remove after the resolver pass completes. Resolvers must
    /// not remove bodies directly; queuing keeps iteration stable.
    pub removals: &'a mut Vec<BodyId>,
    /// The simulation configuration (restitution, thresholds, ...).
    pub config: &'a SimulationConfig,
}

/// An interaction rule applied to the body collection each tick.
pub trait Resolver {
    /// Detects and resolves interactions for one tick of length `dt`.
    fn resolve(&mut self, bodies: &mut BodySet, ctx: &mut ResolveContext<'_>, dt: f64);

    /// Called when the body collection changes structurally (body added or
    /// removed, or a batch of topology edits closed). Resolvers that
    /// maintain derived network state re-derive it here.
    fn structure_changed(&mut self, bodies: &mut BodySet, ctx: &mut ResolveContext<'_>) {
        let _ = (bodies, ctx);
    }
}
