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

//! A deterministic fixed-timestep 2D simulation core.
//!
//! Bodies (discs, walls, circuit branches) live in a [`core::SimulationModel`]
//! and advance in constant increments of simulated time, driven by a
//! [`core::SimulationClock`]. Pluggable resolvers handle interactions:
//! impulse contacts with swept anti-tunneling wall tests, Kirchhoff network
//! solving, and scalar wave-field propagation. Observers watch the model
//! through typed event channels; nothing in this crate renders, so any view
//! layer can sit on top.

pub mod body;
pub mod core;
pub mod event;
pub mod math;
pub mod resolver;

pub use crate::core::{SimulationClock, SimulationConfig, SimulationEvent, SimulationModel};
pub use body::{Body, BodyId, BodyKind, BranchElement};
pub use math::{Segment, Vec2};
