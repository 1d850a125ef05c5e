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

//! Simulation configuration.
//!
//! Every numeric knob a model needs lives here, serializable so a host can
//! load it from a file. Configurations are validated once at model
//! construction; a malformed configuration is a startup error, never a
//! mid-run panic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec2;

/// Rejected configurations.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f64),
    #[error("bounds must be finite with min strictly below max on both axes")]
    InvalidBounds,
    #[error("gravity must be finite, got ({0}, {1})")]
    NonFiniteGravity(f64, f64),
    #[error("restitution must be in [0, 1], got {0}")]
    InvalidRestitution(f64),
    #[error("minimum resistance must be finite and positive, got {0}")]
    InvalidMinResistance(f64),
}

/// The rectangular extent of the simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// `true` when the rectangle is finite and has positive area.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// `true` when `point` lies inside or on the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// All tunable parameters of a simulation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fixed timestep, in seconds of simulated time.
    pub dt: f64,
    /// World extent; bounding walls are built from this rectangle.
    pub bounds: Bounds,
    /// Constant acceleration applied to movable discs.
    pub gravity: Vec2,
    /// Seed for the model's random generator. Identical seeds and initial
    /// conditions reproduce identical runs.
    pub seed: u64,
    /// Coefficient of restitution for contacts; `1.0` is perfectly elastic.
    pub restitution: f64,
    /// Floor for branch resistances in the circuit solve, keeping shorts
    /// numerically finite.
    pub min_resistance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            bounds: Bounds::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0)),
            gravity: Vec2::ZERO,
            seed: 0,
            restitution: 1.0,
            min_resistance: 1e-9,
        }
    }
}

impl SimulationConfig {
    /// Checks every field once, at startup.
    ///
    /// ## Errors
    /// The first offending field, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.dt));
        }
        if !self.bounds.is_valid() {
            return Err(ConfigError::InvalidBounds);
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFiniteGravity(self.gravity.x, self.gravity.y));
        }
        if !self.restitution.is_finite() || !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::InvalidRestitution(self.restitution));
        }
        if !self.min_resistance.is_finite() || self.min_resistance <= 0.0 {
            return Err(ConfigError::InvalidMinResistance(self.min_resistance));
        }
        Ok(())
    }
}
