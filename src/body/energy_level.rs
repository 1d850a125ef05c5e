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

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// An immutable atomic energy level.
///
/// Levels are compared and ordered solely by their energy, which makes them
/// usable as labels and sort keys for spectra. Once constructed a level
/// never changes.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct EnergyLevel {
    energy: f64,
}

impl EnergyLevel {
    /// Creates a level at the given energy (eV).
    #[inline]
    pub const fn new(energy: f64) -> Self {
        Self { energy }
    }

    /// The energy of this level, in eV.
    #[inline]
    pub const fn energy(&self) -> f64 {
        self.energy
    }
}

impl PartialEq for EnergyLevel {
    fn eq(&self, other: &Self) -> bool {
        self.energy.total_cmp(&other.energy) == Ordering::Equal
    }
}

impl Eq for EnergyLevel {}

impl PartialOrd for EnergyLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EnergyLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.energy.total_cmp(&other.energy)
    }
}
