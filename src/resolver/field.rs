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

//! Scalar wave-field propagation on a fixed grid.
//!
//! The field advances by the standard leapfrog discretization of the 2D
//! wave equation: the next amplitude at a cell is derived from the current
//! and previous amplitudes plus the discrete Laplacian, then scaled by the
//! damping factor. Boundary cells are clamped to zero. Named regions carve
//! the grid into mutually exclusive column bands, so per-region intensities
//! sum to the whole-field intensity without double counting.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::body::BodySet;
use crate::resolver::{ResolveContext, Resolver};

/// Ill-formed region requests.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("regions '{0}' and '{1}' overlap; regions must be mutually exclusive")]
    OverlappingRegions(String, String),
    #[error("region '{0}' spans no columns")]
    EmptyRegion(String),
}

/// A named, half-open band of grid columns `[min_x, max_x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRegion {
    pub name: String,
    pub min_x: usize,
    pub max_x: usize,
}

impl FieldRegion {
    pub fn new(name: impl Into<String>, min_x: usize, max_x: usize) -> Self {
        Self {
            name: name.into(),
            min_x,
            max_x,
        }
    }

    #[inline]
    fn contains(&self, x: usize) -> bool {
        (self.min_x..self.max_x).contains(&x)
    }

    #[inline]
    fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x && other.min_x < self.max_x
    }
}

/// The amplitudes of one region, zeroed everywhere outside it.
#[derive(Debug, Clone)]
pub struct RegionField {
    pub name: String,
    pub values: Vec<f64>,
}

impl RegionField {
    /// Total intensity (summed squared amplitude) of the region.
    pub fn intensity(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}

/// A discrete scalar field obeying the damped wave equation.
#[derive(Debug, Clone)]
pub struct WaveField {
    width: usize,
    height: usize,
    current: Vec<f64>,
    previous: Vec<f64>,
    wave_speed: f64,
    damping: f64,
    cfl_warned: bool,
}

impl WaveField {
    /// Creates a zeroed field.
    ///
    /// ## Arguments
    /// * `width`, `height` - Grid dimensions in cells.
    /// * `wave_speed` - Propagation speed in cells per unit time.
    /// * `damping` - Per-step amplitude multiplier in `(0, 1]`.
    pub fn new(width: usize, height: usize, wave_speed: f64, damping: f64) -> Self {
        Self {
            width,
            height,
            current: vec![0.0; width * height],
            previous: vec![0.0; width * height],
            wave_speed,
            damping: damping.clamp(0.0, 1.0),
            cfl_warned: false,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// The amplitude at `(x, y)`; out-of-range cells read zero.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        if x < self.width && y < self.height {
            self.current[self.index(x, y)]
        } else {
            0.0
        }
    }

    /// Sets the amplitude at `(x, y)`. Boundary and out-of-range cells are
    /// silently ignored; the boundary condition is amplitude zero.
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        if x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.current[i] = value;
    }

    /// Total intensity (summed squared amplitude) over the whole grid.
    pub fn intensity(&self) -> f64 {
        self.current.iter().map(|v| v * v).sum()
    }

    /// Advances the field one tick of length `dt`.
    pub fn step(&mut self, dt: f64) {
        if self.width < 3 || self.height < 3 {
            return;
        }

        let coeff = (self.wave_speed * dt) * (self.wave_speed * dt);
        if coeff > 0.5 && !self.cfl_warned {
            log::warn!(
                "wave step coefficient {coeff:.3} exceeds the stability bound; \
                 reduce dt or the wave speed"
            );
            self.cfl_warned = true;
        }

        let mut next = vec![0.0; self.current.len()];
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                let i = self.index(x, y);
                let laplacian = self.current[i - 1]
                    + self.current[i + 1]
                    + self.current[i - self.width]
                    + self.current[i + self.width]
                    - 4.0 * self.current[i];
                next[i] =
                    (2.0 * self.current[i] - self.previous[i] + coeff * laplacian) * self.damping;
            }
        }

        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Splits the field into the given named regions, each zeroed outside
    /// its own columns.
    ///
    /// ## Errors
    /// Rejects empty and mutually overlapping regions; exclusivity is what
    /// guarantees the per-region intensities add up without double counting.
    pub fn split(&self, regions: &[FieldRegion]) -> Result<Vec<RegionField>, FieldError> {
        for region in regions {
            if region.min_x >= region.max_x {
                return Err(FieldError::EmptyRegion(region.name.clone()));
            }
        }
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.overlaps(b) {
                    return Err(FieldError::OverlappingRegions(
                        a.name.clone(),
                        b.name.clone(),
                    ));
                }
            }
        }

        Ok(regions
            .iter()
            .map(|region| {
                let mut values = vec![0.0; self.current.len()];
                for y in 0..self.height {
                    for x in 0..self.width {
                        if region.contains(x) {
                            let i = self.index(x, y);
                            values[i] = self.current[i];
                        }
                    }
                }
                RegionField {
                    name: region.name.clone(),
                    values,
                }
            })
            .collect())
    }

    /// Per-region intensities, in region order.
    pub fn split_intensity(
        &self,
        regions: &[FieldRegion],
    ) -> Result<Vec<(String, f64)>, FieldError> {
        Ok(self
            .split(regions)?
            .into_iter()
            .map(|r| (r.name, r.values.iter().map(|v| v * v).sum()))
            .collect())
    }
}

/// Advances a shared [`WaveField`] once per tick.
///
/// The field lives behind `Rc<RefCell<_>>` so its creator keeps a handle
/// for sourcing amplitudes and reading the grid while the resolver owns
/// the propagation.
#[derive(Debug)]
pub struct FieldResolver {
    field: Rc<RefCell<WaveField>>,
}

impl FieldResolver {
    pub fn new(field: Rc<RefCell<WaveField>>) -> Self {
        Self { field }
    }

    pub fn field(&self) -> Rc<RefCell<WaveField>> {
        Rc::clone(&self.field)
    }
}

impl Resolver for FieldResolver {
    fn resolve(&mut self, _bodies: &mut BodySet, _ctx: &mut ResolveContext<'_>, dt: f64) {
        self.field.borrow_mut().step(dt);
    }
}
