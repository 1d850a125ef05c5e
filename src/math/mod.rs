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

//! Vector and geometric primitives used by the simulation core.

/// Default tolerance for approximate floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

pub mod geometry;
pub mod vector;

pub use geometry::{segments_intersect, Segment};
pub use vector::Vec2;

/// Performs approximate equality comparison between two floats.
/// # Arguments
/// * `a` - The first float.
/// * `b` - The second float.
/// * `epsilon` - The tolerance for the comparison.
/// # Returns
/// * `true` if the floats are approximately equal, `false` otherwise.
#[inline]
pub fn approx_eq_eps(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Performs approximate equality comparison using the module's default EPSILON.
/// # Arguments
/// * `a` - The first float.
/// * `b` - The second float.
/// # Returns
/// * `true` if the floats are approximately equal, `false` otherwise.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    approx_eq_eps(a, b, EPSILON)
}
