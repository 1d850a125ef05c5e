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

//! Provides the 2D vector type and its associated operations.

use serde::{Deserialize, Serialize};

use super::EPSILON;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 2-dimensional vector with `f64` components.
///
/// Positions, velocities and forces in the simulation core are all `Vec2`.
/// The type is `Copy`; all operations return new values.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };
    pub const X: Self = Self { x: 1.0, y: 0.0 };
    pub const Y: Self = Self { x: 0.0, y: 1.0 };

    /// Creates a new Vec2 instance.
    /// ## Arguments
    /// * `x` - The x component of the vector.
    /// * `y` - The y component of the vector.
    /// ## Returns
    /// * A new Vec2 instance with the specified components.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns a new vector with the absolute value of each component.
    #[inline]
    pub const fn abs(self) -> Self {
        Self {
            x: if self.x < 0.0 { -self.x } else { self.x },
            y: if self.y < 0.0 { -self.y } else { self.y },
        }
    }

    /// Returns `true` if both components are finite (not NaN and not infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Calculates the squared magnitude (length) of the vector.
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.dot(*self)
    }

    /// Calculates the magnitude (length) of the vector.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Normalizes the vector to unit length.
    ///
    /// ## Returns
    /// * `Some(unit_vector)` if the length is non-zero, `None` otherwise.
    ///   Normalizing a zero vector has no defined direction, so the failure
    ///   is explicit rather than silently returning zero.
    #[inline]
    pub fn normalize(&self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq > EPSILON * EPSILON {
            Some(*self * (1.0 / len_sq.sqrt()))
        } else {
            None
        }
    }

    /// Rescales the vector to the given magnitude, preserving its direction.
    ///
    /// ## Arguments
    /// * `magnitude` - The desired length of the result.
    /// ## Returns
    /// * `Some(vector)` with the requested length, or `None` if this vector
    ///   is zero (no direction to preserve).
    #[inline]
    pub fn with_magnitude(&self, magnitude: f64) -> Option<Self> {
        self.normalize().map(|unit| unit * magnitude)
    }

    /// Calculates the dot product between this vector and another.
    /// ## Arguments
    /// * `rhs` - The other vector to compute the dot product with.
    /// ## Returns
    /// * The dot product of the two vectors.
    #[inline]
    pub fn dot(&self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// The z component of the 3D cross product of the two vectors.
    ///
    /// Its sign gives the orientation of the turn from `self` to `rhs`,
    /// which is what the segment-intersection tests are built on.
    #[inline]
    pub fn cross(&self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// A vector perpendicular to this one (rotated 90 degrees counterclockwise).
    #[inline]
    pub fn perpendicular(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Returns the distance squared between this vector and another vector.
    #[inline]
    pub fn distance_squared(&self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Returns the distance between this vector and another vector.
    #[inline]
    pub fn distance(&self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation between two vectors.
    /// ## Arguments
    /// * `start` - The starting vector.
    /// * `end` - The ending vector.
    /// * `t` - The interpolation factor (0.0 to 1.0).
    /// ## Returns
    /// * A new Vec2 instance that is the result of the interpolation.
    #[inline]
    pub fn lerp(start: Self, end: Self, t: f64) -> Self {
        start + (end - start) * t.clamp(0.0, 1.0)
    }
}

// --- Operator Overloads ---

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: Vec2) -> Self::Output {
        rhs * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        let inv_rhs = 1.0 / rhs;
        Self {
            x: self.x * inv_rhs,
            y: self.y * inv_rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    fn vec2_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    #[test]
    fn test_new_and_constants() {
        let v = Vec2::new(1.0, 2.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(Vec2::ZERO, Vec2::new(0.0, 0.0));
        assert_eq!(Vec2::ONE, Vec2::new(1.0, 1.0));
        assert_eq!(Vec2::X, Vec2::new(1.0, 0.0));
        assert_eq!(Vec2::Y, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_ops() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(3.0, 4.0);
        assert_eq!(v1 + v2, Vec2::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vec2::new(2.0, 2.0));
        assert_eq!(v1 * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(3.0 * v1, Vec2::new(3.0, 6.0));
        assert_eq!(-v1, Vec2::new(-1.0, -2.0));
        assert!(vec2_approx_eq(
            Vec2::new(4.0, 6.0) / 2.0,
            Vec2::new(2.0, 3.0)
        ));
    }

    #[test]
    fn test_dot_and_cross() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(3.0, 4.0);
        assert!(approx_eq(v1.dot(v2), 11.0));
        assert!(approx_eq(v1.cross(v2), 1.0 * 4.0 - 2.0 * 3.0));
        // Orthogonal vectors
        assert!(approx_eq(Vec2::X.dot(Vec2::Y), 0.0));
    }

    #[test]
    fn test_length() {
        let v = Vec2::new(3.0, 4.0);
        assert!(approx_eq(v.length_squared(), 25.0));
        assert!(approx_eq(v.length(), 5.0));
        assert!(approx_eq(Vec2::ZERO.length(), 0.0));
    }

    #[test]
    fn test_normalize() {
        let v = Vec2::new(3.0, 0.0);
        let unit = v.normalize().expect("non-zero vector must normalize");
        assert!(vec2_approx_eq(unit, Vec2::X));
        assert!(approx_eq(unit.length(), 1.0));

        // Normalizing the zero vector must fail explicitly.
        assert!(Vec2::ZERO.normalize().is_none());
    }

    #[test]
    fn test_with_magnitude() {
        let v = Vec2::new(0.0, 2.0);
        let rescaled = v.with_magnitude(5.0).expect("non-zero vector");
        assert!(vec2_approx_eq(rescaled, Vec2::new(0.0, 5.0)));
        assert!(Vec2::ZERO.with_magnitude(5.0).is_none());
    }

    #[test]
    fn test_perpendicular() {
        let v = Vec2::new(2.0, 0.0);
        let p = v.perpendicular();
        assert!(approx_eq(v.dot(p), 0.0));
        assert!(vec2_approx_eq(p, Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_distance() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert!(approx_eq(a.distance_squared(b), 25.0));
        assert!(approx_eq(a.distance(b), 5.0));
    }

    #[test]
    fn test_lerp() {
        let start = Vec2::new(0.0, 10.0);
        let end = Vec2::new(10.0, 0.0);
        assert!(vec2_approx_eq(Vec2::lerp(start, end, 0.0), start));
        assert!(vec2_approx_eq(Vec2::lerp(start, end, 1.0), end));
        assert!(vec2_approx_eq(
            Vec2::lerp(start, end, 0.5),
            Vec2::new(5.0, 5.0)
        ));
        // Test clamping
        assert!(vec2_approx_eq(Vec2::lerp(start, end, -0.5), start));
        assert!(vec2_approx_eq(Vec2::lerp(start, end, 1.5), end));
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec2::new(1.0, -2.0).is_finite());
        assert!(!Vec2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f64::INFINITY).is_finite());
    }
}
