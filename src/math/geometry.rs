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

//! Geometric primitives for contact detection.
//!
//! A [`Segment`] is the geometric footprint of a wall: a finite line with a
//! well-defined line of action (the unit normal along which contact impulses
//! act). Degenerate segments (coincident endpoints) have no normal; callers
//! get `None` and are expected to treat the geometry as inert.

use serde::{Deserialize, Serialize};

use super::{Vec2, EPSILON};

/// A finite 2D line segment between two endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub end1: Vec2,
    pub end2: Vec2,
}

impl Segment {
    /// Creates a new segment between the two endpoints.
    #[inline]
    pub const fn new(end1: Vec2, end2: Vec2) -> Self {
        Self { end1, end2 }
    }

    /// The length of the segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.end1.distance(self.end2)
    }

    /// The midpoint of the segment.
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.end1 + self.end2) * 0.5
    }

    /// The vector from `end1` to `end2`.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end2 - self.end1
    }

    /// `true` when the endpoints coincide and the segment spans no line.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction().length_squared() <= EPSILON * EPSILON
    }

    /// The unit normal of the segment: the line of action a body contacts
    /// the segment along.
    ///
    /// ## Returns
    /// * `Some(unit_normal)`, or `None` for a degenerate segment.
    #[inline]
    pub fn normal(&self) -> Option<Vec2> {
        self.direction().perpendicular().normalize()
    }

    /// Signed perpendicular distance from `point` to the infinite line
    /// through the segment. The sign identifies the side of the line the
    /// point lies on; a sign change between two positions means the line
    /// was crossed.
    ///
    /// ## Returns
    /// * `Some(distance)`, or `None` for a degenerate segment.
    #[inline]
    pub fn signed_distance(&self, point: Vec2) -> Option<f64> {
        self.normal().map(|n| (point - self.end1).dot(n))
    }

    /// Parameter `t` of the foot of the perpendicular from `point` onto the
    /// segment's line, with `t = 0` at `end1` and `t = 1` at `end2`. Values
    /// outside `[0, 1]` mean the perpendicular misses the finite segment.
    ///
    /// ## Returns
    /// * `Some(t)`, or `None` for a degenerate segment.
    #[inline]
    pub fn projection_parameter(&self, point: Vec2) -> Option<f64> {
        let dir = self.direction();
        let len_sq = dir.length_squared();
        if len_sq <= EPSILON * EPSILON {
            None
        } else {
            Some((point - self.end1).dot(dir) / len_sq)
        }
    }

    /// The point on the finite segment closest to `point`.
    #[inline]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        match self.projection_parameter(point) {
            Some(t) => self.end1 + self.direction() * t.clamp(0.0, 1.0),
            None => self.end1,
        }
    }
}

/// Orientation of the ordered triple (a, b, c): positive for a
/// counterclockwise turn, negative for clockwise, zero for colinear.
#[inline]
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i8 {
    let cross = (b - a).cross(c - a);
    if cross.abs() <= EPSILON {
        0
    } else if cross > 0.0 {
        1
    } else {
        -1
    }
}

/// Whether `p`, already known to be colinear with `a` and `b`, lies within
/// their bounding box (and hence on the segment ab).
#[inline]
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Tests whether two finite segments intersect.
///
/// Uses the standard orientation (cross-product sign) test. Touching
/// endpoints and colinear overlap both count as intersecting: contact
/// decisions err on the side of reporting a hit.
pub fn segments_intersect(a: &Segment, b: &Segment) -> bool {
    let o1 = orientation(a.end1, a.end2, b.end1);
    let o2 = orientation(a.end1, a.end2, b.end2);
    let o3 = orientation(b.end1, b.end2, a.end1);
    let o4 = orientation(b.end1, b.end2, a.end2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Colinear / touching cases.
    (o1 == 0 && on_segment(a.end1, a.end2, b.end1))
        || (o2 == 0 && on_segment(a.end1, a.end2, b.end2))
        || (o3 == 0 && on_segment(b.end1, b.end2, a.end1))
        || (o4 == 0 && on_segment(b.end1, b.end2, a.end2))
}
