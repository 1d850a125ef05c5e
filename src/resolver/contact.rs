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

//! Narrow-phase contact detection between body pairs.
//!
//! Detection is pure: it inspects positions (current and previous) and
//! produces a [`Contact`] or nothing. The wall test is swept: besides the
//! instantaneous perpendicular-distance check it looks for a sign change of
//! the signed distance between the previous and current tick, so a fast
//! body cannot tunnel through a wall in a single step.

use crate::body::{Body, BodyId, BodyKind};
use crate::math::{Vec2, EPSILON};

/// A detected contact between two bodies.
///
/// `normal` is the unit line of action, oriented from body `a` toward body
/// `b`. `depth` is how far `a` has moved past the contact plane along the
/// normal; a tunneled body reports a depth greater than its radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub normal: Vec2,
    pub depth: f64,
}

impl Contact {
    /// The same contact seen from the other body: endpoints swapped and the
    /// normal flipped.
    #[inline]
    pub fn inverted(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

/// Tests an unordered pair of bodies for contact.
///
/// Dispatches on the kinds of both bodies. Pairs with no physical contact
/// semantics (wall-wall, anything involving a circuit branch) yield `None`.
/// Detection is symmetric: `detect(b, a)` is `detect(a, b).inverted()`.
pub fn detect(a: &Body, b: &Body) -> Option<Contact> {
    match (a.kind(), b.kind()) {
        (BodyKind::Disc { .. }, BodyKind::Disc { .. }) => disc_disc(a, b),
        (BodyKind::Disc { .. }, BodyKind::Wall { .. }) => disc_wall(a, b),
        (BodyKind::Wall { .. }, BodyKind::Disc { .. }) => {
            disc_wall(b, a).map(Contact::inverted)
        }
        _ => None,
    }
}

/// Instantaneous overlap test between two discs.
fn disc_disc(a: &Body, b: &Body) -> Option<Contact> {
    let (ra, rb) = (a.radius()?, b.radius()?);
    let delta = b.position() - a.position();
    let dist_sq = delta.length_squared();
    let sum = ra + rb;
    if dist_sq >= sum * sum {
        return None;
    }
    let Some(normal) = delta.normalize() else {
        // Coincident centers give no line of action; skip rather than guess.
        log::warn!(
            "coincident disc centers ({:?}, {:?}); contact skipped",
            a.id(),
            b.id()
        );
        return None;
    };
    Some(Contact {
        a: a.id(),
        b: b.id(),
        normal,
        depth: sum - dist_sq.sqrt(),
    })
}

/// Swept disc-wall test.
///
/// A disc contacts a wall when either its perpendicular distance to the
/// wall line is within its radius, or the signed distance flipped sign
/// since the previous tick (the disc stepped over the line). Either way the
/// foot of the perpendicular must land on the finite segment for the hit
/// to count.
fn disc_wall(disc: &Body, wall: &Body) -> Option<Contact> {
    let radius = disc.radius()?;
    let segment = wall.wall_segment()?;
    if segment.is_degenerate() {
        log::warn!("degenerate wall segment on {:?}; treated as inert", wall.id());
        return None;
    }

    let normal = segment.normal()?;
    let sd_now = segment.signed_distance(disc.position())?;
    let sd_prev = segment.signed_distance(disc.prev_position())?;

    let within_radius = sd_now.abs() <= radius;
    let crossed = sd_now * sd_prev < 0.0;
    if !within_radius && !crossed {
        return None;
    }

    // Finite-segment confirmation: the perpendicular must hit the wall, not
    // its extension.
    let t = segment.projection_parameter(disc.position())?;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    // The side the disc approached from. When the center sits exactly on
    // the line, fall back to the previous side.
    let side = if sd_prev.abs() > EPSILON {
        sd_prev.signum()
    } else if sd_now.abs() > EPSILON {
        sd_now.signum()
    } else {
        1.0
    };

    Some(Contact {
        a: disc.id(),
        b: wall.id(),
        normal: -(normal * side),
        depth: radius - side * sd_now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Segment};

    fn disc_at(pos: Vec2, vel: Vec2, radius: f64) -> Body {
        Body::disc(pos, vel, 1.0, radius).unwrap()
    }

    fn vertical_wall_at_x10() -> Body {
        Body::wall(Segment::new(Vec2::new(10.0, -5.0), Vec2::new(10.0, 5.0)))
    }

    #[test]
    fn overlapping_discs_produce_a_contact() {
        let a = disc_at(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        let b = disc_at(Vec2::new(1.5, 0.0), Vec2::ZERO, 1.0);
        let contact = detect(&a, &b).expect("discs overlap");
        assert!(approx_eq(contact.depth, 0.5));
        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn separated_discs_do_not_touch() {
        let a = disc_at(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        let b = disc_at(Vec2::new(2.5, 0.0), Vec2::ZERO, 1.0);
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn detection_is_symmetric() {
        let a = disc_at(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        let b = disc_at(Vec2::new(1.0, 1.0), Vec2::ZERO, 1.0);
        let ab = detect(&a, &b).unwrap();
        let ba = detect(&b, &a).unwrap();
        assert_eq!(ba, ab.inverted());
    }

    #[test]
    fn coincident_discs_are_skipped() {
        let a = disc_at(Vec2::new(3.0, 3.0), Vec2::ZERO, 1.0);
        let b = disc_at(Vec2::new(3.0, 3.0), Vec2::ZERO, 1.0);
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn disc_touching_wall_by_distance() {
        let disc = disc_at(Vec2::new(9.5, 0.0), Vec2::new(1.0, 0.0), 1.0);
        let wall = vertical_wall_at_x10();
        let contact = detect(&disc, &wall).expect("within radius of the wall");
        // Normal points from the disc toward the wall plane (+x here).
        assert!(approx_eq(contact.normal.x, 1.0));
        assert!(approx_eq(contact.depth, 0.5));
    }

    #[test]
    fn fast_disc_crossing_wall_is_caught() {
        // One 0.1 s tick at 5 u/s moves the center from 9.8 to 10.3, past
        // the wall at x = 10 without ever sitting within a 0.1 radius of it.
        let mut disc = disc_at(Vec2::new(9.8, 0.0), Vec2::new(5.0, 0.0), 0.1);
        disc.set_position(Vec2::new(10.3, 0.0)).unwrap();
        let wall = vertical_wall_at_x10();

        let contact = detect(&disc, &wall).expect("swept test must catch the crossing");
        // Depth exceeds the radius: the center is already past the plane.
        assert!(contact.depth > 0.1);
        assert!(approx_eq(contact.depth, 0.1 + 0.3));
        assert!(approx_eq(contact.normal.x, 1.0));
    }

    #[test]
    fn crossing_beyond_the_finite_segment_misses() {
        let mut disc = disc_at(Vec2::new(9.8, 8.0), Vec2::new(5.0, 0.0), 0.1);
        disc.set_position(Vec2::new(10.3, 8.0)).unwrap();
        // The wall only spans y in [-5, 5]; at y = 8 the disc passes beside it.
        let wall = vertical_wall_at_x10();
        assert!(detect(&disc, &wall).is_none());
    }

    #[test]
    fn degenerate_wall_is_inert() {
        let disc = disc_at(Vec2::new(0.0, 0.0), Vec2::ZERO, 5.0);
        let wall = Body::wall(Segment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)));
        assert!(detect(&disc, &wall).is_none());
    }

    #[test]
    fn walls_and_branches_never_contact_each_other() {
        let w1 = vertical_wall_at_x10();
        let w2 = Body::wall(Segment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0)));
        assert!(detect(&w1, &w2).is_none());

        let branch = Body::branch(0, 1, crate::body::BranchElement::Resistor { resistance: 1.0 });
        let disc = disc_at(Vec2::ZERO, Vec2::ZERO, 1.0);
        assert!(detect(&branch, &disc).is_none());
        assert!(detect(&disc, &branch).is_none());
    }
}
