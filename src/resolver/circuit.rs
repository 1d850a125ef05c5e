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

//! Kirchhoff network resolution over circuit branches.
//!
//! Builds the node-voltage system from every [`BodyKind::Branch`] in the
//! collection and solves it by Gaussian elimination with partial pivoting.
//! Node `0` is ground. Batteries are stamped as their Norton equivalent:
//! a current source `emf / r` in parallel with the internal resistance.
//! A singular system (disconnected or degenerate topology) never panics;
//! the solution is marked [`CircuitSolution::Unsolved`] and all branch
//! currents are zeroed.

use std::cell::Cell;
use std::rc::Rc;

use crate::body::{BodyKind, BodySet, BranchElement};
use crate::resolver::{ResolveContext, Resolver};

/// Outcome of the latest network solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitSolution {
    /// Branch currents are consistent with Kirchhoff's laws.
    #[default]
    Solved,
    /// The system was singular; all branch currents were zeroed.
    Unsolved,
}

/// One branch extracted from the body collection.
struct Stamp {
    node_a: usize,
    node_b: usize,
    /// Conductance-effective resistance, clamped to the configured floor.
    resistance: f64,
    /// EMF driving current from `node_a` to `node_b` through the branch.
    emf: f64,
}

/// Resolves the circuit network each tick and whenever the topology changes.
///
/// Holds a shared probe cell so the owner of the simulation can observe the
/// latest [`CircuitSolution`] after the resolver has been boxed away.
#[derive(Debug, Default)]
pub struct CircuitResolver {
    solution: Rc<Cell<CircuitSolution>>,
}

impl CircuitResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle to the latest solve outcome.
    pub fn solution_probe(&self) -> Rc<Cell<CircuitSolution>> {
        Rc::clone(&self.solution)
    }

    fn collect(bodies: &BodySet, min_resistance: f64) -> Vec<(usize, Stamp)> {
        bodies
            .iter()
            .enumerate()
            .filter_map(|(index, body)| match body.kind() {
                BodyKind::Branch {
                    node_a,
                    node_b,
                    element,
                    ..
                } => {
                    let (resistance, emf) = match *element {
                        BranchElement::Resistor { resistance } => (resistance, 0.0),
                        BranchElement::Battery {
                            emf,
                            internal_resistance,
                        } => (internal_resistance, emf),
                    };
                    Some((
                        index,
                        Stamp {
                            node_a: *node_a,
                            node_b: *node_b,
                            resistance: resistance.max(min_resistance),
                            emf,
                        },
                    ))
                }
                _ => None,
            })
            .collect()
    }

    /// Solves the network and writes currents back to the branches.
    fn solve(&mut self, bodies: &mut BodySet, min_resistance: f64) {
        let stamps = Self::collect(bodies, min_resistance);
        if stamps.is_empty() {
            self.solution.set(CircuitSolution::Solved);
            return;
        }

        let node_count = stamps
            .iter()
            .map(|(_, s)| s.node_a.max(s.node_b))
            .max()
            .unwrap_or(0)
            + 1;

        // Node 0 is ground; unknowns are the voltages of nodes 1..n.
        let unknowns = node_count - 1;
        let voltages = if unknowns == 0 {
            Some(Vec::new())
        } else {
            let mut matrix = vec![vec![0.0f64; unknowns]; unknowns];
            let mut rhs = vec![0.0f64; unknowns];

            for (_, stamp) in &stamps {
                let g = 1.0 / stamp.resistance;
                let injection = stamp.emf * g;
                let a = stamp.node_a;
                let b = stamp.node_b;
                if a > 0 {
                    matrix[a - 1][a - 1] += g;
                    rhs[a - 1] -= injection;
                }
                if b > 0 {
                    matrix[b - 1][b - 1] += g;
                    rhs[b - 1] += injection;
                }
                if a > 0 && b > 0 {
                    matrix[a - 1][b - 1] -= g;
                    matrix[b - 1][a - 1] -= g;
                }
            }

            gaussian_elimination(matrix, rhs)
        };

        match voltages {
            Some(voltages) => {
                let v = |node: usize| if node == 0 { 0.0 } else { voltages[node - 1] };
                for (index, stamp) in &stamps {
                    let current =
                        (v(stamp.node_a) - v(stamp.node_b) + stamp.emf) / stamp.resistance;
                    write_current(bodies, *index, current);
                }
                self.solution.set(CircuitSolution::Solved);
            }
            None => {
                log::warn!("singular circuit network; branch currents zeroed");
                for (index, _) in &stamps {
                    write_current(bodies, *index, 0.0);
                }
                self.solution.set(CircuitSolution::Unsolved);
            }
        }
    }
}

fn write_current(bodies: &mut BodySet, index: usize, value: f64) {
    if let Some(id) = bodies.by_index(index).map(|b| b.id()) {
        if let Some(body) = bodies.get_mut(id) {
            if let BodyKind::Branch { current, .. } = body.kind_mut() {
                *current = value;
            }
        }
    }
}

/// Solves `matrix * x = rhs` in place with partial pivoting.
///
/// Returns `None` when a pivot collapses below the singularity threshold.
fn gaussian_elimination(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    const PIVOT_FLOOR: f64 = 1e-12;
    let n = rhs.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot_row][col].abs() < PIVOT_FLOOR {
            return None;
        }
        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for col in (row + 1)..n {
            acc -= matrix[row][col] * solution[col];
        }
        solution[row] = acc / matrix[row][row];
    }
    Some(solution)
}

impl Resolver for CircuitResolver {
    fn resolve(&mut self, bodies: &mut BodySet, ctx: &mut ResolveContext<'_>, _dt: f64) {
        self.solve(bodies, ctx.config.min_resistance);
    }

    fn structure_changed(&mut self, bodies: &mut BodySet, ctx: &mut ResolveContext<'_>) {
        self.solve(bodies, ctx.config.min_resistance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::math::approx_eq_eps;

    fn branch_current(bodies: &BodySet, id: crate::body::BodyId) -> f64 {
        match bodies.get(id).unwrap().kind() {
            BodyKind::Branch { current, .. } => *current,
            other => panic!("expected a branch, got {other:?}"),
        }
    }

    #[test]
    fn series_battery_and_resistor() {
        // 10 V battery (1 ohm internal) in series with a 4 ohm resistor:
        // loop current 10 / 5 = 2 A.
        let mut bodies = BodySet::new();
        let battery = bodies.insert(Body::branch(
            0,
            1,
            BranchElement::Battery {
                emf: 10.0,
                internal_resistance: 1.0,
            },
        ));
        let resistor = bodies.insert(Body::branch(
            1,
            0,
            BranchElement::Resistor { resistance: 4.0 },
        ));

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-9);

        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Solved);
        assert!(approx_eq_eps(branch_current(&bodies, battery), 2.0, 1e-9));
        assert!(approx_eq_eps(branch_current(&bodies, resistor), 2.0, 1e-9));
    }

    #[test]
    fn parallel_resistors_split_the_current() {
        // 6 V battery (negligible internal resistance) across 2 and 3 ohm
        // resistors in parallel: 3 A and 2 A.
        let mut bodies = BodySet::new();
        bodies.insert(Body::branch(
            0,
            1,
            BranchElement::Battery {
                emf: 6.0,
                internal_resistance: 1e-6,
            },
        ));
        let r2 = bodies.insert(Body::branch(
            1,
            0,
            BranchElement::Resistor { resistance: 2.0 },
        ));
        let r3 = bodies.insert(Body::branch(
            1,
            0,
            BranchElement::Resistor { resistance: 3.0 },
        ));

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-9);

        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Solved);
        assert!(approx_eq_eps(branch_current(&bodies, r2), 3.0, 1e-3));
        assert!(approx_eq_eps(branch_current(&bodies, r3), 2.0, 1e-3));
    }

    #[test]
    fn open_branch_carries_no_current() {
        // A lone battery between ground and node 1 forms no loop.
        let mut bodies = BodySet::new();
        let battery = bodies.insert(Body::branch(
            0,
            1,
            BranchElement::Battery {
                emf: 9.0,
                internal_resistance: 0.5,
            },
        ));

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-9);

        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Solved);
        assert!(approx_eq_eps(branch_current(&bodies, battery), 0.0, 1e-9));
    }

    #[test]
    fn floating_subnetwork_is_reported_unsolved() {
        // A branch between nodes 1 and 2, neither grounded: the matrix is
        // singular. Currents must zero out and the probe flips to Unsolved.
        let mut bodies = BodySet::new();
        let floating = bodies.insert(Body::branch(
            1,
            2,
            BranchElement::Battery {
                emf: 5.0,
                internal_resistance: 1.0,
            },
        ));

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-9);

        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Unsolved);
        assert!(approx_eq_eps(branch_current(&bodies, floating), 0.0, 1e-12));
    }

    #[test]
    fn zero_resistance_is_clamped_to_the_floor() {
        // A short (0 ohm resistor) across a battery stays finite thanks to
        // the minimum-resistance clamp.
        let mut bodies = BodySet::new();
        let short = bodies.insert(Body::branch(
            1,
            0,
            BranchElement::Resistor { resistance: 0.0 },
        ));
        bodies.insert(Body::branch(
            0,
            1,
            BranchElement::Battery {
                emf: 1.0,
                internal_resistance: 1.0,
            },
        ));

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-3);

        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Solved);
        let i = branch_current(&bodies, short);
        assert!(i.is_finite());
        // Loop current 1 / (1 + 1e-3), comfortably below 1 A.
        assert!(approx_eq_eps(i, 1.0 / 1.0010, 1e-3));
    }

    #[test]
    fn empty_network_is_trivially_solved() {
        let mut bodies = BodySet::new();
        bodies.insert(Body::disc(crate::math::Vec2::ZERO, crate::math::Vec2::ZERO, 1.0, 1.0).unwrap());

        let mut resolver = CircuitResolver::new();
        resolver.solve(&mut bodies, 1e-9);
        assert_eq!(resolver.solution_probe().get(), CircuitSolution::Solved);
    }
}
