// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Joint extraction and two-axis grid alignment.
//!
//! Segment endpoints are clustered into joints; each joint keeps "hands"
//! pointing at its neighbours. An alignment pass works along one axis
//! direction `d` and only moves joints along the normal `n`:
//!
//! 1. joints linked by a hand parallel to `d` lie on one wall line and must
//!    share their `n` coordinate;
//! 2. line coordinates closer than `alignment` collapse onto one grid value,
//!    which snaps to a blueprint value from earlier floors when one is near;
//! 3. joints on no such line snap to the nearest grid or blueprint value.
//!
//! The grid values of the pass, plus the blueprint values nothing matched,
//! form the blueprint for the next floor.

use nalgebra::Vector2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;
use zonelite_planar::{line_angle_between, perp, unit_from_angle, Point2D, Segment, Tolerances};

use crate::cluster::DisjointSet;
use crate::extend::node_segments;

/// Direction from a joint to one of its neighbours.
#[derive(Debug, Clone, Copy)]
pub struct Hand {
    /// Index of the neighbouring joint.
    pub to: usize,
    /// Unit vector towards it.
    pub direction: Vector2<f64>,
}

/// A clustered segment endpoint.
#[derive(Debug, Clone)]
pub struct Joint {
    pub position: Point2D,
    pub hands: SmallVec<[Hand; 4]>,
}

/// Joints connected by their hands: an undirected planar graph.
#[derive(Debug, Clone, Default)]
pub struct JointGraph {
    pub joints: Vec<Joint>,
}

impl JointGraph {
    /// Cluster endpoints within `distance` into joints ("GetJoints").
    ///
    /// Segments whose two ends fall into the same joint are returned
    /// separately as collapsed. Duplicate edges are merged.
    pub fn from_segments(segments: &[Segment], tol: &Tolerances) -> (JointGraph, Vec<Segment>) {
        let endpoints: Vec<Point2D> = segments.iter().flat_map(|s| [s.start, s.end]).collect();

        let mut order: Vec<usize> = (0..endpoints.len()).collect();
        order.sort_by(|&a, &b| endpoints[a].cmp_xy(&endpoints[b]));
        let mut sets = DisjointSet::new(endpoints.len());
        for (k, &i) in order.iter().enumerate() {
            for &j in &order[k + 1..] {
                if endpoints[j].x - endpoints[i].x > tol.distance {
                    break;
                }
                if endpoints[i].approx_eq(&endpoints[j], tol.distance) {
                    sets.union(i, j);
                }
            }
        }

        let mut joint_of = vec![0usize; endpoints.len()];
        let mut positions = Vec::new();
        for (g, members) in sets.groups().into_iter().enumerate() {
            let n = members.len() as f64;
            let x = members.iter().map(|&i| endpoints[i].x).sum::<f64>() / n;
            let y = members.iter().map(|&i| endpoints[i].y).sum::<f64>() / n;
            positions.push(Point2D::new(x, y));
            for i in members {
                joint_of[i] = g;
            }
        }

        let mut edges = Vec::new();
        let mut collapsed = Vec::new();
        for (k, s) in segments.iter().enumerate() {
            let a = joint_of[2 * k];
            let b = joint_of[2 * k + 1];
            if a == b {
                collapsed.push(*s);
            } else {
                edges.push((a, b));
            }
        }
        (JointGraph::from_edges(&positions, &edges), collapsed)
    }

    /// Build a graph from joint positions and an edge list. Duplicate edges
    /// are merged and joints without edges are dropped.
    pub fn from_edges(positions: &[Point2D], edges: &[(usize, usize)]) -> JointGraph {
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut unique = Vec::with_capacity(edges.len());
        for &(a, b) in edges {
            let key = (a.min(b), a.max(b));
            if a != b && seen.insert(key) {
                unique.push(key);
            }
        }

        let mut remap = vec![usize::MAX; positions.len()];
        let mut joints: Vec<Joint> = Vec::new();
        for &(a, b) in &unique {
            for v in [a, b] {
                if remap[v] == usize::MAX {
                    remap[v] = joints.len();
                    joints.push(Joint {
                        position: positions[v],
                        hands: SmallVec::new(),
                    });
                }
            }
        }
        for (a, b) in unique {
            let (a, b) = (remap[a], remap[b]);
            joints[a].hands.push(Hand {
                to: b,
                direction: Vector2::zeros(),
            });
            joints[b].hands.push(Hand {
                to: a,
                direction: Vector2::zeros(),
            });
        }
        let mut graph = JointGraph { joints };
        graph.refresh_hands();
        graph
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn degree(&self, joint: usize) -> usize {
        self.joints[joint].hands.len()
    }

    pub fn position(&self, joint: usize) -> Point2D {
        self.joints[joint].position
    }

    /// Each undirected edge once, as `(a, b)` with `a < b`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (a, joint) in self.joints.iter().enumerate() {
            for hand in &joint.hands {
                if a < hand.to {
                    edges.push((a, hand.to));
                }
            }
        }
        edges
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.edges()
            .into_iter()
            .map(|(a, b)| Segment::new(self.joints[a].position, self.joints[b].position))
            .collect()
    }

    /// Recompute hand directions from the current joint positions.
    pub fn refresh_hands(&mut self) {
        let positions: Vec<Point2D> = self.joints.iter().map(|j| j.position).collect();
        for joint in &mut self.joints {
            for hand in &mut joint.hands {
                let v = joint.position.vector_to(&positions[hand.to]);
                let n = v.norm();
                hand.direction = if n > f64::EPSILON {
                    v / n
                } else {
                    Vector2::zeros()
                };
            }
        }
    }
}

/// Alignment reference carried from floor to floor.
///
/// Values are normal coordinates of grid lines along the primary and the
/// secondary axis, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub primary: Vec<f64>,
    pub secondary: Vec<f64>,
}

impl Blueprint {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    /// Union with another block's blueprint; values within `distance` merge.
    pub fn merge(&mut self, other: &Blueprint, tol: &Tolerances) {
        self.primary = merge_values(&self.primary, &other.primary, tol.distance);
        self.secondary = merge_values(&self.secondary, &other.secondary, tol.distance);
    }
}

fn merge_values(a: &[f64], b: &[f64], eps: f64) -> Vec<f64> {
    let mut all: Vec<f64> = a.iter().chain(b).copied().collect();
    all.sort_by(f64::total_cmp);
    all.dedup_by(|x, y| (*x - *y).abs() <= eps);
    all
}

/// Outcome of one alignment pass.
#[derive(Debug, Clone, Default)]
pub struct AxisPass {
    /// Blueprint values for this axis on the next floor.
    pub next: Vec<f64>,
    /// Joints that moved.
    pub moved: usize,
}

/// Snap joints onto grid lines normal to the direction at `angle`
/// ("AlignPts").
///
/// Hands are refreshed afterwards. `reference` holds the blueprint values of
/// this axis.
pub fn align_points(
    graph: &mut JointGraph,
    angle: f64,
    reference: &[f64],
    tol: &Tolerances,
) -> AxisPass {
    let d = unit_from_angle(angle);
    let n = perp(&d);
    let coord = |p: &Point2D| p.coords().dot(&n);

    let mut sets = DisjointSet::new(graph.len());
    for (a, joint) in graph.joints.iter().enumerate() {
        for hand in &joint.hands {
            if a < hand.to && line_angle_between(&hand.direction, &d) <= tol.angle {
                sets.union(a, hand.to);
            }
        }
    }
    let lines: Vec<(f64, Vec<usize>)> = sets
        .groups()
        .into_iter()
        .filter(|members| members.len() > 1)
        .map(|members| {
            let total: f64 = members
                .iter()
                .map(|&j| coord(&graph.joints[j].position))
                .sum();
            (total / members.len() as f64, members)
        })
        .collect();

    let mut by_value: Vec<usize> = (0..lines.len()).collect();
    by_value.sort_by(|&a, &b| lines[a].0.total_cmp(&lines[b].0));

    let mut targets = vec![0.0; lines.len()];
    let mut grid: Vec<f64> = Vec::new();
    let mut k = 0;
    while k < by_value.len() {
        let first = lines[by_value[k]].0;
        let mut end = k + 1;
        while end < by_value.len() && lines[by_value[end]].0 - first <= tol.alignment {
            end += 1;
        }
        let members = &by_value[k..end];
        let mean = members.iter().map(|&l| lines[l].0).sum::<f64>() / members.len() as f64;
        let value = nearest_within(mean, reference, tol.alignment).unwrap_or(mean);
        for &l in members {
            targets[l] = value;
        }
        grid.push(value);
        k = end;
    }

    let mut moved = 0;
    let mut on_line = vec![false; graph.len()];
    for (l, (_, members)) in lines.iter().enumerate() {
        for &j in members {
            on_line[j] = true;
            moved += move_to(&mut graph.joints[j].position, &n, targets[l]) as usize;
        }
    }

    let mut snap_values: Vec<f64> = grid.iter().chain(reference).copied().collect();
    snap_values.sort_by(f64::total_cmp);
    for (j, joint) in graph.joints.iter_mut().enumerate() {
        if on_line[j] {
            continue;
        }
        if let Some(value) = nearest_within(coord(&joint.position), &snap_values, tol.alignment) {
            moved += move_to(&mut joint.position, &n, value) as usize;
        }
    }
    graph.refresh_hands();

    let mut next = grid.clone();
    next.extend(
        reference
            .iter()
            .copied()
            .filter(|r| nearest_within(*r, &grid, tol.alignment).is_none()),
    );
    next.sort_by(f64::total_cmp);
    next.dedup_by(|a, b| (*a - *b).abs() <= tol.distance);

    debug!(
        angle,
        lines = lines.len(),
        grid = grid.len(),
        moved,
        "aligned joints"
    );
    AxisPass { next, moved }
}

fn nearest_within(value: f64, candidates: &[f64], reach: f64) -> Option<f64> {
    candidates
        .iter()
        .copied()
        .filter(|c| (c - value).abs() <= reach)
        .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()))
}

/// Move `p` along `n` so that its normal coordinate becomes `target`.
fn move_to(p: &mut Point2D, n: &Vector2<f64>, target: f64) -> bool {
    let delta = target - p.coords().dot(n);
    if delta.abs() <= f64::EPSILON {
        return false;
    }
    *p = p.offset(&(n * delta));
    true
}

/// Aligned graph ready for region detection, plus what was dropped on the
/// way.
#[derive(Debug, Clone, Default)]
pub struct Lattice {
    pub graph: JointGraph,
    /// Collapsed and dangling segments.
    pub debris: Vec<Segment>,
}

/// Rebuild a clean lattice from aligned joints ("GetLattice").
///
/// Alignment can make joints coincide and edges cross, so the edges are noded
/// again and re-clustered. Segments that collapsed to a point and filaments
/// (chains ending in a joint with a single hand) are removed as debris; they
/// cannot bound a region.
pub fn get_lattice(graph: &JointGraph, tol: &Tolerances) -> Lattice {
    let noded = node_segments(&graph.segments(), tol);
    let (rebuilt, mut debris) = JointGraph::from_segments(&noded, tol);

    let positions: Vec<Point2D> = rebuilt.joints.iter().map(|j| j.position).collect();
    let edges = rebuilt.edges();
    let mut alive = vec![true; edges.len()];
    let mut degree: Vec<usize> = (0..rebuilt.len()).map(|j| rebuilt.degree(j)).collect();
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); rebuilt.len()];
    for (e, &(a, b)) in edges.iter().enumerate() {
        incident[a].push(e);
        incident[b].push(e);
    }

    let mut queue: Vec<usize> = (0..degree.len()).filter(|&j| degree[j] == 1).collect();
    while let Some(j) = queue.pop() {
        if degree[j] != 1 {
            continue;
        }
        let Some(&e) = incident[j].iter().find(|&&e| alive[e]) else {
            continue;
        };
        alive[e] = false;
        let (a, b) = edges[e];
        debris.push(Segment::new(positions[a], positions[b]));
        degree[a] -= 1;
        degree[b] -= 1;
        let other = if a == j { b } else { a };
        if degree[other] == 1 {
            queue.push(other);
        }
    }

    let kept: Vec<(usize, usize)> = edges
        .iter()
        .zip(&alive)
        .filter_map(|(&e, &keep)| keep.then_some(e))
        .collect();
    debug!(
        joints = positions.len(),
        edges = kept.len(),
        debris = debris.len(),
        "built lattice"
    );
    Lattice {
        graph: JointGraph::from_edges(&positions, &kept),
        debris,
    }
}
