// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal-cycle extraction on the aligned lattice.
//!
//! Every lattice edge becomes two half-edges. Outgoing half-edges are sorted
//! counter-clockwise around each joint; arriving at a joint, the walk leaves
//! along the half-edge immediately clockwise of the one it came in on. With
//! that rule bounded faces come out counter-clockwise and the unbounded face
//! of each connected component comes out clockwise.
//!
//! An edge with the same face on both sides is a bridge or a leftover
//! filament. Bridges are removed and the faces traced again, so that every
//! face is bounded by a single cycle.

use tracing::debug;
use zonelite_planar::{ortho_hull_of_segments, signed_area, Loop, Point2D, Segment, Tolerances};

use crate::align::{get_lattice, JointGraph};
use crate::cluster::DisjointSet;
use crate::diagnostics::{AnomalyKind, Diagnostics, Geometry};

/// A traced cycle with the connected component it belongs to.
#[derive(Debug, Clone)]
pub struct Face {
    /// Counter-clockwise boundary.
    pub boundary: Loop,
    pub component: usize,
}

/// Faces found on one block's lattice.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Outer boundary of the largest component, counter-clockwise.
    pub shell: Option<Loop>,
    /// Bounded faces of every component.
    pub rooms: Vec<Face>,
    /// Outer boundaries of the other components. These are hole candidates.
    pub islands: Vec<Face>,
    /// Bridge edges removed before the final trace.
    pub bridges: Vec<Segment>,
}

struct Trace {
    /// Rings of joint indices, one per face.
    faces: Vec<Vec<usize>>,
    /// Face on the left of each half-edge.
    face_of: Vec<usize>,
}

/// Half-edge `2e` runs `a -> b` along edge `e = (a, b)`, `2e + 1` runs back.
fn endpoints(edges: &[(usize, usize)], h: usize) -> (usize, usize) {
    let (a, b) = edges[h / 2];
    if h % 2 == 0 {
        (a, b)
    } else {
        (b, a)
    }
}

fn trace(positions: &[Point2D], edges: &[(usize, usize)], alive: &[bool]) -> Trace {
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
    for (e, _) in edges.iter().enumerate().filter(|(e, _)| alive[*e]) {
        for h in [2 * e, 2 * e + 1] {
            outgoing[endpoints(edges, h).0].push(h);
        }
    }

    let mut slot = vec![0usize; edges.len() * 2];
    for (v, list) in outgoing.iter_mut().enumerate() {
        let origin = positions[v];
        list.sort_by(|&a, &b| {
            let pa = positions[endpoints(edges, a).1];
            let pb = positions[endpoints(edges, b).1];
            let angle_a = (pa.y - origin.y).atan2(pa.x - origin.x);
            let angle_b = (pb.y - origin.y).atan2(pb.x - origin.x);
            angle_a.total_cmp(&angle_b)
        });
        for (i, &h) in list.iter().enumerate() {
            slot[h] = i;
        }
    }

    let next = |h: usize| -> usize {
        let v = endpoints(edges, h).1;
        let list = &outgoing[v];
        let n = list.len();
        list[(slot[h ^ 1] + n - 1) % n]
    };

    let mut face_of = vec![usize::MAX; edges.len() * 2];
    let mut faces = Vec::new();
    for start in (0..edges.len() * 2).filter(|h| alive[h / 2]) {
        if face_of[start] != usize::MAX {
            continue;
        }
        let id = faces.len();
        let mut ring = Vec::new();
        let mut h = start;
        while face_of[h] == usize::MAX {
            face_of[h] = id;
            ring.push(endpoints(edges, h).0);
            h = next(h);
        }
        faces.push(ring);
    }
    Trace { faces, face_of }
}

/// Final trace of a graph after bridge removal.
struct Traced {
    positions: Vec<Point2D>,
    edges: Vec<(usize, usize)>,
    alive: Vec<bool>,
    trace: Trace,
    bridges: Vec<Segment>,
}

impl Traced {
    fn ring(&self, face: usize) -> Vec<Point2D> {
        let cycle = &self.trace.faces[face];
        cycle.iter().map(|&v| self.positions[v]).collect()
    }
}

/// Trace until no bridges remain.
fn trace_without_bridges(graph: &JointGraph) -> Traced {
    let positions: Vec<Point2D> = graph.joints.iter().map(|j| j.position).collect();
    let edges = graph.edges();
    let mut alive = vec![true; edges.len()];
    let mut bridges = Vec::new();
    loop {
        let pass = trace(&positions, &edges, &alive);
        let mut removed = false;
        for (e, &(a, b)) in edges.iter().enumerate() {
            if alive[e] && pass.face_of[2 * e] == pass.face_of[2 * e + 1] {
                alive[e] = false;
                bridges.push(Segment::new(positions[a], positions[b]));
                removed = true;
            }
        }
        if !removed {
            return Traced {
                positions,
                edges,
                alive,
                trace: pass,
                bridges,
            };
        }
    }
}

/// Find rooms, the shell and island outlines on an aligned lattice
/// ("DetectRegions").
///
/// Faces with no area or a self-touching boundary are recorded as detection
/// failures and skipped. An outer boundary that is not simple is recorded the
/// same way; if it was the shell the caller falls back to the block outline.
pub fn detect_regions(graph: &JointGraph, tol: &Tolerances, diag: &mut Diagnostics) -> Detection {
    let traced = trace_without_bridges(graph);

    let mut sets = DisjointSet::new(traced.positions.len());
    for (e, &(a, b)) in traced.edges.iter().enumerate() {
        if traced.alive[e] {
            sets.union(a, b);
        }
    }

    let faces = &traced.trace.faces;
    let rings: Vec<Vec<Point2D>> = (0..faces.len()).map(|f| traced.ring(f)).collect();
    let areas: Vec<f64> = rings.iter().map(|r| signed_area(r)).collect();
    let components: Vec<usize> = faces.iter().map(|ring| sets.find(ring[0])).collect();

    // The unbounded face of a component is its most negative cycle.
    let mut outer_of: Vec<(usize, usize)> = Vec::new();
    for (f, &component) in components.iter().enumerate() {
        match outer_of.iter_mut().find(|(c, _)| *c == component) {
            Some((_, best)) if areas[f] < areas[*best] => *best = f,
            Some(_) => {}
            None => outer_of.push((component, f)),
        }
    }

    let mut detection = Detection {
        bridges: traced.bridges,
        ..Default::default()
    };
    let mut outers: Vec<Face> = Vec::new();
    for (f, ring) in rings.iter().enumerate() {
        let component = components[f];
        let is_outer = outer_of.iter().any(|&(_, o)| o == f);
        let face = Loop::from_points(ring, tol)
            .ok()
            .filter(Loop::is_simple)
            .filter(|l| l.is_ccw() != is_outer);
        match face {
            Some(boundary) if is_outer => outers.push(Face {
                boundary: boundary.reversed(),
                component,
            }),
            Some(boundary) => detection.rooms.push(Face {
                boundary,
                component,
            }),
            None => diag.record(
                AnomalyKind::DetectionFailure,
                Geometry::Ring(ring.clone()),
                if is_outer {
                    "outer boundary is degenerate or self-touching"
                } else {
                    "traced face is degenerate or self-touching"
                },
            ),
        }
    }

    outers.sort_by(|a, b| b.boundary.area().total_cmp(&a.boundary.area()));
    let mut outers = outers.into_iter();
    detection.shell = outers.next().map(|f| f.boundary);
    detection.islands = outers.collect();

    debug!(
        faces = rings.len(),
        rooms = detection.rooms.len(),
        islands = detection.islands.len(),
        bridges = detection.bridges.len(),
        "detected regions"
    );
    detection
}

/// Coarse outline of a set of segments ("GetShell").
///
/// The segments are noded and pruned like a lattice and the outer cycle of
/// the largest component is returned. Falls back to the orthogonal hull when
/// no usable cycle exists.
pub fn get_shell(segments: &[Segment], tol: &Tolerances) -> zonelite_planar::Result<Loop> {
    let (graph, _) = JointGraph::from_segments(segments, tol);
    let lattice = get_lattice(&graph, tol);
    let traced = trace_without_bridges(&lattice.graph);

    let outer = (0..traced.trace.faces.len())
        .map(|f| traced.ring(f))
        .filter(|ring| signed_area(ring) < 0.0)
        .filter_map(|ring| Loop::from_points(&ring, tol).ok())
        .filter(Loop::is_simple)
        .max_by(|a, b| a.area().total_cmp(&b.area()));
    match outer {
        Some(l) if l.vertices().len() >= 3 => Ok(l.reversed()),
        _ => ortho_hull_of_segments(segments, tol),
    }
}
