// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed loops and the polygon queries used by detection and tessellation.
//!
//! A [`Loop`] always repeats its first vertex at the end. It can only be built
//! through [`Loop::from_points`], which rejects degenerate input, so every
//! loop in the pipeline is closed and has at least 4 stored points.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::{cross, Point2D};
use crate::segment::Segment;
use crate::tolerance::Tolerances;

/// Exact closure tolerance when deserialising a loop.
const CLOSURE_EPSILON: f64 = 1e-9;

/// Where a point lies relative to a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

/// An immutable closed polygon loop (`first == last`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct Loop {
    points: Vec<Point2D>,
}

impl Loop {
    /// Build a loop from an open or closed vertex ring.
    ///
    /// Consecutive vertices closer than `tol.distance` are merged and an
    /// explicit closing vertex is dropped before validation.
    pub fn from_points(points: &[Point2D], tol: &Tolerances) -> Result<Loop> {
        let mut ring: Vec<Point2D> = Vec::with_capacity(points.len() + 1);
        for p in points {
            if ring.last().map_or(true, |q: &Point2D| !q.approx_eq(p, tol.distance)) {
                ring.push(*p);
            }
        }
        while ring.len() > 1 && ring[0].approx_eq(&ring[ring.len() - 1], tol.distance) {
            ring.pop();
        }

        let area = signed_area(&ring);
        if ring.len() < 3 || area.abs() < tol.min_area() {
            return Err(Error::DegenerateLoop {
                vertices: ring.len(),
                area: area.abs(),
            });
        }

        ring.push(ring[0]);
        Ok(Loop { points: ring })
    }

    /// Closed point list, last == first.
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Distinct vertices, without the closing repeat.
    pub fn vertices(&self) -> &[Point2D] {
        &self.points[..self.points.len() - 1]
    }

    /// Number of stored points including the closing repeat (always >= 4).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> Point2D {
        self.points[0]
    }

    pub fn last(&self) -> Point2D {
        self.points[self.points.len() - 1]
    }

    /// Positive for counter-clockwise loops.
    pub fn signed_area(&self) -> f64 {
        signed_area(self.vertices())
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reversed(&self) -> Loop {
        let mut points = self.points.clone();
        points.reverse();
        Loop { points }
    }

    pub fn to_ccw(&self) -> Loop {
        if self.is_ccw() {
            self.clone()
        } else {
            self.reversed()
        }
    }

    pub fn to_cw(&self) -> Loop {
        if self.is_ccw() {
            self.reversed()
        } else {
            self.clone()
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Point2D, Point2D) {
        bounds(self.vertices()).unwrap_or((self.points[0], self.points[0]))
    }

    /// Area centroid. Falls back to the vertex average for tiny loops.
    pub fn centroid(&self) -> Point2D {
        let verts = self.vertices();
        let n = verts.len();
        let mut a = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = &verts[i];
            let q = &verts[(i + 1) % n];
            let c = p.x * q.y - q.x * p.y;
            a += c;
            cx += (p.x + q.x) * c;
            cy += (p.y + q.y) * c;
        }
        a /= 2.0;
        if a.abs() < f64::EPSILON {
            let sx: f64 = verts.iter().map(|p| p.x).sum();
            let sy: f64 = verts.iter().map(|p| p.y).sum();
            return Point2D::new(sx / n as f64, sy / n as f64);
        }
        Point2D::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    /// Classify `p` against the loop; points within `tolerance` of an edge are
    /// on the boundary.
    pub fn locate(&self, p: &Point2D, tolerance: f64) -> Location {
        if self.edges().any(|e| e.distance_to_point(p) <= tolerance) {
            return Location::Boundary;
        }
        if point_in_ring(p, self.vertices()) {
            Location::Inside
        } else {
            Location::Outside
        }
    }

    /// `other` lies inside or on this loop.
    pub fn contains_loop(&self, other: &Loop, tolerance: f64) -> bool {
        let vertices_in = other
            .vertices()
            .iter()
            .all(|p| self.locate(p, tolerance) != Location::Outside);
        if !vertices_in {
            return false;
        }
        let midpoints_in = other
            .edges()
            .all(|e| self.locate(&e.midpoint(), tolerance) != Location::Outside);
        midpoints_in && self.locate(&other.interior_point(), tolerance) != Location::Outside
    }

    /// No two non-adjacent edges touch and no adjacent pair folds back.
    pub fn is_simple(&self) -> bool {
        let edges: Vec<Segment> = self.edges().collect();
        let n = edges.len();
        for i in 0..n {
            let next = &edges[(i + 1) % n];
            let d0 = edges[i].direction();
            let d1 = next.direction();
            if cross(&d0, &d1).abs() <= 1e-12 * d0.norm() * d1.norm() && d0.dot(&d1) < 0.0 {
                return false;
            }
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if edges[i].intersection(&edges[j], 0.0).is_some() {
                    return false;
                }
            }
        }
        true
    }

    /// A point strictly inside the loop, even for concave shapes.
    ///
    /// Scans horizontal lines half-way between distinct vertex heights and
    /// returns the middle of the widest interior interval found.
    pub fn interior_point(&self) -> Point2D {
        let verts = self.vertices();
        let mut ys: Vec<f64> = verts.iter().map(|p| p.y).collect();
        ys.sort_by(f64::total_cmp);
        ys.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);

        let mut best: Option<(f64, Point2D)> = None;
        for pair in ys.windows(2) {
            let y = (pair[0] + pair[1]) / 2.0;
            let band = pair[1] - pair[0];
            let mut xs: Vec<f64> = self
                .edges()
                .filter(|e| (e.start.y > y) != (e.end.y > y))
                .map(|e| {
                    e.start.x + (y - e.start.y) * (e.end.x - e.start.x) / (e.end.y - e.start.y)
                })
                .collect();
            xs.sort_by(f64::total_cmp);
            for span in xs.chunks_exact(2) {
                let score = (span[1] - span[0]) * band;
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, Point2D::new((span[0] + span[1]) / 2.0, y)));
                }
            }
        }
        best.map(|(_, p)| p).unwrap_or_else(|| self.centroid())
    }

    /// Canonical form: counter-clockwise, collinear vertices removed, starting
    /// at the lowest-then-leftmost vertex.
    pub fn normalized(&self, angle_epsilon: f64) -> Loop {
        simplify_poly(&self.to_ccw(), angle_epsilon)
    }
}

impl TryFrom<Vec<Point2D>> for Loop {
    type Error = Error;

    fn try_from(points: Vec<Point2D>) -> Result<Self> {
        let closed = points.len() >= 4
            && points[0].approx_eq(&points[points.len() - 1], CLOSURE_EPSILON);
        if !closed {
            return Err(Error::DegenerateLoop {
                vertices: points.len(),
                area: signed_area(&points).abs(),
            });
        }
        Ok(Loop { points })
    }
}

impl From<Loop> for Vec<Point2D> {
    fn from(l: Loop) -> Self {
        l.points
    }
}

/// Remove exactly-collinear vertices, judged by turn angle only.
///
/// Unlike Douglas-Peucker this never moves the outline: a vertex is dropped
/// only when the path runs straight through it. The result starts at the
/// lowest-then-leftmost vertex, which is always a true corner.
pub fn simplify_poly(l: &Loop, angle_epsilon: f64) -> Loop {
    let verts = l.vertices();
    let n = verts.len();
    let start = (0..n)
        .min_by(|&a, &b| verts[a].cmp_yx(&verts[b]))
        .unwrap_or(0);

    let mut kept: Vec<Point2D> = vec![verts[start]];
    for k in 1..n {
        let curr = verts[(start + k) % n];
        let next = verts[(start + k + 1) % n];
        let prev = kept[kept.len() - 1];
        let a = prev.vector_to(&curr);
        let b = curr.vector_to(&next);
        let turn = cross(&a, &b).atan2(a.dot(&b)).abs();
        if turn > angle_epsilon {
            kept.push(curr);
        }
    }

    if kept.len() < 3 {
        return l.clone();
    }
    kept.push(kept[0]);
    Loop { points: kept }
}

/// Shoelace signed area of an open ring.
pub fn signed_area(ring: &[Point2D]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }
    area / 2.0
}

/// Ray-casting containment test on an open ring.
pub fn point_in_ring(point: &Point2D, ring: &[Point2D]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = &ring[i];
        let pj = &ring[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Bounding box of a point set as (min, max).
pub fn bounds(points: &[Point2D]) -> Option<(Point2D, Point2D)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}
