// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orthogonal ("staircase") hulls.
//!
//! The hull is the smallest rectilinear polygon that contains the input and is
//! monotone in both axes. For a predominantly orthogonal footprint it follows
//! notches that an axis-aligned bounding box would swallow.
//!
//! It is assembled from four staircase chains, one per corner of the bounding
//! box. Each chain is the run of prefix extrema met when sweeping in from that
//! side. When the chains of opposite corners cross (diagonal point sets), the
//! staircase is not a simple polygon and the bounding box is returned instead.

use crate::error::{Error, Result};
use crate::point::Point2D;
use crate::polygon::{bounds, simplify_poly, Loop};
use crate::segment::Segment;
use crate::tolerance::Tolerances;

/// Turn-angle epsilon for dropping collinear staircase vertices.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// Orthogonal hull of a point set. Always a closed counter-clockwise loop for
/// non-empty input; degenerate extents are padded to `tol.distance`.
pub fn ortho_hull(points: &[Point2D], tol: &Tolerances) -> Result<Loop> {
    if points.len() < 3 {
        return bounding_box_loop(points, tol);
    }

    let upper_left = staircase(&sweep(points, false, true), |y, best| y > best);
    let lower_left = staircase(&sweep(points, false, false), |y, best| y < best);
    let upper_right = staircase(&sweep(points, true, true), |y, best| y > best);
    let lower_right = staircase(&sweep(points, true, false), |y, best| y < best);

    let mut ring = expand(&lower_left);
    ring.extend(expand(&lower_right).into_iter().rev());
    ring.extend(expand(&upper_right));
    ring.extend(expand(&upper_left).into_iter().rev());

    match Loop::from_points(&ring, tol) {
        Ok(l) if l.is_ccw() && l.is_simple() => Ok(simplify_poly(&l, STRAIGHT_EPSILON)),
        _ => bounding_box_loop(points, tol),
    }
}

/// Orthogonal hull of all segment endpoints.
pub fn ortho_hull_of_segments(segments: &[Segment], tol: &Tolerances) -> Result<Loop> {
    let points: Vec<Point2D> = segments.iter().flat_map(|s| [s.start, s.end]).collect();
    ortho_hull(&points, tol)
}

/// Axis-aligned bounding box as a counter-clockwise loop.
pub fn bounding_box_loop(points: &[Point2D], tol: &Tolerances) -> Result<Loop> {
    let (mut min, mut max) = bounds(points).ok_or(Error::DegenerateLoop {
        vertices: 0,
        area: 0.0,
    })?;
    if max.x - min.x < tol.distance {
        let cx = (min.x + max.x) / 2.0;
        min.x = cx - tol.distance;
        max.x = cx + tol.distance;
    }
    if max.y - min.y < tol.distance {
        let cy = (min.y + max.y) / 2.0;
        min.y = cy - tol.distance;
        max.y = cy + tol.distance;
    }
    Loop::from_points(
        &[
            Point2D::new(min.x, min.y),
            Point2D::new(max.x, min.y),
            Point2D::new(max.x, max.y),
            Point2D::new(min.x, max.y),
        ],
        tol,
    )
}

/// Points ordered by x, then y, each axis ascending unless flagged.
fn sweep(points: &[Point2D], x_desc: bool, y_desc: bool) -> Vec<Point2D> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        let ox = a.x.total_cmp(&b.x);
        let oy = a.y.total_cmp(&b.y);
        let ox = if x_desc { ox.reverse() } else { ox };
        let oy = if y_desc { oy.reverse() } else { oy };
        ox.then(oy)
    });
    sorted
}

/// Prefix extrema of a sorted sweep.
fn staircase(sorted: &[Point2D], improves: impl Fn(f64, f64) -> bool) -> Vec<Point2D> {
    let mut chain: Vec<Point2D> = Vec::new();
    for p in sorted {
        match chain.last() {
            Some(best) if !improves(p.y, best.y) => {}
            _ => chain.push(*p),
        }
    }
    chain
}

/// Insert the inner corner `(next.x, cur.y)` between consecutive chain steps.
fn expand(chain: &[Point2D]) -> Vec<Point2D> {
    let mut out = Vec::with_capacity(chain.len() * 2);
    for (i, p) in chain.iter().enumerate() {
        if i > 0 {
            out.push(Point2D::new(p.x, chain[i - 1].y));
        }
        out.push(*p);
    }
    out
}
