// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Douglas-Peucker polyline reduction.

use crate::point::Point2D;
use crate::segment::Segment;

/// Reduce a polyline so no removed vertex deviates more than `epsilon` from the
/// chord between its retained neighbours.
///
/// First and last points are always kept. Among vertices at the same maximum
/// distance the first one wins, which makes the result deterministic and
/// idempotent: simplifying the output again returns it unchanged.
pub fn simplify(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_span(points, 0, points.len() - 1, epsilon, &mut keep);

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Recursive split phase over `points[first..=last]`.
fn mark_span(points: &[Point2D], first: usize, last: usize, epsilon: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }

    let chord = Segment::new(points[first], points[last]);
    let mut max_dist = 0.0;
    let mut max_idx = first;
    for (i, point) in points.iter().enumerate().take(last).skip(first + 1) {
        let dist = perpendicular_distance(point, &chord);
        // Strict comparison keeps the first vertex on ties.
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        keep[max_idx] = true;
        mark_span(points, first, max_idx, epsilon, keep);
        mark_span(points, max_idx, last, epsilon, keep);
    }
}

/// Distance from `point` to the chord's supporting line, or to its start when
/// the chord has collapsed to a point (closed polylines).
fn perpendicular_distance(point: &Point2D, chord: &Segment) -> f64 {
    if chord.length() < 1e-10 {
        return point.distance_to(&chord.start);
    }
    chord.line_distance(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(a: &[Point2D], b: &[Point2D]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(p, q)| p.approx_eq(q, 0.0))
    }

    #[test]
    fn test_douglas_peucker() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.1),
            Point2D::new(2.0, -0.1),
            Point2D::new(3.0, 0.0),
            Point2D::new(4.0, 0.0),
        ];

        let simplified = simplify(&points, 0.5);
        assert_eq!(simplified.len(), 2);
    }

    #[test]
    fn test_keeps_corner() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.01),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 2.0),
            Point2D::new(4.01, 4.0),
        ];
        let simplified = simplify(&points, 0.05);
        assert_eq!(simplified.len(), 3);
        assert!(simplified[1].approx_eq(&Point2D::new(4.0, 0.0), 1e-12));
    }

    #[test]
    fn test_tie_break_takes_first_maximum() {
        // Both interior vertices sit exactly 1.0 from the chord.
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 1.0),
            Point2D::new(3.0, 0.0),
        ];
        let simplified = simplify(&points, 0.9);
        assert!(simplified[1].approx_eq(&Point2D::new(1.0, 1.0), 0.0));
    }

    #[test]
    fn test_idempotent() {
        let points: Vec<Point2D> = (0..40)
            .map(|i| {
                let x = i as f64 * 0.25;
                Point2D::new(x, (x * 1.7).sin() * 0.4 + if i > 20 { 1.0 } else { 0.0 })
            })
            .collect();
        for eps in [0.01, 0.05, 0.2, 1.0] {
            let once = simplify(&points, eps);
            let twice = simplify(&once, eps);
            assert!(same(&once, &twice), "not idempotent at eps={eps}");
        }
    }

    #[test]
    fn test_short_input_unchanged() {
        let points = vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)];
        assert_eq!(simplify(&points, 0.1).len(), 2);
    }
}
