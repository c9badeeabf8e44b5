// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multiply-connected regions and their decomposition into simple tiles.
//!
//! A region with holes is cut along a horizontal line through the middle of
//! its first hole. The cut opens that hole to the boundary on both sides, so
//! each half has at least one hole fewer; halves that still have holes are
//! cut again. The boolean clipping is done with `i_overlay`.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use tracing::debug;
use zonelite_planar::{Loop, Point2D, Tolerances};

/// Turn-angle epsilon used when normalising tiles.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// For each candidate hole, the index of the room it belongs to.
///
/// A hole belongs to the smallest room that contains it and is larger than
/// it. Candidates contained by no room are `None`.
pub fn assign_holes(rooms: &[Loop], candidates: &[Loop], tol: &Tolerances) -> Vec<Option<usize>> {
    candidates
        .iter()
        .map(|hole| {
            rooms
                .iter()
                .enumerate()
                .filter(|(_, room)| room.area() > hole.area() + tol.min_area())
                .filter(|(_, room)| room.contains_loop(hole, tol.distance))
                .min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
                .map(|(i, _)| i)
        })
        .collect()
}

fn to_path(l: &Loop) -> Vec<[f64; 2]> {
    l.vertices().iter().map(|&p| p.into()).collect()
}

fn from_path(path: &[[f64; 2]], tol: &Tolerances) -> Option<Loop> {
    let points: Vec<Point2D> = path.iter().map(|&p| p.into()).collect();
    Loop::from_points(&points, tol).ok()
}

/// Axis-aligned rectangle path, counter-clockwise.
fn band(min: Point2D, max: Point2D) -> Vec<[f64; 2]> {
    vec![[min.x, min.y], [max.x, min.y], [max.x, max.y], [min.x, max.y]]
}

/// Decompose `outer` minus `holes` into simple, hole-free tiles.
///
/// Tiles are counter-clockwise with collinear vertices removed. Their areas
/// sum to the area of `outer` minus the holes. Without holes the result is
/// the normalised outer loop.
pub fn split_holes(outer: &Loop, holes: &[Loop], tol: &Tolerances) -> Vec<Loop> {
    let Some(first) = holes.first() else {
        return vec![outer.normalized(STRAIGHT_EPSILON)];
    };

    let (hole_min, hole_max) = first.bounds();
    let cut = (hole_min.y + hole_max.y) / 2.0;
    let (min, max) = outer.bounds();
    let pad = 1.0 + (max.x - min.x).max(max.y - min.y);

    let mut subject = vec![to_path(&outer.to_ccw())];
    subject.extend(holes.iter().map(|h| to_path(&h.to_cw())));

    let (left, right) = (min.x - pad, max.x + pad);
    let halves = [
        band(Point2D::new(left, min.y - pad), Point2D::new(right, cut)),
        band(Point2D::new(left, cut), Point2D::new(right, max.y + pad)),
    ];

    let mut tiles = Vec::new();
    for half in halves {
        let clip = vec![half];
        let shapes = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);
        for shape in shapes {
            let mut contours = shape.iter();
            let Some(piece) = contours.next().and_then(|c| from_path(c, tol)) else {
                continue;
            };
            let inner: Vec<Loop> = contours.filter_map(|c| from_path(c, tol)).collect();
            if inner.len() >= holes.len() {
                // The cut failed to open a hole; keep the piece with its holes
                // rather than recurse forever.
                debug!(holes = inner.len(), "hole split made no progress");
                tiles.push(piece.normalized(STRAIGHT_EPSILON));
                continue;
            }
            tiles.extend(split_holes(&piece, &inner, tol));
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn tol() -> Tolerances {
        Tolerances::default()
    }

    fn square(x: f64, y: f64, size: f64) -> Loop {
        Loop::from_points(
            &[
                Point2D::new(x, y),
                Point2D::new(x + size, y),
                Point2D::new(x + size, y + size),
                Point2D::new(x, y + size),
            ],
            &tol(),
        )
        .unwrap()
    }

    #[test]
    fn test_square_with_square_hole() {
        let tiles = split_holes(&square(0.0, 0.0, 10.0), &[square(4.0, 4.0, 2.0)], &tol());
        assert!(tiles.len() >= 2);
        for tile in &tiles {
            assert!(tile.is_simple());
            assert!(tile.is_ccw());
        }
        let total: f64 = tiles.iter().map(Loop::area).sum();
        assert_relative_eq!(total, 96.0, epsilon = 1e-6);
    }

    #[test]
    fn test_two_holes() {
        let holes = [square(2.0, 2.0, 2.0), square(6.0, 5.0, 2.0)];
        let tiles = split_holes(&square(0.0, 0.0, 10.0), &holes, &tol());
        assert!(tiles.len() >= 3);
        assert!(tiles.iter().all(Loop::is_simple));
        let total: f64 = tiles.iter().map(Loop::area).sum();
        assert_relative_eq!(total, 92.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_holes_is_normalised_outer() {
        let tiles = split_holes(&square(1.0, 1.0, 3.0).reversed(), &[], &tol());
        assert_eq!(tiles.len(), 1);
        assert!(tiles[0].is_ccw());
        assert_relative_eq!(tiles[0].area(), 9.0);
    }

    #[test]
    fn test_assign_holes_picks_smallest_container() {
        let rooms = [square(0.0, 0.0, 20.0), square(2.0, 2.0, 10.0), square(30.0, 0.0, 5.0)];
        let candidates = [square(4.0, 4.0, 1.0), square(14.0, 14.0, 1.0), square(50.0, 50.0, 1.0)];
        assert_eq!(
            assign_holes(&rooms, &candidates, &tol()),
            vec![Some(1), Some(0), None]
        );
    }
}
