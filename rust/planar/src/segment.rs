// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line segments and the tolerant predicates every stage is built on.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::point::{cross, line_angle_between, Point2D};
use crate::tolerance::Tolerances;

/// Slack on segment parameters when deciding whether an intersection lies
/// inside a span.
const PARAM_EPSILON: f64 = 1e-9;

/// One end of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    Start,
    End,
}

impl End {
    pub fn other(self) -> End {
        match self {
            End::Start => End::End,
            End::End => End::Start,
        }
    }
}

/// An ordered pair of points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point2D::new(x0, y0), Point2D::new(x1, y1))
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Unnormalised direction `end - start`.
    pub fn direction(&self) -> Vector2<f64> {
        self.start.vector_to(&self.end)
    }

    /// Unit direction, `None` for a zero-length segment.
    pub fn unit(&self) -> Option<Vector2<f64>> {
        let d = self.direction();
        let n = d.norm();
        if n < f64::EPSILON {
            None
        } else {
            Some(d / n)
        }
    }

    pub fn angle(&self) -> f64 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }

    pub fn midpoint(&self) -> Point2D {
        self.start.midpoint(&self.end)
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.end, self.start)
    }

    pub fn endpoint(&self, end: End) -> Point2D {
        match end {
            End::Start => self.start,
            End::End => self.end,
        }
    }

    /// Copy of `self` with one endpoint moved.
    pub fn with_endpoint(&self, end: End, p: Point2D) -> Segment {
        match end {
            End::Start => Segment::new(p, self.end),
            End::End => Segment::new(self.start, p),
        }
    }

    /// Shorter than the point-merge distance.
    pub fn is_degenerate(&self, tol: &Tolerances) -> bool {
        self.length() < tol.distance
    }

    /// A segment from `start` to `end`, rejected with
    /// [`Error::DegenerateSegment`] when shorter than the point-merge distance.
    pub fn checked(start: Point2D, end: Point2D, tol: &Tolerances) -> Result<Segment> {
        let segment = Segment::new(start, end);
        if segment.is_degenerate(tol) {
            return Err(Error::DegenerateSegment(segment.length()));
        }
        Ok(segment)
    }

    /// Parameter of the orthogonal projection of `p` onto the supporting line,
    /// with 0 at `start` and 1 at `end`.
    pub fn param_of(&self, p: &Point2D) -> f64 {
        let d = self.direction();
        let len_sq = d.norm_squared();
        if len_sq < f64::EPSILON {
            return 0.0;
        }
        self.start.vector_to(p).dot(&d) / len_sq
    }

    pub fn point_at(&self, t: f64) -> Point2D {
        self.start.offset(&(self.direction() * t))
    }

    /// Perpendicular distance from `p` to the supporting line.
    pub fn line_distance(&self, p: &Point2D) -> f64 {
        let d = self.direction();
        let len = d.norm();
        if len < f64::EPSILON {
            return p.distance_to(&self.start);
        }
        cross(&d, &self.start.vector_to(p)).abs() / len
    }

    /// Distance from `p` to the closest point of the segment.
    pub fn distance_to_point(&self, p: &Point2D) -> f64 {
        let t = self.param_of(p).clamp(0.0, 1.0);
        self.point_at(t).distance_to(p)
    }

    /// Minimum distance between the two segment bodies.
    pub fn distance_to_segment(&self, other: &Segment) -> f64 {
        if self.intersection(other, 0.0).is_some() {
            return 0.0;
        }
        self.distance_to_point(&other.start)
            .min(self.distance_to_point(&other.end))
            .min(other.distance_to_point(&self.start))
            .min(other.distance_to_point(&self.end))
    }

    /// Directions agree (either sign) within the angle tolerance.
    pub fn is_parallel(&self, other: &Segment, angle_tolerance: f64) -> bool {
        line_angle_between(&self.direction(), &other.direction()) <= angle_tolerance
    }

    /// Parallel and lying on the same line within the grouping tolerance.
    ///
    /// Symmetric: every endpoint must lie within `grouping` of the other
    /// segment's supporting line.
    pub fn is_collinear(&self, other: &Segment, tol: &Tolerances) -> bool {
        self.is_parallel(other, tol.angle)
            && self.line_distance(&other.start) <= tol.grouping
            && self.line_distance(&other.end) <= tol.grouping
            && other.line_distance(&self.start) <= tol.grouping
            && other.line_distance(&self.end) <= tol.grouping
    }

    /// Gap between the two spans measured along `self`'s direction.
    ///
    /// Zero when the projections overlap or touch.
    pub fn projection_gap(&self, other: &Segment) -> f64 {
        let len = self.length();
        if len < f64::EPSILON {
            return self
                .start
                .distance_to(&other.start)
                .min(self.start.distance_to(&other.end));
        }
        let a = self.param_of(&other.start) * len;
        let b = self.param_of(&other.end) * len;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if hi < 0.0 {
            -hi
        } else if lo > len {
            lo - len
        } else {
            0.0
        }
    }

    /// Collinear and the projections overlap or nearly overlap
    /// (gap within `grouping`). Never true for parallel-but-offset segments.
    pub fn overlaps(&self, other: &Segment, tol: &Tolerances) -> bool {
        self.is_collinear(other, tol) && self.projection_gap(other) <= tol.grouping
    }

    /// Intersection of the two supporting lines.
    ///
    /// Fails with [`Error::ParallelLines`] when the lines are parallel within
    /// `angle_tolerance`.
    pub fn line_intersection(&self, other: &Segment, angle_tolerance: f64) -> Result<Point2D> {
        if self.is_parallel(other, angle_tolerance) {
            return Err(Error::ParallelLines);
        }
        let (t, _) = self.line_params(other).ok_or(Error::ParallelLines)?;
        Ok(self.point_at(t))
    }

    /// Parameters `(t, u)` of the line intersection on `self` and `other`.
    pub fn line_params(&self, other: &Segment) -> Option<(f64, f64)> {
        let r = self.direction();
        let s = other.direction();
        let denom = cross(&r, &s);
        if denom.abs() <= 1e-12 * r.norm() * s.norm() {
            return None;
        }
        let qp = self.start.vector_to(&other.start);
        let t = cross(&qp, &s) / denom;
        let u = cross(&qp, &r) / denom;
        Some((t, u))
    }

    /// Intersection point of the two segment bodies, allowing each span to be
    /// stretched by `slack` length units at both ends.
    pub fn intersection(&self, other: &Segment, slack: f64) -> Option<Point2D> {
        let (t, u) = self.line_params(other)?;
        let st = slack / self.length().max(f64::EPSILON) + PARAM_EPSILON;
        let su = slack / other.length().max(f64::EPSILON) + PARAM_EPSILON;
        if t >= -st && t <= 1.0 + st && u >= -su && u <= 1.0 + su {
            Some(self.point_at(t))
        } else {
            None
        }
    }

    /// The closest pair of endpoints and their distance.
    pub fn nearest_endpoints(&self, other: &Segment) -> (End, End, f64) {
        let mut best = (End::Start, End::Start, f64::MAX);
        for a in [End::Start, End::End] {
            for b in [End::Start, End::End] {
                let d = self.endpoint(a).distance_to(&other.endpoint(b));
                if d < best.2 {
                    best = (a, b, d);
                }
            }
        }
        best
    }

    /// "Almost joined": the segments do not already intersect, yet their
    /// nearest endpoints lie within the point-merge distance.
    pub fn almost_joined(&self, other: &Segment, tol: &Tolerances) -> Option<(End, End)> {
        let (a, b, d) = self.nearest_endpoints(other);
        if d > tol.distance || d < f64::EPSILON {
            return None;
        }
        if self.intersection(other, 0.0).is_some() {
            return None;
        }
        Some((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn tol() -> Tolerances {
        Tolerances::default()
    }

    #[test]
    fn test_checked_rejects_short_segments() {
        let a = Point2D::new(1.0, 1.0);
        match Segment::checked(a, Point2D::new(1.004, 1.0), &tol()) {
            Err(Error::DegenerateSegment(len)) => assert_relative_eq!(len, 0.004, epsilon = 1e-12),
            other => panic!("unexpected result {other:?}"),
        }
        let ok = Segment::checked(a, Point2D::new(1.0, 3.0), &tol()).unwrap();
        assert_relative_eq!(ok.length(), 2.0);
    }

    #[test]
    fn test_distance_to_point() {
        let s = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        assert_relative_eq!(s.distance_to_point(&Point2D::new(5.0, 5.0)), 5.0);
        assert_relative_eq!(s.distance_to_point(&Point2D::new(13.0, 4.0)), 5.0);
        assert_relative_eq!(s.line_distance(&Point2D::new(13.0, 4.0)), 4.0);
    }

    #[test]
    fn test_collinear_and_overlap() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(10.03, 0.01, 20.0, 0.01);
        assert!(a.is_collinear(&b, &tol()));
        assert!(a.overlaps(&b, &tol()));

        let far = Segment::from_coords(10.5, 0.0, 20.0, 0.0);
        assert!(a.is_collinear(&far, &tol()));
        assert!(!a.overlaps(&far, &tol()));

        let offset = Segment::from_coords(0.0, 10.0, 10.0, 10.0);
        assert!(a.is_parallel(&offset, tol().angle));
        assert!(!a.is_collinear(&offset, &tol()));
    }

    #[test]
    fn test_projection_gap_reversed_segment() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(14.0, 0.0, 12.0, 0.0);
        assert_relative_eq!(a.projection_gap(&b), 2.0);
        let c = Segment::from_coords(-3.0, 0.0, 4.0, 0.0);
        assert_relative_eq!(a.projection_gap(&c), 0.0);
    }

    #[test]
    fn test_line_intersection() {
        let a = Segment::from_coords(0.0, 0.0, 5.0, 0.0);
        let b = Segment::from_coords(7.0, -3.0, 7.0, 3.0);
        let p = a.line_intersection(&b, tol().angle).unwrap();
        assert_relative_eq!(p.x, 7.0);
        assert_relative_eq!(p.y, 0.0);
        assert!(a.intersection(&b, 0.0).is_none());
        assert!(a.intersection(&b, 2.5).is_some());

        let c = Segment::from_coords(0.0, 1.0, 5.0, 1.0);
        let err = a.line_intersection(&c, tol().angle).unwrap_err();
        assert_eq!(err, Error::ParallelLines);
    }

    #[test]
    fn test_almost_joined() {
        let bottom = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let left = Segment::from_coords(0.0, 8.0, 0.0, 0.001);
        assert_eq!(
            bottom.almost_joined(&left, &tol()),
            Some((End::Start, End::End))
        );

        // Touching segments already intersect.
        let touching = Segment::from_coords(0.0, 8.0, 0.0, 0.0);
        assert_eq!(bottom.almost_joined(&touching, &tol()), None);

        let far = Segment::from_coords(0.0, 8.0, 0.0, 0.5);
        assert_eq!(bottom.almost_joined(&far, &tol()), None);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Segment::from_coords(0.0, 0.0, 10.0, 0.0);
        let b = Segment::from_coords(5.0, 2.0, 5.0, 6.0);
        assert_relative_eq!(a.distance_to_segment(&b), 2.0);
        let crossing = Segment::from_coords(5.0, -2.0, 5.0, 6.0);
        assert_relative_eq!(a.distance_to_segment(&crossing), 0.0);
    }
}
