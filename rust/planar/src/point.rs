// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar point with tolerant comparison.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A 2D point in plan coordinates.
///
/// Deliberately has no `PartialEq`: points are compared with
/// [`Point2D::approx_eq`] against a tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position vector from the origin.
    pub fn coords(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Vector from `self` to `other`.
    pub fn vector_to(&self, other: &Point2D) -> Vector2<f64> {
        Vector2::new(other.x - self.x, other.y - self.y)
    }

    /// `self + v`.
    pub fn offset(&self, v: &Vector2<f64>) -> Point2D {
        Point2D::new(self.x + v.x, self.y + v.y)
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// True when the two points are within `tolerance` of each other.
    pub fn approx_eq(&self, other: &Point2D, tolerance: f64) -> bool {
        self.distance_sq(other) <= tolerance * tolerance
    }

    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Lexicographic order on (y, x), used to pick canonical loop starts.
    pub fn cmp_yx(&self, other: &Point2D) -> std::cmp::Ordering {
        self.y
            .total_cmp(&other.y)
            .then_with(|| self.x.total_cmp(&other.x))
    }

    /// Lexicographic order on (x, y).
    pub fn cmp_xy(&self, other: &Point2D) -> std::cmp::Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Point2D::new(p[0], p[1])
    }
}

impl From<Point2D> for [f64; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

/// 2D cross product (z component of the 3D cross product).
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Unit vector at `angle` radians from the +x axis.
pub fn unit_from_angle(angle: f64) -> Vector2<f64> {
    Vector2::new(angle.cos(), angle.sin())
}

/// Left-hand perpendicular of `v` (rotated +90 degrees).
pub fn perp(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

/// Smallest angle between two undirected lines with directions `a` and `b`,
/// in `[0, PI/2]`.
pub fn line_angle_between(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    let na = a.norm();
    let nb = b.norm();
    if na < f64::EPSILON || nb < f64::EPSILON {
        return 0.0;
    }
    let sin = (cross(a, b) / (na * nb)).abs();
    let cos = (a.dot(b) / (na * nb)).abs();
    sin.atan2(cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_approx_eq() {
        let a = Point2D::new(1.0, 1.0);
        assert!(a.approx_eq(&Point2D::new(1.0005, 1.0), 0.001));
        assert!(!a.approx_eq(&Point2D::new(1.002, 1.0), 0.001));
    }

    #[test]
    fn test_line_angle_between() {
        let x = Vector2::new(1.0, 0.0);
        assert_relative_eq!(line_angle_between(&x, &Vector2::new(-3.0, 0.0)), 0.0);
        assert_relative_eq!(line_angle_between(&x, &Vector2::new(0.0, 2.0)), FRAC_PI_2);
        assert_relative_eq!(
            line_angle_between(&x, &Vector2::new(1.0, 1.0)),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_perp_is_ccw() {
        let v = perp(&Vector2::new(1.0, 0.0));
        assert_relative_eq!(v.x, 0.0);
        assert_relative_eq!(v.y, 1.0);
    }
}
