// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Zonelite Planar
//!
//! Tolerant 2D primitives for floor-plate zoning: points, segments, closed
//! loops, Douglas-Peucker simplification and orthogonal hulls.
//!
//! Every predicate that compares geometry takes a [`Tolerances`] (or one of
//! its fields) so that all stages of a zoning run agree on what "the same
//! point" or "the same line" means.

pub mod error;
pub mod hull;
pub mod point;
pub mod polygon;
pub mod segment;
pub mod simplify;
pub mod tolerance;

// Re-export nalgebra types for convenience
pub use nalgebra::Vector2;

pub use error::{Error, Result};
pub use hull::{bounding_box_loop, ortho_hull, ortho_hull_of_segments};
pub use point::{cross, line_angle_between, perp, unit_from_angle, Point2D};
pub use polygon::{bounds, point_in_ring, signed_area, simplify_poly, Location, Loop};
pub use segment::{End, Segment};
pub use simplify::simplify;
pub use tolerance::Tolerances;
