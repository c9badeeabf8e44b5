// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for planar primitives.

use thiserror::Error;

/// Result type alias for planar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by tolerant primitives.
///
/// None of these are fatal to a zoning run: callers recover locally and record
/// an anomaly instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two lines are parallel within the angle tolerance and have no usable
    /// intersection point.
    #[error("lines are parallel: no intersection")]
    ParallelLines,

    /// A segment shorter than the distance tolerance.
    #[error("degenerate segment of length {0}")]
    DegenerateSegment(f64),

    /// A loop with fewer than 3 distinct vertices or no enclosed area.
    #[error("degenerate loop with {vertices} distinct vertices and area {area}")]
    DegenerateLoop { vertices: usize, area: f64 },

    /// A tolerance value is non-positive or breaks the tolerance hierarchy.
    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),
}
