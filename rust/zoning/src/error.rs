// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for zoning runs.
//!
//! Only conditions that stop a whole run are errors. Everything that can be
//! recovered per segment, cluster or block is recorded as an
//! [`Anomaly`](crate::diagnostics::Anomaly) instead.

use thiserror::Error;

/// Result type alias for zoning operations.
pub type Result<T> = std::result::Result<T, ZoningError>;

/// Errors that abort a zoning run.
#[derive(Error, Debug)]
pub enum ZoningError {
    /// No floor produced a single region or shell.
    #[error("no usable regions: zero regions and zero shells detected across {floors} floor(s)")]
    NoUsableRegions { floors: usize },

    /// The tolerance set or another configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] zonelite_planar::Error),

    /// Floors were not supplied in ascending ordinal order.
    #[error("floor {found} supplied after floor {previous}: floors must ascend")]
    FloorOrder { previous: usize, found: usize },
}
