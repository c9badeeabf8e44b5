// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The single tolerance set shared by every pipeline stage.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Numeric tolerances, in the same length unit as the coordinates.
///
/// The three length tolerances form a hierarchy that every stage relies on:
///
/// | tolerance   | identifies                                   |
/// |-------------|----------------------------------------------|
/// | `distance`  | the same point (endpoint merge, joints)      |
/// | `grouping`  | the same line (collinear fusion, T-junction) |
/// | `alignment` | the same structure (blocks, grid snapping)   |
///
/// `validate` enforces `distance < grouping <= alignment`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Point-merge radius. Segments shorter than this are degenerate.
    pub distance: f64,
    /// Angle tolerance in radians for parallelism tests.
    pub angle: f64,
    /// Line-fusion tolerance: perpendicular offset and end gap under which two
    /// parallel segments are the same line.
    pub grouping: f64,
    /// Snap radius for grid alignment and the body gap that still joins two
    /// segments into one block.
    pub alignment: f64,
    /// Reach used when patching the perimeter (columns, slabs, openings).
    pub perimeter_offset: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            distance: 0.01,         // 1 cm
            angle: 0.0175,          // ~1 degree
            grouping: 0.05,         // 5 cm
            alignment: 0.2,         // 20 cm
            perimeter_offset: 0.5,  // 50 cm
        }
    }
}

impl Tolerances {
    /// Squared point-merge radius.
    pub fn distance_sq(&self) -> f64 {
        self.distance * self.distance
    }

    /// Area below which a loop is considered degenerate.
    pub fn min_area(&self) -> f64 {
        self.distance * self.distance
    }

    /// Check positivity and the `distance < grouping <= alignment` hierarchy.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("distance", self.distance),
            ("angle", self.angle),
            ("grouping", self.grouping),
            ("alignment", self.alignment),
            ("perimeter_offset", self.perimeter_offset),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidTolerance(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if self.angle >= std::f64::consts::FRAC_PI_4 {
            return Err(Error::InvalidTolerance(format!(
                "angle must be below 45 degrees, got {} rad",
                self.angle
            )));
        }
        if self.distance >= self.grouping {
            return Err(Error::InvalidTolerance(format!(
                "distance ({}) must be smaller than grouping ({})",
                self.distance, self.grouping
            )));
        }
        if self.grouping > self.alignment {
            return Err(Error::InvalidTolerance(format!(
                "grouping ({}) must not exceed alignment ({})",
                self.grouping, self.alignment
            )));
        }
        Ok(())
    }
}
