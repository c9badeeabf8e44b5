// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration.

use serde::{Deserialize, Serialize};
use zonelite_planar::{Error as PlanarError, Tolerances};

use crate::error::Result;

/// Everything a zoning run reads besides its input geometry.
///
/// Immutable for the duration of a run and passed by reference into every
/// stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoningConfig {
    /// Shared tolerance set.
    pub tolerances: Tolerances,
    /// Primary grid direction in radians. The secondary axis is this plus 90
    /// degrees.
    pub reference_angle: f64,
    /// A spatial cluster with this many segments or fewer is stray.
    pub min_cluster_segments: usize,
    /// Regions smaller than this are discarded as debris.
    pub min_region_area: f64,
    /// Prepended to every region label.
    pub label_prefix: String,
}

impl Default for ZoningConfig {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            reference_angle: 0.0,
            min_cluster_segments: 3,
            min_region_area: 0.01,
            label_prefix: String::new(),
        }
    }
}

impl ZoningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tolerance set.
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Set the primary grid direction (radians).
    pub fn with_reference_angle(mut self, radians: f64) -> Self {
        self.reference_angle = radians;
        self
    }

    /// Set the stray threshold.
    pub fn with_min_cluster_segments(mut self, count: usize) -> Self {
        self.min_cluster_segments = count;
        self
    }

    /// Set the smallest region area that is kept.
    pub fn with_min_region_area(mut self, area: f64) -> Self {
        self.min_region_area = area;
        self
    }

    /// Set the label prefix.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Validate tolerances and the remaining numeric fields.
    pub fn validate(&self) -> Result<()> {
        self.tolerances.validate()?;
        if !self.reference_angle.is_finite() {
            return Err(PlanarError::InvalidTolerance(format!(
                "reference_angle must be finite, got {}",
                self.reference_angle
            ))
            .into());
        }
        if !self.min_region_area.is_finite() || self.min_region_area < 0.0 {
            return Err(PlanarError::InvalidTolerance(format!(
                "min_region_area must be a non-negative number, got {}",
                self.min_region_area
            ))
            .into());
        }
        Ok(())
    }

    /// Angle of the secondary grid axis.
    pub fn secondary_angle(&self) -> f64 {
        self.reference_angle + std::f64::consts::FRAC_PI_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ZoningError;

    #[test]
    fn test_builder() {
        let config = ZoningConfig::new()
            .with_reference_angle(0.1)
            .with_min_cluster_segments(2)
            .with_label_prefix("L");
        assert_eq!(config.min_cluster_segments, 2);
        assert_eq!(config.label_prefix, "L");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_tolerances_rejected() {
        let tolerances = Tolerances {
            alignment: 0.01,
            ..Default::default()
        };
        let config = ZoningConfig::new().with_tolerances(tolerances);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ZoningError::InvalidConfig(_)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"tolerances": {"alignment": 0.3}, "label_prefix": "Z"}"#;
        let config: ZoningConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.min_cluster_segments, 3);
        assert_eq!(config.tolerances.alignment, 0.3);
        assert_eq!(config.tolerances.distance, 0.01);
        assert_eq!(config.label_prefix, "Z");
    }
}
