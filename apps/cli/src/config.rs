// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration from environment variables and an optional JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use zonelite_planar::Tolerances;
use zonelite_zoning::ZoningConfig;

/// Read a numeric variable, falling back to `default` when unset or
/// unparsable.
fn var_or<F>(lookup: &F, name: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Build the configuration from `ZONELITE_*` environment variables.
pub fn from_env() -> ZoningConfig {
    from_lookup(|name| std::env::var(name).ok())
}

fn from_lookup<F>(lookup: F) -> ZoningConfig
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Tolerances::default();
    let tolerances = Tolerances {
        distance: var_or(&lookup, "ZONELITE_DISTANCE", defaults.distance),
        angle: var_or(&lookup, "ZONELITE_ANGLE", defaults.angle),
        grouping: var_or(&lookup, "ZONELITE_GROUPING", defaults.grouping),
        alignment: var_or(&lookup, "ZONELITE_ALIGNMENT", defaults.alignment),
        perimeter_offset: var_or(
            &lookup,
            "ZONELITE_PERIMETER_OFFSET",
            defaults.perimeter_offset,
        ),
    };
    let mut config = ZoningConfig::default()
        .with_tolerances(tolerances)
        .with_reference_angle(var_or(&lookup, "ZONELITE_REFERENCE_ANGLE", 0.0));
    let min_area = var_or(&lookup, "ZONELITE_MIN_REGION_AREA", config.min_region_area);
    config = config.with_min_region_area(min_area);
    if let Some(prefix) = lookup("ZONELITE_LABEL_PREFIX") {
        config = config.with_label_prefix(prefix);
    }
    config
}

/// Environment configuration, replaced by the contents of `path` if given.
///
/// Fields missing from the file take their defaults.
pub fn load(path: Option<&Path>) -> Result<ZoningConfig> {
    let Some(path) = path else {
        return Ok(from_env());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing config file {}", path.display()))
}
