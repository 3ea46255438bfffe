// Navigation configuration.
//
// Grid geometry (column spacing and layer height) is global and fixed, so it
// lives in constants. Everything else the sampler and post-processor compare
// against is a tunable in `SamplerConfig` / `PathConfig`, bundled in
// `NavConfig` and loadable from JSON. The defaults are the tuned
// thresholds: 1 unit for "level", 51 units for "climbable", probes lifted 5
// and 105 units off the floor, 125 units of headroom.
//
// See also: `sampler.rs` which reads `SamplerConfig`, `postprocess.rs` which
// reads `PathConfig`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Horizontal distance between adjacent columns (and rows), in world units.
pub const GRID_SPACING_XY: f64 = 100.0;

/// Height of one discretized layer, in world units.
pub const LAYER_HEIGHT: f64 = 25.0;

/// Thresholds used by terrain sampling and edge classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Headroom a column needs above its floor to be standable.
    pub min_clearance_height: f64,
    /// The clearance probe starts this far above the floor hit so it cannot
    /// report the floor itself.
    pub clearance_probe_offset: f64,
    /// A ceiling hit only blocks the column if `|normal.z|` exceeds this;
    /// near-vertical walls grazed by the probe are ignored.
    pub ceiling_normal_min_z: f64,
    /// Height deltas at or below this are `Direct`.
    pub direct_max_delta: f64,
    /// Axis-aligned height deltas at or below this are candidate slopes.
    pub slope_max_delta: f64,
    /// Lift applied to both ends of the foot-level obstruction trace.
    pub obstruction_lift: f64,
    /// Extra lift for the head-level obstruction trace.
    pub head_height_lift: f64,
    /// Fraction of a cell toward the neighbor for the near-side sub-grid probe.
    pub sub_grid_near_alpha: f64,
    /// Fraction of a cell toward the neighbor for the far-side sub-grid probe.
    pub sub_grid_far_alpha: f64,
    /// Sub-grid deviations closer than this count as equal.
    pub step_equal_tolerance: f64,
    /// Sub-grid deviations summing below this count as flat.
    pub step_flat_tolerance: f64,
    /// Tolerance for "midpoint height is the mean of the endpoints" and for
    /// "endpoint sits on the midpoint's plateau".
    pub midpoint_tolerance: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_clearance_height: 125.0,
            clearance_probe_offset: 1.0,
            ceiling_normal_min_z: 0.1,
            direct_max_delta: 1.0,
            slope_max_delta: 51.0,
            obstruction_lift: 5.0,
            head_height_lift: 100.0,
            sub_grid_near_alpha: 0.2,
            sub_grid_far_alpha: 0.8,
            step_equal_tolerance: 1.0,
            step_flat_tolerance: 5.0,
            midpoint_tolerance: 1.0,
        }
    }
}

/// Thresholds used when refining a raw A* path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Squared distance from the reference line below which a point is
    /// considered collinear and dropped.
    pub collinear_epsilon: f64,
    /// Start and end closer than this are treated as the same point.
    pub same_point_tolerance: f64,
    /// A path ending farther than this from the snapped goal is partial.
    pub partial_path_tolerance: f64,
    /// A query point whose own cell is empty resolves to the nearest node in
    /// its column only if that node is at most this many layers away.
    pub resolve_layer_tolerance: i32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            collinear_epsilon: 1.0e-4,
            same_point_tolerance: 1.0e-4,
            partial_path_tolerance: 0.1,
            resolve_layer_tolerance: 4,
        }
    }
}

/// Complete navigation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub sampler: SamplerConfig,
    pub path: PathConfig,
}

impl NavConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = NavConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored = NavConfig::from_json_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn default_clearance_is_five_layers() {
        assert_eq!(SamplerConfig::default().min_clearance_height / LAYER_HEIGHT, 5.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "sampler": { "slope_max_delta": 30.0 },
            "path": { "collinear_epsilon": 0.5 }
        }"#;
        let config = NavConfig::from_json_str(json).unwrap();
        assert_eq!(config.sampler.slope_max_delta, 30.0);
        assert_eq!(config.sampler.direct_max_delta, 1.0);
        assert_eq!(config.path.collinear_epsilon, 0.5);
        assert_eq!(config.path.partial_path_tolerance, 0.1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = NavConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = NavConfig::load("/nonexistent/gridnav/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
