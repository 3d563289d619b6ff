//! Configuration loading for MargaNav

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Planner configuration.
///
/// All values are immutable once the planner is constructed. Thresholds are
/// expressed against the `[0, 100]` occupancy scale of the input grid;
/// distances are in pixels unless noted otherwise.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    /// Number of topologically distinct paths requested per plan (default: 2)
    #[serde(default = "default_num_paths")]
    pub num_paths: usize,

    /// Cells with occupancy >= this value become Voronoi sites (default: 100)
    #[serde(default = "default_occupancy_threshold")]
    pub occupancy_threshold: i16,

    /// Cells with occupancy > this value block collision checks and graph
    /// vertices (default: 85). Must not exceed `occupancy_threshold`.
    #[serde(default = "default_collision_threshold")]
    pub collision_threshold: i16,

    /// Cells skipped between sampled Voronoi sites; 0 samples every cell
    /// (default: 0)
    #[serde(default = "default_pixels_to_skip")]
    pub pixels_to_skip: usize,

    /// Sampling step along a segment during collision checks, in pixels
    /// (default: 0.1)
    #[serde(default = "default_line_check_resolution")]
    pub line_check_resolution: f64,

    /// Downscale factor applied to the grid before contour tracing for
    /// obstacle centroids (default: 0.25)
    #[serde(default = "default_contour_scale")]
    pub contour_scale: f64,

    /// Relative distance below which two H-signatures are considered the
    /// same homotopy class (default: 0.2)
    #[serde(default = "default_h_class_threshold")]
    pub h_class_threshold: f64,

    /// Squared separation below which adjacent Bezier control points are
    /// merged, scaled by the grid resolution (default: 1.0)
    #[serde(default = "default_min_node_sep_sq")]
    pub min_node_sep_sq: f64,

    /// Offset of the collinear continuity anchor between Bezier
    /// subsections, scaled by the grid resolution (default: 1.0)
    #[serde(default = "default_extra_point_distance")]
    pub extra_point_distance: f64,

    /// Radius in pixels within which a singly-connected node is stitched to
    /// its nearest neighbor (default: 1.0)
    #[serde(default = "default_node_connection_threshold")]
    pub node_connection_threshold: f64,

    /// Maximum control points per Bezier subsection (default: 10)
    #[serde(default = "default_bezier_max_n")]
    pub bezier_max_n: usize,
}

// Default value functions
fn default_num_paths() -> usize {
    2
}
fn default_occupancy_threshold() -> i16 {
    100
}
fn default_collision_threshold() -> i16 {
    85
}
fn default_pixels_to_skip() -> usize {
    0
}
fn default_line_check_resolution() -> f64 {
    0.1
}
fn default_contour_scale() -> f64 {
    0.25
}
fn default_h_class_threshold() -> f64 {
    0.2
}
fn default_min_node_sep_sq() -> f64 {
    1.0
}
fn default_extra_point_distance() -> f64 {
    1.0
}
fn default_node_connection_threshold() -> f64 {
    1.0
}
fn default_bezier_max_n() -> usize {
    10
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            num_paths: default_num_paths(),
            occupancy_threshold: default_occupancy_threshold(),
            collision_threshold: default_collision_threshold(),
            pixels_to_skip: default_pixels_to_skip(),
            line_check_resolution: default_line_check_resolution(),
            contour_scale: default_contour_scale(),
            h_class_threshold: default_h_class_threshold(),
            min_node_sep_sq: default_min_node_sep_sq(),
            extra_point_distance: default_extra_point_distance(),
            node_connection_threshold: default_node_connection_threshold(),
            bezier_max_n: default_bezier_max_n(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::PlannerError::Config(format!("failed to read config file: {}", e))
        })?;
        let config: PlannerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
