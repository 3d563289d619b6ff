//! Error types for MargaNav

use thiserror::Error;

/// MargaNav error type.
///
/// Errors never cross the planner boundary: `map_to_graph` reports failure
/// as `false` and `plan` returns an empty path list, logging the cause.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("occupancy grid is empty")]
    EmptyGrid,

    #[error("grid {width}x{height} does not fit the 16-bit vertex key space")]
    GridTooLarge { width: u32, height: u32 },

    #[error("grid data holds {len} cells, expected {expected}")]
    GridShape { len: usize, expected: usize },

    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i64, y: i64 },

    #[error("no collision-free graph node reachable from ({x:.2}, {y:.2})")]
    NoReachableGraphNode { x: f64, y: f64 },

    #[error("no path through the graph from node {start} to node {goal}")]
    NoPath { start: usize, goal: usize },

    #[error("adjacent path nodes collide; the graph no longer matches the grid")]
    DegradedMap,

    #[error("path vertex within one pixel of obstacle centroid ({x:.2}, {y:.2})")]
    CentroidContact { x: f64, y: f64 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
