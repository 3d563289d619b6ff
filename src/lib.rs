//! # MargaNav
//!
//! Topology-aware global path planner for mobile robots on 2D occupancy
//! grids. Given a start pose, a goal pose and a fresh grid, it returns up
//! to K smooth, collision-free candidate paths that are *topologically
//! distinct* (each winds differently around the obstacles), so a layer
//! above can let an operator pick a corridor instead of a single line.
//!
//! ## Pipeline
//!
//! ```text
//! grid ──► voronoi (sites, clipped diagram)
//!      ──► graph   (prune, dedup, stitch)          ─┐
//! grid ──► homotopy (centroids, coefficients)       ├─► GraphSnapshot
//!                                                   ─┘
//! plan ──► nearest nodes ──► A* seed ──► Yen + H-signature filter
//!      ──► Bezier smoothing ──► Vec<Vec<PixelPoint>>
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use marga_nav::{OccupancyGrid, PixelPoint, PlannerConfig, VoronoiPlanner};
//!
//! let planner = VoronoiPlanner::new(PlannerConfig::default());
//! let grid = OccupancyGrid::new("map", 0.05, width, height, cells)?;
//!
//! planner.map_to_graph(grid);
//! let paths = planner.plan(
//!     PixelPoint::new(10.0, 40.0),
//!     PixelPoint::new(180.0, 40.0),
//!     2,
//! );
//! ```
//!
//! ## Coordinate system
//!
//! All planning runs in continuous pixel coordinates; cell `(x, y)` is the
//! floor of a pixel point, rows grow "up" in the world frame, and
//! `pixel = world / resolution`. The caller owns any map origin shift.
//!
//! ## Concurrency
//!
//! One builder role calls [`VoronoiPlanner::map_to_graph`], one planner
//! role calls [`VoronoiPlanner::plan`]. Rebuilds publish an immutable
//! snapshot, so observers and plans never see a half-built graph.

pub mod collision;
pub mod config;
pub mod error;
pub mod graph;
pub mod grid;
pub mod homotopy;
pub mod planner;
pub mod planning;
pub mod types;
pub mod voronoi;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use grid::OccupancyGrid;
pub use planner::{GraphSnapshot, VoronoiPlanner};
pub use types::{PixelPoint, WorldPoint};
