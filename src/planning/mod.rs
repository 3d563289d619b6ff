//! Path search and smoothing over the roadmap graph.
//!
//! This module provides:
//! - A* shortest path between graph nodes
//! - Yen-style k-shortest-path enumeration filtered by homotopy class
//! - Bezier smoothing of node sequences into dense curves

mod astar;
mod smoother;
mod yen;

pub use astar::shortest_path;
pub use smoother::BezierSmoother;
pub use yen::k_shortest_paths;
