//! Planner coordinator: graph rebuilds and path requests.
//!
//! The builder role periodically feeds fresh occupancy grids through
//! [`VoronoiPlanner::map_to_graph`]; the planner role requests paths with
//! [`VoronoiPlanner::plan`]. Every rebuild produces an immutable
//! [`GraphSnapshot`] swapped in atomically, so a plan always observes
//! exactly one rebuild and never a half-built graph.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::collision::CollisionChecker;
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::graph::VoronoiGraph;
use crate::grid::OccupancyGrid;
use crate::homotopy::ObstacleField;
use crate::planning::{self, BezierSmoother};
use crate::types::PixelPoint;
use crate::voronoi;

/// Everything derived from one occupancy grid: the grid itself, the pruned
/// roadmap and the obstacle field. Immutable once published.
#[derive(Debug)]
pub struct GraphSnapshot {
    pub grid: OccupancyGrid,
    pub graph: VoronoiGraph,
    pub obstacles: ObstacleField,
}

/// Topology-aware global planner over a 2D occupancy grid.
pub struct VoronoiPlanner {
    config: PlannerConfig,
    snapshot: RwLock<Option<Arc<GraphSnapshot>>>,
    local_vertices: Mutex<Vec<PixelPoint>>,
    updating: AtomicBool,
    planning: AtomicBool,
}

impl VoronoiPlanner {
    /// Create a planner with the given configuration.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            snapshot: RwLock::new(None),
            local_vertices: Mutex::new(Vec::new()),
            updating: AtomicBool::new(false),
            planning: AtomicBool::new(false),
        }
    }

    /// Create a planner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Extra Voronoi seed points fed into the next rebuild, typically the
    /// corners of a local costmap.
    pub fn set_local_vertices(&self, vertices: Vec<PixelPoint>) {
        *self.local_vertices.lock() = vertices;
    }

    /// Whether a rebuild is currently running.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Rebuild the roadmap from a fresh grid.
    ///
    /// Returns `false` without touching the current snapshot when the grid
    /// is empty or a plan is in progress; the builder simply retries on its
    /// next tick.
    pub fn map_to_graph(&self, grid: OccupancyGrid) -> bool {
        if grid.is_empty() {
            warn!("map_to_graph: empty grid, keeping previous graph");
            return false;
        }
        if self.planning.load(Ordering::Acquire) {
            debug!("map_to_graph: plan in progress, rebuild skipped");
            return false;
        }

        self.updating.store(true, Ordering::Release);
        let started = Instant::now();

        let local_vertices = self.local_vertices.lock().clone();
        let sites = voronoi::collect_sites(
            &grid,
            self.config.occupancy_threshold,
            self.config.pixels_to_skip,
            &local_vertices,
        );
        debug!(
            "map_to_graph: {} sites in {:.1?}",
            sites.len(),
            started.elapsed()
        );

        let edges = voronoi::build_edges(&sites, grid.width(), grid.height());
        let checker = CollisionChecker::new(&grid, &self.config);
        let graph = VoronoiGraph::build(edges, &checker, &self.config);
        let obstacles = ObstacleField::from_grid(&grid, &self.config);

        info!(
            "map_to_graph: {} nodes, {} centroids in {:.1?}",
            graph.node_count(),
            obstacles.centroid_count(),
            started.elapsed()
        );

        *self.snapshot.write() = Some(Arc::new(GraphSnapshot {
            grid,
            graph,
            obstacles,
        }));
        self.updating.store(false, Ordering::Release);
        true
    }

    /// Plan up to `num_paths` topologically distinct smooth paths from
    /// `start` to `goal`, both in pixel coordinates.
    ///
    /// Blocks out a concurrent rebuild, then works on the current snapshot.
    /// Any failure is logged and yields an empty list; a single degraded
    /// path is dropped without discarding its siblings.
    pub fn plan(
        &self,
        start: PixelPoint,
        goal: PixelPoint,
        num_paths: usize,
    ) -> Vec<Vec<PixelPoint>> {
        while self.updating.load(Ordering::Acquire) {
            std::thread::yield_now();
        }
        self.planning.store(true, Ordering::Release);
        let result = self.plan_inner(start, goal, num_paths);
        self.planning.store(false, Ordering::Release);

        match result {
            Ok(paths) => paths,
            Err(e) => {
                warn!("plan: {}", e);
                Vec::new()
            }
        }
    }

    fn plan_inner(
        &self,
        start: PixelPoint,
        goal: PixelPoint,
        num_paths: usize,
    ) -> Result<Vec<Vec<PixelPoint>>> {
        if num_paths == 0 {
            return Ok(Vec::new());
        }
        let snapshot = match self.snapshot.read().clone() {
            Some(snapshot) => snapshot,
            None => {
                debug!("plan: no graph built yet");
                return Ok(Vec::new());
            }
        };
        let started = Instant::now();

        let checker = CollisionChecker::new(&snapshot.grid, &self.config);
        let start_node = snapshot.graph.nearest_reachable(&checker, start)?;
        let goal_node = snapshot.graph.nearest_reachable(&checker, goal)?;

        let (seed, cost) = planning::shortest_path(
            snapshot.graph.nodes(),
            snapshot.graph.adjacency(),
            start_node,
            goal_node,
        )?;
        debug!(
            "plan: seed path {} nodes, {:.1} px, {:.1?}",
            seed.len(),
            cost,
            started.elapsed()
        );

        let node_paths = planning::k_shortest_paths(
            &snapshot.graph,
            seed,
            goal_node,
            num_paths,
            &snapshot.obstacles,
            self.config.h_class_threshold,
        );

        let smoother = BezierSmoother::new(&checker, snapshot.grid.resolution(), &self.config);
        let mut paths = Vec::with_capacity(node_paths.len());
        for node_path in &node_paths {
            let mut full = Vec::with_capacity(node_path.len() + 2);
            full.push(start);
            full.extend(node_path.iter().map(|&index| snapshot.graph.node(index)));
            full.push(goal);

            match smoother.smooth(&full) {
                Ok(curve) => paths.push(curve),
                Err(e) => warn!("plan: dropping path, {}", e),
            }
        }

        info!(
            "plan: {} of {} requested paths in {:.1?}",
            paths.len(),
            num_paths,
            started.elapsed()
        );
        Ok(paths)
    }

    /// Current snapshot, if any rebuild has completed.
    pub fn snapshot(&self) -> Option<Arc<GraphSnapshot>> {
        self.snapshot.read().clone()
    }

    /// Roadmap edges of the current snapshot, for visualization.
    pub fn edges(&self) -> Vec<(PixelPoint, PixelPoint)> {
        self.snapshot()
            .map(|s| s.graph.edges())
            .unwrap_or_default()
    }

    /// Singly-connected roadmap nodes of the current snapshot.
    pub fn disconnected_nodes(&self) -> Vec<PixelPoint> {
        self.snapshot()
            .map(|s| s.graph.dangling_nodes())
            .unwrap_or_default()
    }

    /// Adjacency table of the current snapshot.
    pub fn adjacency(&self) -> Vec<Vec<i32>> {
        self.snapshot()
            .map(|s| s.graph.adjacency().to_vec())
            .unwrap_or_default()
    }
}
