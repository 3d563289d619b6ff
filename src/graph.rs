//! Roadmap graph assembled from pruned Voronoi edges.
//!
//! Vertices are deduplicated through a 16-bit-per-axis rounding key, the
//! adjacency is kept symmetric, and dangling tips left behind by edge
//! pruning are stitched back to their nearest neighbor.

use std::collections::HashMap;

use log::debug;

use crate::collision::CollisionChecker;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::types::PixelPoint;
use crate::voronoi::VoronoiEdge;

/// Marker for a temporarily severed adjacency slot during k-shortest-path
/// search. Outside a search no slot holds this value.
pub const TOMBSTONE: i32 = -1;

/// Undirected roadmap over the free space of one grid snapshot.
#[derive(Clone, Debug, Default)]
pub struct VoronoiGraph {
    nodes: Vec<PixelPoint>,
    adjacency: Vec<Vec<i32>>,
}

impl VoronoiGraph {
    /// Build the graph from raw Voronoi edges.
    ///
    /// Edges touching a blocked cell or crossing one are discarded before
    /// assembly; afterwards singly-connected nodes are stitched to any
    /// other node within the connection radius.
    pub fn build(
        mut edges: Vec<VoronoiEdge>,
        checker: &CollisionChecker<'_>,
        config: &PlannerConfig,
    ) -> Self {
        let raw = edges.len();
        edges.retain(|e| !checker.cell_blocked(e.start) && !checker.cell_blocked(e.end));
        let after_vertex_prune = edges.len();
        edges.retain(|e| !checker.segment_collides(e.start, e.end));
        debug!(
            "graph: {} edges -> {} after vertex prune -> {} after collision prune",
            raw,
            after_vertex_prune,
            edges.len()
        );

        let mut graph = Self::assemble(&edges);
        graph.stitch_dangling(config.node_connection_threshold);
        graph
    }

    fn assemble(edges: &[VoronoiEdge]) -> Self {
        let mut nodes: Vec<PixelPoint> = Vec::new();
        let mut adjacency: Vec<Vec<i32>> = Vec::new();
        let mut keys: HashMap<u32, usize> = HashMap::new();

        let mut intern = |nodes: &mut Vec<PixelPoint>,
                          adjacency: &mut Vec<Vec<i32>>,
                          point: PixelPoint| {
            *keys.entry(vertex_key(point)).or_insert_with(|| {
                nodes.push(point);
                adjacency.push(Vec::new());
                nodes.len() - 1
            })
        };

        for edge in edges {
            let a = intern(&mut nodes, &mut adjacency, edge.start);
            let b = intern(&mut nodes, &mut adjacency, edge.end);

            // Degenerate edges collapse onto one node; cell traversal also
            // reports each interior edge from both of its cells.
            if a == b || adjacency[a].contains(&(b as i32)) {
                continue;
            }
            adjacency[a].push(b as i32);
            adjacency[b].push(a as i32);
        }

        Self { nodes, adjacency }
    }

    /// Reconnect nodes with a single neighbor to any other node within
    /// `radius` pixels. Heals tips left dangling when a nearby edge was
    /// pruned.
    fn stitch_dangling(&mut self, radius: f64) {
        let limit = radius * radius;
        let count = self.nodes.len();

        for i in 0..count {
            if self.adjacency[i].len() != 1 {
                continue;
            }
            let anchor = self.adjacency[i][0];
            for j in 0..count {
                if j == i || j as i32 == anchor {
                    continue;
                }
                if self.nodes[j].squared_distance(&self.nodes[i]) <= limit {
                    self.adjacency[i].push(j as i32);
                    self.adjacency[j].push(i as i32);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of node `index`.
    #[inline]
    pub fn node(&self, index: usize) -> PixelPoint {
        self.nodes[index]
    }

    pub fn nodes(&self) -> &[PixelPoint] {
        &self.nodes
    }

    /// Full adjacency table. Neighbor order is arbitrary but stable for a
    /// given build.
    pub fn adjacency(&self) -> &[Vec<i32>] {
        &self.adjacency
    }

    pub fn neighbors(&self, index: usize) -> &[i32] {
        &self.adjacency[index]
    }

    /// Nearest node whose straight connection to `query` is collision-free.
    /// Ties break toward the smaller index.
    pub fn nearest_reachable(
        &self,
        checker: &CollisionChecker<'_>,
        query: PixelPoint,
    ) -> Result<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (index, node) in self.nodes.iter().enumerate() {
            let distance = node.squared_distance(&query);
            if best.is_some_and(|(d, _)| distance >= d) {
                continue;
            }
            if !checker.segment_collides(query, *node) {
                best = Some((distance, index));
            }
        }
        best.map(|(_, index)| index)
            .ok_or(PlannerError::NoReachableGraphNode {
                x: query.x,
                y: query.y,
            })
    }

    /// Total Euclidean length of a node sequence, in pixels.
    pub fn path_cost(&self, path: &[usize]) -> f64 {
        path.windows(2)
            .map(|pair| self.nodes[pair[0]].distance(&self.nodes[pair[1]]))
            .sum()
    }

    /// Every undirected edge once, as endpoint positions.
    pub fn edges(&self) -> Vec<(PixelPoint, PixelPoint)> {
        let mut edges = Vec::new();
        for (i, neighbors) in self.adjacency.iter().enumerate() {
            for &j in neighbors {
                if j != TOMBSTONE && (i as i32) < j {
                    edges.push((self.nodes[i], self.nodes[j as usize]));
                }
            }
        }
        edges
    }

    /// Positions of nodes with exactly one connection.
    pub fn dangling_nodes(&self) -> Vec<PixelPoint> {
        self.adjacency
            .iter()
            .enumerate()
            .filter(|(_, neighbors)| neighbors.len() == 1)
            .map(|(i, _)| self.nodes[i])
            .collect()
    }
}

/// Vertex identity key: both coordinates rounded to the nearest pixel and
/// packed 16 bits apiece. Valid because the grid constructor enforces
/// dimensions below 2^16 and edges are clipped to the map rectangle.
#[inline]
fn vertex_key(point: PixelPoint) -> u32 {
    let x = point.x.round().max(0.0) as u32 & 0xffff;
    let y = point.y.round().max(0.0) as u32 & 0xffff;
    (x << 16) ^ y
}
