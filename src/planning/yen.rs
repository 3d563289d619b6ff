//! Yen-style k-shortest-path enumeration filtered by homotopy class.
//!
//! Alternates are generated by spurring off every prefix of the most
//! recently accepted path with the already-used continuations severed,
//! then accepted in cost order provided their H-signature differs from
//! every accepted path's signature by more than the class threshold. The
//! result is one minimum-cost representative per topology class.

use std::cmp::Ordering;

use log::{debug, warn};
use num_complex::Complex64;

use crate::graph::{VoronoiGraph, TOMBSTONE};
use crate::homotopy::ObstacleField;
use crate::planning::astar;
use crate::types::PixelPoint;

/// Signatures with a magnitude below this are compared by absolute
/// difference instead of the relative threshold.
const MAGNITUDE_EPSILON: f64 = 1e-9;

/// Enumerate up to `num_paths` topologically distinct paths, starting from
/// the A* seed path.
///
/// Tombstoning happens on a private copy of the adjacency, so the shared
/// graph is never mutated and carries no tombstones afterwards. Candidates
/// whose vertices pass within a pixel of an obstacle centroid are
/// discarded (their signature is numerically meaningless).
pub fn k_shortest_paths(
    graph: &VoronoiGraph,
    seed: Vec<usize>,
    goal: usize,
    num_paths: usize,
    obstacles: &ObstacleField,
    h_class_threshold: f64,
) -> Vec<Vec<usize>> {
    let mut accepted = vec![seed];
    if num_paths <= 1 {
        return accepted;
    }

    let mut signatures: Vec<Complex64> = Vec::new();
    let mut candidates: Vec<(f64, Vec<usize>)> = Vec::new();
    let mut working: Vec<Vec<i32>> = graph.adjacency().to_vec();

    while accepted.len() < num_paths {
        let latest = accepted[accepted.len() - 1].clone();
        match obstacles.signature(&node_points(graph, &latest)) {
            Ok(h) => signatures.push(h),
            Err(e) => {
                warn!("homotopy registry unavailable for accepted path: {}", e);
                break;
            }
        }

        for spur_index in 0..latest.len().saturating_sub(1) {
            let spur = latest[spur_index];
            let root = &latest[..=spur_index];
            let mut touched: Vec<usize> = Vec::new();

            // Sever every continuation of this root already taken by an
            // accepted path.
            for path in &accepted {
                if path.len() > spur_index + 1 && path[..=spur_index] == *root {
                    let next = path[spur_index + 1];
                    tombstone_edge(&mut working, &mut touched, spur, next);
                    tombstone_edge(&mut working, &mut touched, next, spur);
                }
            }

            // Detach the interior of the root so the spur search cannot
            // loop back through it.
            for &node in &root[..spur_index] {
                for slot in 0..working[node].len() {
                    let other = working[node][slot];
                    if other == TOMBSTONE {
                        continue;
                    }
                    working[node][slot] = TOMBSTONE;
                    touched.push(node);
                    tombstone_edge(&mut working, &mut touched, other as usize, node);
                }
            }

            if let Ok((spur_path, _)) = astar::shortest_path(graph.nodes(), &working, spur, goal) {
                let mut candidate = root[..spur_index].to_vec();
                candidate.extend(spur_path);

                let duplicate = accepted.iter().any(|p| *p == candidate)
                    || candidates.iter().any(|(_, p)| *p == candidate);
                if !duplicate {
                    let cost = graph.path_cost(&candidate);
                    candidates.push((cost, candidate));
                }
            }

            for &node in &touched {
                working[node].clone_from(&graph.adjacency()[node]);
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        // Walk the cost-ordered pool: drop candidates that repeat a known
        // topology class, accept the first genuinely new one.
        let mut chosen: Option<Vec<usize>> = None;
        let mut index = 0;
        while index < candidates.len() {
            match obstacles.signature(&node_points(graph, &candidates[index].1)) {
                Ok(h) => {
                    if signatures
                        .iter()
                        .all(|prev| signatures_distinct(h, *prev, h_class_threshold))
                    {
                        chosen = Some(candidates.remove(index).1);
                        break;
                    }
                    candidates.remove(index);
                }
                Err(e) => {
                    debug!("candidate discarded: {}", e);
                    candidates.remove(index);
                }
            }
        }

        match chosen {
            Some(path) => accepted.push(path),
            None => break,
        }
    }

    accepted
}

fn node_points(graph: &VoronoiGraph, path: &[usize]) -> Vec<PixelPoint> {
    path.iter().map(|&index| graph.node(index)).collect()
}

fn tombstone_edge(adjacency: &mut [Vec<i32>], touched: &mut Vec<usize>, from: usize, to: usize) {
    if let Some(slot) = adjacency[from].iter().position(|&n| n == to as i32) {
        adjacency[from][slot] = TOMBSTONE;
        touched.push(from);
    }
}

fn signatures_distinct(a: Complex64, b: Complex64, threshold: f64) -> bool {
    let magnitude = a.norm();
    let difference = (a - b).norm();
    if magnitude < MAGNITUDE_EPSILON {
        difference > threshold
    } else {
        difference / magnitude > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionChecker;
    use crate::config::PlannerConfig;
    use crate::grid::OccupancyGrid;
    use crate::voronoi::VoronoiEdge;

    /// Diamond roadmap around a single obstacle centroid at (5, 5):
    /// one route above, one short route below, one long route below.
    ///
    ///          a (5,9)
    ///   s (0,5)         g (10,5)
    ///          b (5,2)
    ///          c (5,0)
    fn create_test_graph() -> (OccupancyGrid, VoronoiGraph, ObstacleField) {
        let grid = OccupancyGrid::new("map", 1.0, 12, 12, vec![0i16; 144]).unwrap();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);

        let edge = |ax: f64, ay: f64, bx: f64, by: f64| VoronoiEdge {
            start: PixelPoint::new(ax, ay),
            end: PixelPoint::new(bx, by),
        };
        let edges = vec![
            edge(0.0, 5.0, 5.0, 9.0),
            edge(5.0, 9.0, 10.0, 5.0),
            edge(0.0, 5.0, 5.0, 2.0),
            edge(5.0, 2.0, 10.0, 5.0),
            edge(0.0, 5.0, 5.0, 0.0),
            edge(5.0, 0.0, 10.0, 5.0),
        ];
        let graph = VoronoiGraph::build(edges, &checker, &config);

        let field = ObstacleField::from_centroids(
            vec![Complex64::new(5.0, 5.0)],
            Complex64::new(0.0, 0.0),
            Complex64::new(11.0, 11.0),
        );
        (grid, graph, field)
    }

    fn find_node(graph: &VoronoiGraph, x: f64, y: f64) -> usize {
        graph
            .nodes()
            .iter()
            .position(|n| (n.x - x).abs() < 1e-9 && (n.y - y).abs() < 1e-9)
            .unwrap()
    }

    #[test]
    fn test_second_path_crosses_to_other_side() {
        let (_grid, graph, field) = create_test_graph();
        let start = find_node(&graph, 0.0, 5.0);
        let goal = find_node(&graph, 10.0, 5.0);

        let (seed, _) = astar::shortest_path(graph.nodes(), graph.adjacency(), start, goal).unwrap();
        // Shortest route runs below, through (5, 2)
        assert!(seed.contains(&find_node(&graph, 5.0, 2.0)));

        let paths = k_shortest_paths(&graph, seed, goal, 2, &field, 0.2);
        assert_eq!(paths.len(), 2);
        // The alternate must wind the other way, through (5, 9); the long
        // below route repeats the seed's class and is filtered out.
        assert!(paths[1].contains(&find_node(&graph, 5.0, 9.0)));
    }

    #[test]
    fn test_exhausted_classes_stop_enumeration() {
        let (_grid, graph, field) = create_test_graph();
        let start = find_node(&graph, 0.0, 5.0);
        let goal = find_node(&graph, 10.0, 5.0);

        let (seed, _) = astar::shortest_path(graph.nodes(), graph.adjacency(), start, goal).unwrap();
        let paths = k_shortest_paths(&graph, seed, goal, 5, &field, 0.2);

        // Only two homotopy classes exist; the request for five is met with
        // two and no error.
        assert_eq!(paths.len(), 2);
        for (i, a) in paths.iter().enumerate() {
            for b in paths.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_costs_are_non_decreasing() {
        let (_grid, graph, field) = create_test_graph();
        let start = find_node(&graph, 0.0, 5.0);
        let goal = find_node(&graph, 10.0, 5.0);

        let (seed, _) = astar::shortest_path(graph.nodes(), graph.adjacency(), start, goal).unwrap();
        let paths = k_shortest_paths(&graph, seed, goal, 2, &field, 0.2);

        let costs: Vec<f64> = paths.iter().map(|p| graph.path_cost(p)).collect();
        for pair in costs.windows(2) {
            assert!(pair[0] <= pair[1] + 1e-9);
        }
    }

    #[test]
    fn test_graph_is_left_unmodified() {
        let (_grid, graph, field) = create_test_graph();
        let start = find_node(&graph, 0.0, 5.0);
        let goal = find_node(&graph, 10.0, 5.0);
        let before: Vec<Vec<i32>> = graph.adjacency().to_vec();

        let (seed, _) = astar::shortest_path(graph.nodes(), graph.adjacency(), start, goal).unwrap();
        let _ = k_shortest_paths(&graph, seed, goal, 3, &field, 0.2);

        assert_eq!(graph.adjacency(), &before[..]);
        assert!(graph
            .adjacency()
            .iter()
            .all(|neighbors| neighbors.iter().all(|&n| n != TOMBSTONE)));
    }

    #[test]
    fn test_seed_touching_centroid_aborts_alternates() {
        let (_grid, graph, _) = create_test_graph();
        let start = find_node(&graph, 0.0, 5.0);
        let goal = find_node(&graph, 10.0, 5.0);

        // Centroid within a pixel of the lower route's waypoint (5, 2)
        let field = ObstacleField::from_centroids(
            vec![Complex64::new(5.0, 2.5)],
            Complex64::new(0.0, 0.0),
            Complex64::new(11.0, 11.0),
        );

        let (seed, _) = astar::shortest_path(graph.nodes(), graph.adjacency(), start, goal).unwrap();
        let paths = k_shortest_paths(&graph, seed.clone(), goal, 3, &field, 0.2);
        assert_eq!(paths, vec![seed]);
    }

    #[test]
    fn test_distinctness_falls_back_to_absolute_difference() {
        let near_zero = Complex64::new(0.0, 0.0);
        assert!(!signatures_distinct(near_zero, near_zero, 0.2));
        assert!(signatures_distinct(
            near_zero,
            Complex64::new(0.5, 0.0),
            0.2
        ));
    }
}
