//! A* shortest path over the roadmap adjacency.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{PlannerError, Result};
use crate::graph::TOMBSTONE;
use crate::types::PixelPoint;

/// Node in the A* open set.
#[derive(Clone)]
struct SearchNode {
    index: usize,
    f_score: f64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority)
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path from `start` to `goal` through `adjacency`.
///
/// Cost is cumulative Euclidean pixel distance; the heuristic is the
/// Euclidean distance to the goal node. Tombstoned neighbor slots are
/// skipped, so the same routine serves the spur searches of the
/// k-shortest-path enumeration. Returns the node sequence inclusive of
/// both endpoints together with the goal's settled cost.
pub fn shortest_path(
    nodes: &[PixelPoint],
    adjacency: &[Vec<i32>],
    start: usize,
    goal: usize,
) -> Result<(Vec<usize>, f64)> {
    if start == goal {
        return Ok((vec![start], 0.0));
    }

    let count = nodes.len();
    let mut g_score = vec![f64::INFINITY; count];
    let mut previous: Vec<Option<usize>> = vec![None; count];
    let mut closed = vec![false; count];
    let mut open = BinaryHeap::new();

    g_score[start] = 0.0;
    open.push(SearchNode {
        index: start,
        f_score: nodes[start].distance(&nodes[goal]),
    });

    while let Some(current) = open.pop() {
        let index = current.index;
        if closed[index] {
            continue;
        }
        closed[index] = true;

        if index == goal {
            return Ok((reconstruct(&previous, start, goal), g_score[goal]));
        }

        for &neighbor in &adjacency[index] {
            if neighbor == TOMBSTONE {
                continue;
            }
            let neighbor = neighbor as usize;
            if closed[neighbor] {
                continue;
            }

            let tentative = g_score[index] + nodes[index].distance(&nodes[neighbor]);
            if tentative < g_score[neighbor] {
                g_score[neighbor] = tentative;
                previous[neighbor] = Some(index);
                open.push(SearchNode {
                    index: neighbor,
                    f_score: tentative + nodes[neighbor].distance(&nodes[goal]),
                });
            }
        }
    }

    Err(PlannerError::NoPath { start, goal })
}

fn reconstruct(previous: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match previous[current] {
            Some(node) => {
                path.push(node);
                current = node;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
