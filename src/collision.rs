//! Segment collision checks against the occupancy grid.

use crate::config::PlannerConfig;
use crate::grid::OccupancyGrid;
use crate::types::PixelPoint;

/// Collision oracle over a single grid snapshot.
///
/// A segment collides when any sample along it, taken every
/// `line_check_resolution` pixels with both endpoints included, falls in a
/// cell whose occupancy exceeds the collision threshold. Samples outside
/// the grid count as blocked.
#[derive(Clone, Copy, Debug)]
pub struct CollisionChecker<'a> {
    grid: &'a OccupancyGrid,
    collision_threshold: i16,
    step: f64,
}

impl<'a> CollisionChecker<'a> {
    pub fn new(grid: &'a OccupancyGrid, config: &PlannerConfig) -> Self {
        Self {
            grid,
            collision_threshold: config.collision_threshold,
            step: config.line_check_resolution,
        }
    }

    /// Whether the cell containing `point` blocks traversal.
    #[inline]
    pub fn cell_blocked(&self, point: PixelPoint) -> bool {
        match self.grid.occ_at(point) {
            Ok(value) => value > self.collision_threshold,
            Err(_) => true,
        }
    }

    /// Whether the straight segment from `start` to `end` crosses a blocked
    /// cell.
    pub fn segment_collides(&self, start: PixelPoint, end: PixelPoint) -> bool {
        let distance = start.distance(&end);
        let steps = if distance > self.step {
            (distance / self.step).ceil()
        } else {
            1.0
        };

        let count = steps as usize;
        for i in 0..=count {
            let t = i as f64 / steps;
            let sample = PixelPoint::new(
                (1.0 - t) * start.x + t * end.x,
                (1.0 - t) * start.y + t * end.y,
            );
            if self.cell_blocked(sample) {
                return true;
            }
        }
        false
    }
}
