//! Bezier smoothing of planned node sequences.
//!
//! A path is cut into maximal subsections whose control points can all be
//! reached from the subsection start without collision, each subsection is
//! sampled as a Bernstein-basis Bezier curve, and a collinear anchor point
//! carries the heading across subsection boundaries.

use crate::collision::CollisionChecker;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::types::PixelPoint;

/// Samples per smoothed subsection (t = 0, 0.05, ..., 1).
const SAMPLES: usize = 21;

/// Smooths full paths (literal start, graph nodes, literal goal) into dense
/// collision-free curves.
pub struct BezierSmoother<'a> {
    checker: &'a CollisionChecker<'a>,
    max_controls: usize,
    min_separation_sq: f64,
    anchor_offset: f64,
}

impl<'a> BezierSmoother<'a> {
    pub fn new(checker: &'a CollisionChecker<'a>, resolution: f64, config: &PlannerConfig) -> Self {
        Self {
            checker,
            // A subsection needs at least a start and one further control
            max_controls: config.bezier_max_n.max(2),
            min_separation_sq: config.min_node_sep_sq * resolution,
            anchor_offset: config.extra_point_distance * resolution,
        }
    }

    /// Smooth one path.
    ///
    /// Fails with `DegradedMap` when two adjacent input nodes collide: the
    /// graph no longer matches the grid, and the caller should wait for the
    /// next rebuild.
    pub fn smooth(&self, path: &[PixelPoint]) -> Result<Vec<PixelPoint>> {
        if path.len() < 2 {
            return Ok(path.to_vec());
        }

        let mut output = Vec::new();
        let mut controls: Vec<PixelPoint> = Vec::new();
        // Last two controls of the previous subsection, for the anchor
        let mut carry: Vec<PixelPoint> = Vec::new();

        let mut index = 1;
        while index < path.len() {
            if controls.is_empty() {
                controls.push(path[index - 1]);

                if index > 1 && carry.len() == 2 {
                    let direction = (carry[1] - carry[0]).normalized();
                    let anchor = carry[1] + direction * self.anchor_offset;
                    controls.push(anchor);
                    if self
                        .checker
                        .segment_collides(controls[controls.len() - 2], anchor)
                    {
                        controls.pop();
                    }
                    carry.clear();
                }
            }

            if self.checker.segment_collides(path[index - 1], path[index]) {
                return Err(PlannerError::DegradedMap);
            }

            if controls.len() < self.max_controls
                && !self.checker.segment_collides(controls[0], path[index])
            {
                controls.push(path[index]);
                index += 1;
            } else {
                // Subsection closed; the current node restarts the next one
                output.extend(self.subsection(&controls));
                if controls.len() > 1 {
                    carry = controls[controls.len() - 2..].to_vec();
                }
                controls.clear();
            }
        }

        if !controls.is_empty() {
            output.extend(self.subsection(&controls));
        }
        Ok(output)
    }

    /// Sample one subsection as a Bezier curve of degree `controls - 1`.
    fn subsection(&self, controls: &[PixelPoint]) -> Vec<PixelPoint> {
        if controls.len() == 1 {
            return controls.to_vec();
        }

        // Merge controls that sit almost on top of the previously kept one;
        // the final control always survives.
        let mut kept: Vec<PixelPoint> = Vec::with_capacity(controls.len());
        kept.push(controls[0]);
        for (index, point) in controls.iter().enumerate().skip(1) {
            let last = kept[kept.len() - 1];
            if index + 1 < controls.len() && point.squared_distance(&last) < self.min_separation_sq
            {
                continue;
            }
            kept.push(*point);
        }

        let degree = kept.len() - 1;
        let binomials: Vec<f64> = (0..=degree).map(|i| binomial(degree, i)).collect();

        let mut curve = Vec::with_capacity(SAMPLES);
        for step in 0..SAMPLES {
            let t = step as f64 / (SAMPLES - 1) as f64;
            let mut x = 0.0;
            let mut y = 0.0;
            for (i, point) in kept.iter().enumerate() {
                let basis = binomials[i] * t.powi(i as i32) * (1.0 - t).powi((degree - i) as i32);
                x += basis * point.x;
                y += basis * point.y;
            }
            curve.push(PixelPoint::new(x, y));
        }
        curve
    }
}

/// Binomial coefficient as f64, multiplicative form.
fn binomial(n: usize, k: usize) -> f64 {
    let k = if k > n - k { n - k } else { k };
    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64;
        result /= (i + 1) as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::OccupancyGrid;

    fn open_grid() -> OccupancyGrid {
        OccupancyGrid::new("map", 1.0, 40, 20, vec![0i16; 40 * 20]).unwrap()
    }

    fn walled_grid() -> OccupancyGrid {
        let mut data = vec![0i16; 40 * 20];
        for y in 0..20 {
            data[y * 40 + 20] = 100;
        }
        OccupancyGrid::new("map", 1.0, 40, 20, data).unwrap()
    }

    fn points(coords: &[(f64, f64)]) -> Vec<PixelPoint> {
        coords.iter().map(|&(x, y)| PixelPoint::new(x, y)).collect()
    }

    #[test]
    fn test_collinear_controls_stay_on_line() {
        let grid = open_grid();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);
        let smoother = BezierSmoother::new(&checker, grid.resolution(), &config);

        let path = points(&[(2.0, 10.0), (3.0, 10.0), (10.0, 10.0), (17.0, 10.0), (18.0, 10.0)]);
        let curve = smoother.smooth(&path).unwrap();

        assert_eq!(curve.len(), 21);
        assert_eq!(curve[0], PixelPoint::new(2.0, 10.0));
        assert!((curve[20].x - 18.0).abs() < 1e-9);
        for sample in &curve {
            assert!((sample.y - 10.0).abs() < 1e-9);
        }
        for pair in curve.windows(2) {
            assert!(pair[1].x >= pair[0].x - 1e-12);
        }
    }

    #[test]
    fn test_long_path_splits_into_subsections() {
        let grid = open_grid();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);
        let smoother = BezierSmoother::new(&checker, grid.resolution(), &config);

        let path: Vec<PixelPoint> = (0..15).map(|i| PixelPoint::new(2.0 * i as f64, 5.0)).collect();
        let curve = smoother.smooth(&path).unwrap();

        // Ten controls fill the first subsection, the rest the second
        assert_eq!(curve.len(), 42);
        assert_eq!(curve[0], path[0]);
        let last = curve[curve.len() - 1];
        assert!((last.x - path[14].x).abs() < 1e-9);
        assert!((last.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_duplicate_controls_are_merged() {
        let grid = open_grid();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);
        let smoother = BezierSmoother::new(&checker, grid.resolution(), &config);

        // Middle pair 0.3 px apart, below the separation threshold
        let path = points(&[(2.0, 5.0), (10.0, 5.0), (10.3, 5.0), (18.0, 5.0)]);
        let curve = smoother.smooth(&path).unwrap();
        assert_eq!(curve.len(), 21);
        assert!((curve[20].x - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjacent_colliding_nodes_abort() {
        let grid = walled_grid();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);
        let smoother = BezierSmoother::new(&checker, grid.resolution(), &config);

        let path = points(&[(2.0, 10.0), (38.0, 10.0)]);
        assert!(matches!(
            smoother.smooth(&path),
            Err(PlannerError::DegradedMap)
        ));
    }

    #[test]
    fn test_single_point_path_passes_through() {
        let grid = open_grid();
        let config = PlannerConfig::default();
        let checker = CollisionChecker::new(&grid, &config);
        let smoother = BezierSmoother::new(&checker, grid.resolution(), &config);

        let path = points(&[(4.0, 4.0)]);
        assert_eq!(smoother.smooth(&path).unwrap(), path);
    }

    #[test]
    fn test_binomial_coefficients() {
        assert_eq!(binomial(0, 0), 1.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(9, 4), 126.0);
        assert_eq!(binomial(9, 5), 126.0);
    }
}
