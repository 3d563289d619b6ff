//! Obstacle centroids and homotopy-class signatures.
//!
//! Each external obstacle contour contributes one complex centroid. A path
//! through the punctured plane gets a complex H-signature: the sum over its
//! edges of the per-obstacle change in `ln(z - c_k)`, weighted by
//! coefficients chosen so that two paths with common endpoints share a
//! signature exactly when they are homotopic among the obstacles
//! (Bhattacharya-style construction).

use std::f64::consts::{PI, TAU};

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use log::{debug, warn};
use num_complex::Complex64;

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::grid::OccupancyGrid;
use crate::types::PixelPoint;

/// A path vertex closer than this to a centroid makes the signature
/// numerically meaningless.
const CENTROID_CLEARANCE: f64 = 1.0;

/// Obstacle centroids with their signature coefficients, valid for one grid
/// snapshot.
#[derive(Clone, Debug, Default)]
pub struct ObstacleField {
    centroids: Vec<Complex64>,
    coefficients: Vec<Complex64>,
}

impl ObstacleField {
    /// Extract one centroid per external obstacle region of the grid and
    /// derive the signature coefficients.
    pub fn from_grid(grid: &OccupancyGrid, config: &PlannerConfig) -> Self {
        let centroids = find_centroids(grid, config);
        let bottom_left = Complex64::new(0.0, 0.0);
        let top_right = Complex64::new(
            grid.width().saturating_sub(1) as f64,
            grid.height().saturating_sub(1) as f64,
        );
        Self::from_centroids(centroids, bottom_left, top_right)
    }

    /// Build the field from known centroids and the map's anchor corners.
    pub fn from_centroids(
        centroids: Vec<Complex64>,
        bottom_left: Complex64,
        top_right: Complex64,
    ) -> Self {
        let coefficients = coefficients(&centroids, bottom_left, top_right);
        Self {
            centroids,
            coefficients,
        }
    }

    pub fn centroid_count(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroids(&self) -> &[Complex64] {
        &self.centroids
    }

    /// H-signature of a polyline through pixel space.
    ///
    /// Edge contributions are partial-summed across worker threads; the
    /// summation order only perturbs low-order bits, well inside the class
    /// threshold. Fails when any vertex passes within a pixel of a
    /// centroid.
    pub fn signature(&self, points: &[PixelPoint]) -> Result<Complex64> {
        if self.centroids.is_empty() || points.len() < 2 {
            return Ok(Complex64::new(0.0, 0.0));
        }

        for point in points {
            for centroid in &self.centroids {
                if (point.as_complex() - centroid).norm() < CENTROID_CLEARANCE {
                    return Err(PlannerError::CentroidContact {
                        x: centroid.re,
                        y: centroid.im,
                    });
                }
            }
        }

        let edge_count = points.len() - 1;
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(edge_count);
        let chunk = (edge_count / workers).max(1);

        let mut total = Complex64::new(0.0, 0.0);
        std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for worker in 0..workers {
                let lo = worker * chunk;
                let hi = if worker + 1 == workers {
                    edge_count
                } else {
                    (lo + chunk).min(edge_count)
                };
                handles.push(scope.spawn(move || self.sum_edges(points, lo, hi)));
            }
            for handle in handles {
                match handle.join() {
                    Ok(partial) => total += partial,
                    Err(_) => warn!("homotopy: signature worker panicked, partial sum dropped"),
                }
            }
        });

        Ok(total)
    }

    fn sum_edges(&self, points: &[PixelPoint], lo: usize, hi: usize) -> Complex64 {
        let mut sum = Complex64::new(0.0, 0.0);
        for index in lo..hi {
            let from = points[index].as_complex();
            let to = points[index + 1].as_complex();

            for (centroid, coefficient) in self.centroids.iter().zip(&self.coefficients) {
                let real = (to - centroid).norm().ln() - (from - centroid).norm().ln();
                let mut imag = (to - centroid).arg() - (from - centroid).arg();
                while imag > PI {
                    imag -= TAU;
                }
                while imag < -PI {
                    imag += TAU;
                }
                sum += Complex64::new(real, imag) * coefficient;
            }
        }
        sum
    }
}

/// Signature coefficients `A_k = f(c_k) / prod_{j != k} (c_k - c_j)` with
/// `f(z) = (z - BL)^a + (z - TR)^a` and `a = (M - 1) / 2`.
fn coefficients(
    centroids: &[Complex64],
    bottom_left: Complex64,
    top_right: Complex64,
) -> Vec<Complex64> {
    let count = centroids.len();
    if count == 0 {
        return Vec::new();
    }
    let exponent = (count as f64 - 1.0) / 2.0;

    centroids
        .iter()
        .enumerate()
        .map(|(k, &centroid)| {
            let numerator = boundary_term(centroid, bottom_left, exponent)
                + boundary_term(centroid, top_right, exponent);
            let denominator = centroids
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .fold(Complex64::new(1.0, 0.0), |product, (_, &other)| {
                    product * (centroid - other)
                });
            numerator / denominator
        })
        .collect()
}

#[inline]
fn boundary_term(z: Complex64, anchor: Complex64, exponent: f64) -> Complex64 {
    if exponent == 0.0 {
        Complex64::new(1.0, 0.0)
    } else {
        (z - anchor).powf(exponent)
    }
}

/// One centroid per external obstacle contour, in original pixel
/// coordinates.
///
/// The grid is binarized at the occupancy threshold, downscaled, and its
/// outer borders traced; each top-level contour yields the first-order
/// moment centroid of its polygon. Degenerate contours are dropped.
fn find_centroids(grid: &OccupancyGrid, config: &PlannerConfig) -> Vec<Complex64> {
    if grid.is_empty() {
        return Vec::new();
    }

    let width = grid.width();
    let height = grid.height();
    let image = GrayImage::from_fn(width, height, |x, y| {
        let value = grid.occ(x, y).unwrap_or(0);
        Luma([if value >= config.occupancy_threshold {
            255u8
        } else {
            0u8
        }])
    });

    let scaled_width = ((width as f64 * config.contour_scale).round() as u32).max(1);
    let scaled_height = ((height as f64 * config.contour_scale).round() as u32).max(1);
    let scaled = imageops::resize(&image, scaled_width, scaled_height, FilterType::Nearest);
    let scale_x = width as f64 / scaled_width as f64;
    let scale_y = height as f64 / scaled_height as f64;

    let mut centroids = Vec::new();
    for contour in find_contours::<i32>(&scaled) {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        if contour.points.is_empty() {
            continue;
        }
        let (cx, cy) = contour_centroid(&contour);
        if cx.is_nan() || cy.is_nan() {
            debug!("homotopy: dropping degenerate contour centroid");
            continue;
        }
        centroids.push(Complex64::new(cx * scale_x, cy * scale_y));
    }

    debug!("homotopy: {} obstacle centroids", centroids.len());
    centroids
}

/// First-order moment centroid of a traced contour polygon.
///
/// Thin regions collapse to zero area after downscaling; their centroid
/// falls back to the mean of the border points so the obstacle still
/// punctures the plane exactly once.
fn contour_centroid(contour: &Contour<i32>) -> (f64, f64) {
    let points = &contour.points;
    let count = points.len();

    let mut doubled_area = 0.0;
    let mut moment_x = 0.0;
    let mut moment_y = 0.0;
    for i in 0..count {
        let p = &points[i];
        let q = &points[(i + 1) % count];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        doubled_area += cross;
        moment_x += (p.x + q.x) as f64 * cross;
        moment_y += (p.y + q.y) as f64 * cross;
    }

    if doubled_area.abs() > 1e-9 {
        (
            moment_x / (3.0 * doubled_area),
            moment_y / (3.0 * doubled_area),
        )
    } else {
        let inv = 1.0 / count as f64;
        (
            points.iter().map(|p| p.x as f64).sum::<f64>() * inv,
            points.iter().map(|p| p.y as f64).sum::<f64>() * inv,
        )
    }
}
