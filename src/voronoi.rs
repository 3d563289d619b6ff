//! Voronoi site collection and diagram generation.
//!
//! Occupied cells become diagram sites; the resulting edges, clipped to the
//! map rectangle, are the raw material for the roadmap graph.

use log::{debug, warn};
use voronoice::{BoundingBox, Point, VoronoiBuilder};

use crate::grid::OccupancyGrid;
use crate::types::PixelPoint;

/// One clipped Voronoi edge in pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub struct VoronoiEdge {
    pub start: PixelPoint,
    pub end: PixelPoint,
}

/// Collect Voronoi sites from the grid.
///
/// Cells with occupancy at or above `occupancy_threshold` are sampled with
/// a stride of `pixels_to_skip + 1`; `extra` points (typically the corners
/// of a local costmap) are appended verbatim. The scan is partitioned into
/// contiguous chunks across the available cores; the order of the returned
/// sites is unspecified.
pub fn collect_sites(
    grid: &OccupancyGrid,
    occupancy_threshold: i16,
    pixels_to_skip: usize,
    extra: &[PixelPoint],
) -> Vec<PixelPoint> {
    let cells = grid.cell_count();
    let step = pixels_to_skip + 1;

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(cells.max(1));
    let chunk = (cells / workers).max(1);

    let mut sites = Vec::new();
    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let lo = worker * chunk;
            let hi = if worker + 1 == workers {
                cells
            } else {
                (lo + chunk).min(cells)
            };
            handles.push(scope.spawn(move || scan_chunk(grid, occupancy_threshold, lo, hi, step)));
        }
        for handle in handles {
            match handle.join() {
                Ok(part) => sites.extend(part),
                Err(_) => warn!("voronoi: site scan worker panicked, chunk dropped"),
            }
        }
    });

    sites.extend_from_slice(extra);
    sites
}

fn scan_chunk(
    grid: &OccupancyGrid,
    occupancy_threshold: i16,
    lo: usize,
    hi: usize,
    step: usize,
) -> Vec<PixelPoint> {
    let data = grid.data();
    let width = grid.width() as usize;
    let mut sites = Vec::new();

    let mut index = lo;
    while index < hi {
        if data[index] >= occupancy_threshold {
            sites.push(PixelPoint::new(
                (index % width) as f64,
                (index / width) as f64,
            ));
        }
        index += step;
    }
    sites
}

/// Build the clipped Voronoi diagram of the site set and return its edges.
///
/// Edges are clipped to `[0, width - 1] x [0, height - 1]`. Every interior
/// edge is emitted once per adjacent cell; assembly deduplicates. A site
/// set too small or too degenerate to triangulate yields no edges.
pub fn build_edges(sites: &[PixelPoint], width: u32, height: u32) -> Vec<VoronoiEdge> {
    if sites.len() < 3 || width < 2 || height < 2 {
        debug!(
            "voronoi: {} sites on {}x{} map, diagram undefined",
            sites.len(),
            width,
            height
        );
        return Vec::new();
    }

    let span_x = (width - 1) as f64;
    let span_y = (height - 1) as f64;
    let bounds = BoundingBox::new(
        Point {
            x: span_x / 2.0,
            y: span_y / 2.0,
        },
        span_x,
        span_y,
    );

    let points: Vec<Point> = sites.iter().map(|s| Point { x: s.x, y: s.y }).collect();

    let diagram = match VoronoiBuilder::default()
        .set_sites(points)
        .set_bounding_box(bounds)
        .build()
    {
        Some(diagram) => diagram,
        None => {
            warn!("voronoi: degenerate site set, no diagram generated");
            return Vec::new();
        }
    };

    let mut edges = Vec::new();
    for cell in diagram.iter_cells() {
        let vertices: Vec<&Point> = cell.iter_vertices().collect();
        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            edges.push(VoronoiEdge {
                start: PixelPoint::new(a.x, a.y),
                end: PixelPoint::new(b.x, b.y),
            });
        }
    }

    debug!("voronoi: {} cell edges from {} sites", edges.len(), sites.len());
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_grid() -> OccupancyGrid {
        // 16x16 with a 2x2 occupied block at (5..7, 5..7)
        let mut data = vec![0i16; 16 * 16];
        for y in 5..7 {
            for x in 5..7 {
                data[y * 16 + x] = 100;
            }
        }
        OccupancyGrid::new("map", 1.0, 16, 16, data).unwrap()
    }

    #[test]
    fn test_collect_sites_finds_occupied_cells() {
        let grid = create_test_grid();
        let sites = collect_sites(&grid, 100, 0, &[]);
        assert_eq!(sites.len(), 4);
        assert!(sites.contains(&PixelPoint::new(5.0, 6.0)));
    }

    #[test]
    fn test_extra_seed_points_are_appended() {
        let grid = create_test_grid();
        let corners = [PixelPoint::new(0.0, 0.0), PixelPoint::new(15.0, 15.0)];
        let sites = collect_sites(&grid, 100, 0, &corners);
        assert_eq!(sites.len(), 6);
        assert!(sites.contains(&PixelPoint::new(15.0, 15.0)));
    }

    #[test]
    fn test_stride_skips_cells() {
        let grid = create_test_grid();
        let every = collect_sites(&grid, 100, 0, &[]);
        let strided = collect_sites(&grid, 100, 1, &[]);
        assert!(strided.len() < every.len());
    }

    #[test]
    fn test_edges_clipped_to_map_rectangle() {
        let grid = create_test_grid();
        let sites = collect_sites(&grid, 100, 0, &[]);
        let edges = build_edges(&sites, grid.width(), grid.height());
        assert!(!edges.is_empty());
        for edge in &edges {
            for point in [edge.start, edge.end] {
                assert!(point.x >= -1e-9 && point.x <= 15.0 + 1e-9);
                assert!(point.y >= -1e-9 && point.y <= 15.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_too_few_sites_yield_no_edges() {
        let sites = [PixelPoint::new(1.0, 1.0), PixelPoint::new(2.0, 2.0)];
        assert!(build_edges(&sites, 16, 16).is_empty());
    }
}
