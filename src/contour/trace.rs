//! Moore-Neighbor boundary tracing.

use crate::geometry::shoelace_area;
use crate::ir::{Coord, Pixel};

use super::grid::BinaryGrid;

// Clockwise from north: N, NE, E, SE, S, SW, W, NW.
const DX: [i64; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
const DY: [i64; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// The seed is the top-left-most pixel, so the search starts at NW.
const START_DIRECTION: usize = 7;

/// Contours enclosing less area than this are dropped by [`trace_all`].
pub const DEFAULT_MIN_AREA: f64 = 10.0;

/// Traces the boundary of the region holding the first foreground pixel in
/// raster order.
///
/// An empty mask yields an empty contour; an isolated pixel yields a single
/// point, which callers treat as no geometry.
pub fn trace(mask: &BinaryGrid) -> Vec<Coord<Pixel>> {
    match mask.first_foreground() {
        Some((x, y)) => trace_from(mask, x, y),
        None => Vec::new(),
    }
}

/// Traces one polygon per 8-connected foreground region, in raster order of
/// each region's first pixel.
///
/// Contours with fewer than 3 points or a shoelace area below `min_area`
/// are dropped. Holes are not traced.
pub fn trace_all(mask: &BinaryGrid, min_area: f64) -> Vec<Vec<Coord<Pixel>>> {
    let (width, height) = (mask.width(), mask.height());
    let mut visited = vec![false; width * height];
    let mut polygons = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || !mask.get(x as i64, y as i64) {
                continue;
            }

            let contour = trace_from(mask, x, y);
            mark_region(mask, &mut visited, x, y);

            if contour.len() >= 3 && shoelace_area(&contour) >= min_area {
                polygons.push(contour);
            }
        }
    }

    polygons
}

/// Walks the boundary clockwise from `(start_x, start_y)`.
///
/// The walk stops when it is back on the seed and about to repeat its first
/// step (Jacob's criterion), so a seed that bridges two blobs diagonally is
/// passed through once per blob before the contour closes.
fn trace_from(mask: &BinaryGrid, start_x: usize, start_y: usize) -> Vec<Coord<Pixel>> {
    let (start_x, start_y) = (start_x as i64, start_y as i64);
    let mut contour = vec![Coord::new(start_x as f64, start_y as f64)];

    let Some(first_step) = next_direction(mask, start_x, start_y, START_DIRECTION) else {
        // isolated pixel
        return contour;
    };

    let (mut x, mut y) = (start_x + DX[first_step], start_y + DY[first_step]);
    // backtrack two steps so the next search starts beside the pixel we came from
    let mut direction = (first_step + 6) % 8;
    let max_iterations = 2 * mask.width() * mask.height();
    let mut iterations = 0usize;

    // the pixel we just left is foreground, so a neighbour always exists
    while let Some(d) = next_direction(mask, x, y, direction) {
        if x == start_x && y == start_y && d == first_step {
            break;
        }

        iterations += 1;
        if iterations > max_iterations {
            tracing::warn!(
                start_x,
                start_y,
                points = contour.len(),
                "Contour trace hit its iteration bound; returning partial contour"
            );
            break;
        }

        contour.push(Coord::new(x as f64, y as f64));
        x += DX[d];
        y += DY[d];
        direction = (d + 6) % 8;
    }

    contour
}

/// First foreground neighbour of `(x, y)`, searching clockwise from `from`.
fn next_direction(mask: &BinaryGrid, x: i64, y: i64, from: usize) -> Option<usize> {
    (0..8)
        .map(|i| (from + i) % 8)
        .find(|&d| mask.get(x + DX[d], y + DY[d]))
}

/// Marks every pixel 8-connected to `(x, y)` as visited.
fn mark_region(mask: &BinaryGrid, visited: &mut [bool], x: usize, y: usize) {
    let width = mask.width();
    let mut stack = vec![(x as i64, y as i64)];
    visited[y * width + x] = true;

    while let Some((cx, cy)) = stack.pop() {
        for d in 0..8 {
            let (nx, ny) = (cx + DX[d], cy + DY[d]);
            if !mask.get(nx, ny) {
                continue;
            }
            let idx = ny as usize * width + nx as usize;
            if !visited[idx] {
                visited[idx] = true;
                stack.push((nx, ny));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(contour: &[Coord<Pixel>]) -> Vec<(i64, i64)> {
        contour.iter().map(|p| (p.x as i64, p.y as i64)).collect()
    }

    #[test]
    fn empty_mask_has_no_contour() {
        let mask = BinaryGrid::new(8, 8);
        assert!(trace(&mask).is_empty());
        assert!(trace_all(&mask, 0.0).is_empty());
    }

    #[test]
    fn isolated_pixel_is_single_point() {
        let mut mask = BinaryGrid::new(5, 5);
        mask.set(2, 2, true);
        assert_eq!(pts(&trace(&mask)), vec![(2, 2)]);
        assert!(trace_all(&mask, 0.0).is_empty());
    }

    #[test]
    fn square_block_is_traced_clockwise() {
        let mut mask = BinaryGrid::new(6, 6);
        mask.fill_rect(1, 1, 2, 2);
        assert_eq!(pts(&trace(&mask)), vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
    }

    #[test]
    fn rectangle_boundary_only() {
        let mut mask = BinaryGrid::new(10, 10);
        mask.fill_rect(2, 3, 5, 4);
        let contour = trace(&mask);
        // 5x4 block has a 14-pixel boundary ring
        assert_eq!(contour.len(), 14);
        assert_eq!(pts(&contour)[0], (2, 3));
        assert_eq!(shoelace_area(&contour), 12.0);
        for p in &contour {
            let on_edge = p.x == 2.0 || p.x == 6.0 || p.y == 3.0 || p.y == 6.0;
            assert!(on_edge, "interior point {p:?} in contour");
        }
    }

    #[test]
    fn trace_all_finds_each_region_once() {
        let mut mask = BinaryGrid::new(20, 10);
        mask.fill_rect(1, 1, 5, 5);
        mask.fill_rect(10, 2, 6, 6);
        let polygons = trace_all(&mask, DEFAULT_MIN_AREA);
        assert_eq!(polygons.len(), 2);
        assert_eq!(pts(&polygons[0])[0], (1, 1));
        assert_eq!(pts(&polygons[1])[0], (10, 2));
    }

    #[test]
    fn trace_all_drops_small_regions() {
        let mut mask = BinaryGrid::new(20, 20);
        mask.fill_rect(0, 0, 2, 2);
        mask.fill_rect(5, 5, 8, 8);
        let polygons = trace_all(&mask, DEFAULT_MIN_AREA);
        assert_eq!(polygons.len(), 1);
        assert_eq!(pts(&polygons[0])[0], (5, 5));
    }

    #[test]
    fn diagonal_pixels_are_one_region() {
        let mut mask = BinaryGrid::new(10, 10);
        mask.fill_rect(0, 0, 4, 4);
        mask.fill_rect(4, 4, 4, 4);
        let polygons = trace_all(&mask, 0.0);
        assert_eq!(polygons.len(), 1);
    }

    fn bridged_blocks() -> BinaryGrid {
        // seed (5, 0) touches both blocks only diagonally
        let mut mask = BinaryGrid::new(12, 12);
        mask.set(5, 0, true);
        mask.fill_rect(0, 1, 5, 10);
        mask.fill_rect(6, 1, 5, 10);
        mask
    }

    #[test]
    fn diagonal_bridge_traces_both_blocks() {
        let mask = bridged_blocks();
        let contour = trace(&mask);

        assert_eq!(pts(&contour)[0], (5, 0));
        // the bridge is passed once per block
        assert_eq!(pts(&contour).iter().filter(|&&p| p == (5, 0)).count(), 2);
        assert!(pts(&contour).contains(&(0, 10)));
        assert!(pts(&contour).contains(&(10, 10)));

        let polygons = trace_all(&mask, 0.0);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0], contour);
    }

    #[test]
    fn single_row_walks_out_and_back() {
        let mut mask = BinaryGrid::new(6, 3);
        mask.fill_rect(1, 1, 3, 1);
        assert_eq!(pts(&trace(&mask)), vec![(1, 1), (2, 1), (3, 1), (2, 1)]);
    }

    #[test]
    fn region_touching_grid_edge() {
        let mut mask = BinaryGrid::new(4, 4);
        mask.fill_rect(0, 0, 4, 4);
        let contour = trace(&mask);
        assert_eq!(contour.len(), 12);
        assert_eq!(shoelace_area(&contour), 9.0);
    }
}
