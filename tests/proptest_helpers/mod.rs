#![allow(dead_code)]

use annotix::contour::BinaryGrid;
use annotix::inference::RawBox;
use annotix::ir::{Coord, Pixel};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_IOU: f32 = 1e-4;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

// ============================================================================
// Masks
// ============================================================================

/// A grid made of up to `max_rects` filled rectangles.
///
/// Rectangles are at least 3×3 so each region has a real interior.
pub fn arb_rect_grid(width: usize, height: usize, max_rects: usize) -> BoxedStrategy<BinaryGrid> {
    prop::collection::vec(
        (0..width - 3, 0..height - 3, 3usize..=12, 3usize..=12),
        1..=max_rects,
    )
    .prop_map(move |rects| {
        let mut grid = BinaryGrid::new(width, height);
        for (x, y, w, h) in rects {
            grid.fill_rect(x, y, w.min(width - x), h.min(height - y));
        }
        grid
    })
    .boxed()
}

/// Two blocks joined only through one pixel that touches each diagonally.
pub fn arb_bridged_grid() -> BoxedStrategy<BinaryGrid> {
    (3usize..=10, 3usize..=10, 3usize..=12)
        .prop_map(|(left, right, height)| {
            let mut grid = BinaryGrid::new(left + 1 + right, height + 1);
            grid.set(left, 0, true);
            grid.fill_rect(0, 1, left, height);
            grid.fill_rect(left + 1, 1, right, height);
            grid
        })
        .boxed()
}

/// A grid with arbitrary cells, noise included.
pub fn arb_noise_grid(max_side: usize) -> BoxedStrategy<BinaryGrid> {
    (1..=max_side, 1..=max_side)
        .prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<bool>(), w * h)
                .prop_map(move |cells| BinaryGrid::from_cells(w, h, cells).expect("cell count"))
        })
        .boxed()
}

// ============================================================================
// Polylines
// ============================================================================

pub fn arb_point() -> BoxedStrategy<Coord<Pixel>> {
    (-500.0f64..500.0, -500.0f64..500.0)
        .prop_map(|(x, y)| Coord::new(x, y))
        .boxed()
}

pub fn arb_polyline(max_len: usize) -> BoxedStrategy<Vec<Coord<Pixel>>> {
    prop::collection::vec(arb_point(), 0..=max_len).boxed()
}

/// A closed random walk, like a traced or hand-drawn outline.
pub fn arb_walk(max_len: usize) -> BoxedStrategy<Vec<Coord<Pixel>>> {
    (arb_point(), prop::collection::vec((-4.0f64..4.0, -4.0f64..4.0), 3..=max_len))
        .prop_map(|(start, steps)| {
            let mut points = vec![start];
            let mut current = start;
            for (dx, dy) in steps {
                current = current.translated(dx, dy);
                points.push(current);
            }
            points.push(start);
            points
        })
        .boxed()
}

// ============================================================================
// Detections
// ============================================================================

pub fn arb_raw_box(max_class: usize) -> BoxedStrategy<RawBox> {
    (
        0.0f32..600.0,
        0.0f32..600.0,
        1.0f32..200.0,
        1.0f32..200.0,
        0..max_class,
        0.0f32..=1.0,
    )
        .prop_map(|(x, y, width, height, class_index, confidence)| RawBox {
            x,
            y,
            width,
            height,
            class_index,
            confidence,
        })
        .boxed()
}

pub fn arb_raw_boxes(max_len: usize, max_class: usize) -> BoxedStrategy<Vec<RawBox>> {
    prop::collection::vec(arb_raw_box(max_class), 0..=max_len).boxed()
}

/// Fraction of `a`'s foreground cells that are also set in `b`.
pub fn coverage(a: &BinaryGrid, b: &BinaryGrid) -> f64 {
    let total = a.count_foreground();
    if total == 0 {
        return 1.0;
    }
    let mut hit = 0usize;
    for y in 0..a.height() as i64 {
        for x in 0..a.width() as i64 {
            if a.get(x, y) && b.get(x, y) {
                hit += 1;
            }
        }
    }
    hit as f64 / total as f64
}
