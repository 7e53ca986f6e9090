//! Polygon simplification: a radial-distance pre-filter followed by
//! Douglas-Peucker.
//!
//! Both stages keep the first and last point and only ever remove points.

use serde::{Deserialize, Serialize};

use crate::ir::Coord;

/// Default tolerance in pixels.
pub const DEFAULT_TOLERANCE: f64 = 2.0;

/// Simplification settings used when exporters turn masks into polygons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyOptions {
    /// Maximum perpendicular deviation in pixels. Zero disables
    /// simplification.
    pub tolerance: f64,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Two-stage simplification.
///
/// Runs the radial filter at half the tolerance, then Douglas-Peucker at the
/// full tolerance, and repeats both until a pass removes nothing, so the
/// result is a fixed point: simplifying it again returns it unchanged.
///
/// Fewer than 3 points, or a tolerance that is not a positive finite number,
/// returns the input unchanged.
pub fn simplify<TSpace>(points: &[Coord<TSpace>], tolerance: f64) -> Vec<Coord<TSpace>> {
    if points.len() < 3 || !(tolerance.is_finite() && tolerance > 0.0) {
        return points.to_vec();
    }

    let mut current = points.to_vec();
    loop {
        let radial = simplify_radial_distance(&current, tolerance * 0.5);
        let next = douglas_peucker(&radial, tolerance);
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

/// Keeps a point only when it lies farther than `tolerance` from the last
/// kept point. The first and last points are always kept.
pub fn simplify_radial_distance<TSpace>(
    points: &[Coord<TSpace>],
    tolerance: f64,
) -> Vec<Coord<TSpace>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![points[0]];
    let mut prev = points[0];
    for p in &points[1..] {
        if p.distance_to(&prev) > tolerance {
            kept.push(*p);
            prev = *p;
        }
    }

    let last = points[points.len() - 1];
    if kept.last() != Some(&last) {
        kept.push(last);
    }
    kept
}

/// Douglas-Peucker simplification with threshold `epsilon`.
pub fn douglas_peucker<TSpace>(points: &[Coord<TSpace>], epsilon: f64) -> Vec<Coord<TSpace>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    // explicit stack of (first, last) index ranges instead of recursion
    let mut ranges = vec![(0, points.len() - 1)];

    while let Some((first, last)) = ranges.pop() {
        if last - first < 2 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut max_index = first;
        for i in first + 1..last {
            let d = perpendicular_distance(&points[i], &points[first], &points[last]);
            if d > max_distance {
                max_distance = d;
                max_index = i;
            }
        }

        if max_distance > epsilon {
            keep[max_index] = true;
            ranges.push((first, max_index));
            ranges.push((max_index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Distance from `point` to the infinite line through `start` and `end`;
/// straight-line distance to `start` when the two coincide.
pub fn perpendicular_distance<TSpace>(
    point: &Coord<TSpace>,
    start: &Coord<TSpace>,
    end: &Coord<TSpace>,
) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    if dx == 0.0 && dy == 0.0 {
        return point.distance_to(start);
    }

    let numerator = (dy * point.x - dx * point.y + end.x * start.y - end.y * start.x).abs();
    numerator / dx.hypot(dy)
}

/// Percentage of points removed, clamped to `[0, 100]`. Diagnostic only.
pub fn calculate_reduction<TSpace>(original: &[Coord<TSpace>], simplified: &[Coord<TSpace>]) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    let removed = original.len() as f64 - simplified.len() as f64;
    (removed / original.len() as f64 * 100.0).clamp(0.0, 100.0)
}
