//! Pure geometry helpers shared by tracing, inference and exporters.

use crate::ir::{BBoxXYXY, Coord, ObbData, Pixel};

/// Rounds half-way cases towards positive infinity, matching the rounding
/// every image-annotation consumer of these files expects (`2.5 -> 3`,
/// `-2.5 -> -2`).
#[inline]
pub fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Signed shoelace area; positive for clockwise polygons in image
/// coordinates (y down).
pub fn signed_area<TSpace>(points: &[Coord<TSpace>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Absolute shoelace area of a closed polygon. Fewer than 3 points have
/// zero area.
pub fn shoelace_area<TSpace>(points: &[Coord<TSpace>]) -> f64 {
    signed_area(points).abs()
}

/// Area centroid of a polygon. Degenerate polygons fall back to the vertex
/// mean; an empty slice yields `None`.
pub fn centroid<TSpace>(points: &[Coord<TSpace>]) -> Option<Coord<TSpace>> {
    if points.is_empty() {
        return None;
    }

    let area = signed_area(points);
    if area.abs() < f64::EPSILON {
        let n = points.len() as f64;
        let sx: f64 = points.iter().map(|p| p.x).sum();
        let sy: f64 = points.iter().map(|p| p.y).sum();
        return Some(Coord::new(sx / n, sy / n));
    }

    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Coord::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Axis-aligned bounds of a point set.
#[inline]
pub fn bounds<TSpace>(points: &[Coord<TSpace>]) -> Option<BBoxXYXY<TSpace>> {
    BBoxXYXY::from_points(points)
}

/// Corners of an oriented box: local `(±w/2, ±h/2)` rotated about the
/// center by `rotation` degrees.
pub fn obb_corners(obb: &ObbData) -> [Coord<Pixel>; 4] {
    let center = obb.center();
    let (hw, hh) = (obb.width / 2.0, obb.height / 2.0);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
        .map(|(lx, ly)| center.translated(lx, ly).rotated_about(&center, obb.rotation))
}

/// Axis-aligned bounds of the rotated corners. Rotation is lost.
pub fn obb_to_aabb(obb: &ObbData) -> BBoxXYXY<Pixel> {
    let corners = obb_corners(obb);
    let mut bbox = BBoxXYXY::from_xyxy(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
    for c in &corners[1..] {
        bbox.min.x = bbox.min.x.min(c.x);
        bbox.min.y = bbox.min.y.min(c.y);
        bbox.max.x = bbox.max.x.max(c.x);
        bbox.max.y = bbox.max.y.max(c.y);
    }
    bbox
}

/// Flattens points into `[x1, y1, x2, y2, ...]`.
pub fn flatten<TSpace>(points: &[Coord<TSpace>]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}
