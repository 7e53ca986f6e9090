//! A small 2D raster abstraction for mask rendering.
//!
//! Exporters draw class values onto a [`RasterSurface`]; the crate ships a
//! software grayscale backend ([`GraySurface`]). Decoded mask images are
//! kept in a caller-owned [`MaskCache`] for the length of one render
//! session.

use std::collections::HashMap;
use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma, RgbaImage};

use crate::contour::{decode_mask, BinaryGrid, ALPHA_THRESHOLD};
use crate::error::AnnotixError;
use crate::geometry::js_round;
use crate::ir::{AnnotationId, Coord, MaskData, Pixel};

/// Single-channel drawing operations.
///
/// Polygon coordinates are continuous image coordinates; pixel `(x, y)`
/// covers `[x, x+1) × [y, y+1)` and is sampled at its center.
pub trait RasterSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reads one pixel; `None` outside the surface.
    fn get(&self, x: u32, y: u32) -> Option<u8>;

    /// Writes one pixel; writes outside the surface are ignored.
    fn put(&mut self, x: i64, y: i64, value: u8);

    /// Fills a rectangle, clipped to the surface.
    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, value: u8) {
        for yy in y..y + i64::from(height) {
            for xx in x..x + i64::from(width) {
                self.put(xx, yy, value);
            }
        }
    }

    /// Scanline fill with the nonzero winding rule, sampling pixel centers.
    /// The polygon is implicitly closed; fewer than 3 points draw nothing.
    fn fill_polygon(&mut self, points: &[Coord<Pixel>], value: u8) {
        if points.len() < 3 {
            return;
        }

        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for row in 0..self.height() {
            let yc = f64::from(row) + 0.5;
            crossings.clear();

            for (i, a) in points.iter().enumerate() {
                let b = &points[(i + 1) % points.len()];
                let (upward, downward) = (a.y <= yc && b.y > yc, b.y <= yc && a.y > yc);
                if upward || downward {
                    let t = (yc - a.y) / (b.y - a.y);
                    crossings.push((a.x + t * (b.x - a.x), if upward { 1 } else { -1 }));
                }
            }
            crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for &(x, dir) in &crossings {
                let was_inside = winding != 0;
                winding += dir;
                if !was_inside && winding != 0 {
                    span_start = x;
                } else if was_inside && winding == 0 {
                    fill_span(self, row, span_start, x, value);
                }
            }
        }
    }

    /// Marks every pixel a closed polyline passes through, stepping one
    /// pixel at a time along the major axis.
    fn stroke_polygon(&mut self, points: &[Coord<Pixel>], value: u8) {
        match points {
            [] => {}
            [p] => self.put(js_round(p.x) as i64, js_round(p.y) as i64, value),
            _ => {
                for (i, a) in points.iter().enumerate() {
                    let b = &points[(i + 1) % points.len()];
                    let (dx, dy) = (b.x - a.x, b.y - a.y);
                    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
                    for s in 0..=steps {
                        let t = s as f64 / steps as f64;
                        self.put(
                            js_round(a.x + dx * t) as i64,
                            js_round(a.y + dy * t) as i64,
                            value,
                        );
                    }
                }
            }
        }
    }

    /// Paints a traced pixel contour: fill plus boundary stroke, so the
    /// boundary pixels the contour runs through are covered too.
    fn fill_contour(&mut self, points: &[Coord<Pixel>], value: u8) {
        self.fill_polygon(points, value);
        self.stroke_polygon(points, value);
    }

    /// Writes `value` wherever the mask's alpha exceeds 128, with the mask's
    /// top-left at `(x, y)`. Other pixels are left untouched.
    fn composite_alpha(&mut self, mask: &RgbaImage, x: i64, y: i64, value: u8) {
        for (mx, my, px) in mask.enumerate_pixels() {
            if px.0[3] > ALPHA_THRESHOLD {
                self.put(x + i64::from(mx), y + i64::from(my), value);
            }
        }
    }

    /// Reads the surface back as a grid of pixels strictly above `threshold`.
    fn read_threshold(&self, threshold: u8) -> BinaryGrid {
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mut grid = BinaryGrid::new(w, h);
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.get(x, y).is_some_and(|v| v > threshold) {
                    grid.set(x as usize, y as usize, true);
                }
            }
        }
        grid
    }
}

fn fill_span<S: RasterSurface + ?Sized>(surface: &mut S, row: u32, start: f64, end: f64, value: u8) {
    // pixel x is inside when start <= x + 0.5 < end
    let first = (start - 0.5).ceil().max(0.0);
    let last = ((end - 0.5).ceil() - 1.0).min(f64::from(surface.width()) - 1.0);
    if first > last {
        return;
    }
    for x in first as i64..=last as i64 {
        surface.put(x, i64::from(row), value);
    }
}

/// Software 8-bit grayscale surface, initialized to 0.
#[derive(Clone, Debug)]
pub struct GraySurface {
    image: GrayImage,
}

impl GraySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Encodes the surface as a grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

impl RasterSurface for GraySurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, value: u8) {
        if x >= 0 && y >= 0 && x < i64::from(self.image.width()) && y < i64::from(self.image.height())
        {
            self.image.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}

/// Decoded mask images keyed by annotation id.
///
/// Owned by the caller for one render session; nothing is evicted
/// implicitly. Call [`MaskCache::clear`] between sessions.
#[derive(Debug, Default)]
pub struct MaskCache {
    entries: HashMap<AnnotationId, RgbaImage>,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the decoded mask, decoding and caching it on first use.
    pub fn get_or_decode(
        &mut self,
        id: &AnnotationId,
        mask: &MaskData,
    ) -> Result<&RgbaImage, AnnotixError> {
        if !self.entries.contains_key(id) {
            let decoded = decode_mask(id, mask)?;
            self.entries.insert(id.clone(), decoded);
        }
        self.entries.get(id).ok_or_else(|| AnnotixError::MaskDecode {
            annotation_id: id.to_string(),
            message: "mask missing from cache".to_string(),
        })
    }

    pub fn evict(&mut self, id: &AnnotationId) -> Option<RgbaImage> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
