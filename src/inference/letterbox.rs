//! Letterbox preprocessing and the inverse mapping back to original pixels.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::decode::RawBox;
use crate::error::AnnotixError;
use crate::geometry::js_round;
use crate::ir::{BBoxData, BBoxXYXY, Canvas, Pixel};

/// Padding color of the model-input canvas.
pub const PAD_COLOR: Rgb<u8> = Rgb([114, 114, 114]);

/// How an original image was placed on the square model-input canvas.
///
/// Plain data so callers can carry it next to the tensor it describes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterboxTransform {
    pub scale: f64,
    pub pad_x: u32,
    pub pad_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub input_size: u32,
}

impl LetterboxTransform {
    /// Computes the placement of a `width × height` image on a
    /// `target_size²` canvas.
    ///
    /// `scale = min(T/W, T/H)`; scaled extents and padding are rounded half
    /// up.
    pub fn new(width: u32, height: u32, target_size: u32) -> Result<Self, AnnotixError> {
        if width == 0 || height == 0 || target_size == 0 {
            return Err(AnnotixError::InvalidDimensions {
                width,
                height,
                target_size,
            });
        }

        let t = f64::from(target_size);
        let scale = (t / f64::from(width)).min(t / f64::from(height));
        let scaled_width = (js_round(f64::from(width) * scale) as u32).clamp(1, target_size);
        let scaled_height = (js_round(f64::from(height) * scale) as u32).clamp(1, target_size);
        let pad_x = js_round(f64::from(target_size - scaled_width) / 2.0) as u32;
        let pad_y = js_round(f64::from(target_size - scaled_height) / 2.0) as u32;

        Ok(Self {
            scale,
            pad_x,
            pad_y,
            scaled_width,
            scaled_height,
            original_width: width,
            original_height: height,
            input_size: target_size,
        })
    }

    /// Maps an original-image box onto the canvas.
    pub fn to_canvas(&self, bbox: &BBoxXYXY<Pixel>) -> BBoxXYXY<Canvas> {
        let (px, py) = (f64::from(self.pad_x), f64::from(self.pad_y));
        BBoxXYXY::from_xyxy(
            bbox.xmin() * self.scale + px,
            bbox.ymin() * self.scale + py,
            bbox.xmax() * self.scale + px,
            bbox.ymax() * self.scale + py,
        )
    }

    /// Maps a canvas box back to original pixels, clamped to the image.
    ///
    /// The result satisfies `0 <= x <= W`, `0 <= y <= H`,
    /// `0 <= width <= W - x` and `0 <= height <= H - y`.
    pub fn to_original(&self, bbox: &BBoxXYXY<Canvas>) -> BBoxXYXY<Pixel> {
        let (px, py) = (f64::from(self.pad_x), f64::from(self.pad_y));
        let unclamped: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(
            (bbox.xmin() - px) / self.scale,
            (bbox.ymin() - py) / self.scale,
            (bbox.xmax() - px) / self.scale,
            (bbox.ymax() - py) / self.scale,
        );
        let clamped = unclamped.clamp_to(
            f64::from(self.original_width),
            f64::from(self.original_height),
        );
        // a box with negative extent collapses onto its clamped origin
        BBoxXYXY::from_xyxy(
            clamped.xmin(),
            clamped.ymin(),
            clamped.xmax().max(clamped.xmin()),
            clamped.ymax().max(clamped.ymin()),
        )
    }

    /// Inverse-maps a decoded detection into an annotation box.
    pub fn scale_to_original(&self, raw: &RawBox) -> BBoxData {
        BBoxData::from_xyxy(&self.to_original(&raw.to_xyxy()))
    }
}

/// A letterboxed image and the transform that produced it.
#[derive(Clone, Debug)]
pub struct Letterboxed {
    pub canvas: RgbImage,
    pub transform: LetterboxTransform,
}

/// Resizes `image` preserving aspect ratio and centers it on a gray
/// `target_size²` canvas.
pub fn letterbox(image: &RgbImage, target_size: u32) -> Result<Letterboxed, AnnotixError> {
    let transform = LetterboxTransform::new(image.width(), image.height(), target_size)?;

    let resized = imageops::resize(
        image,
        transform.scaled_width,
        transform.scaled_height,
        FilterType::Triangle,
    );
    let mut canvas = RgbImage::from_pixel(target_size, target_size, PAD_COLOR);
    imageops::overlay(
        &mut canvas,
        &resized,
        i64::from(transform.pad_x),
        i64::from(transform.pad_y),
    );

    Ok(Letterboxed { canvas, transform })
}

/// Converts a canvas into an NCHW `[1, 3, H, W]` tensor scaled to `[0, 1]`.
pub fn to_tensor(canvas: &RgbImage) -> Vec<f32> {
    let plane = (canvas.width() * canvas.height()) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (i, px) in canvas.pixels().enumerate() {
        for c in 0..3 {
            tensor[c * plane + i] = f32::from(px.0[c]) / 255.0;
        }
    }
    tensor
}
