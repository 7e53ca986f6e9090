//! Binary foreground grids built from mask rasters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::error::AnnotixError;
use crate::ir::{AnnotationId, MaskData};

/// Alpha values strictly above this mark foreground.
pub const ALPHA_THRESHOLD: u8 = 128;

/// A row-major grid of foreground/background cells.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl BinaryGrid {
    /// An all-background grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Builds a grid from row-major cells.
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, AnnotixError> {
        check_len(width, height, 1, cells.len())?;
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a grid from an RGBA buffer, thresholding the alpha channel.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self, AnnotixError> {
        check_len(width, height, 4, rgba.len())?;
        let cells = rgba
            .chunks_exact(4)
            .map(|px| px[3] > ALPHA_THRESHOLD)
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a grid from a single-channel alpha buffer.
    pub fn from_alpha(width: usize, height: usize, alpha: &[u8]) -> Result<Self, AnnotixError> {
        check_len(width, height, 1, alpha.len())?;
        let cells = alpha.iter().map(|&a| a > ALPHA_THRESHOLD).collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let cells = image
            .pixels()
            .map(|px| px.0[3] > ALPHA_THRESHOLD)
            .collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            cells,
        }
    }

    /// Decodes PNG bytes and thresholds their alpha channel. Images without
    /// alpha are treated as fully opaque.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(Self::from_rgba_image(&image.to_rgba8()))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Foreground test; anything outside the grid is background.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = value;
        }
    }

    /// Marks a filled rectangle as foreground, clipped to the grid.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for yy in y..(y + height).min(self.height) {
            for xx in x..(x + width).min(self.width) {
                self.cells[yy * self.width + xx] = true;
            }
        }
    }

    pub fn count_foreground(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// First foreground cell in raster order.
    pub fn first_foreground(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|&c| c)
            .map(|idx| (idx % self.width, idx / self.width))
    }
}

impl std::fmt::Debug for BinaryGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("foreground", &self.count_foreground())
            .finish()
    }
}

fn check_len(width: usize, height: usize, channels: usize, actual: usize) -> Result<(), AnnotixError> {
    let expected = width * height * channels;
    if actual != expected {
        return Err(AnnotixError::MaskBuffer {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Strips an optional `data:...;base64,` prefix.
fn strip_data_url(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        if let Some(idx) = encoded.find(',') {
            return &encoded[idx + 1..];
        }
    }
    encoded
}

/// Decodes a mask annotation's base64 PNG into RGBA pixels.
pub fn decode_mask(id: &AnnotationId, mask: &MaskData) -> Result<RgbaImage, AnnotixError> {
    let payload = strip_data_url(mask.base64png.trim());
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| AnnotixError::MaskDecode {
            annotation_id: id.to_string(),
            message: format!("invalid base64: {e}"),
        })?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png).map_err(|e| {
        AnnotixError::MaskDecode {
            annotation_id: id.to_string(),
            message: format!("invalid PNG: {e}"),
        }
    })?;
    Ok(image.to_rgba8())
}
