//! Coordinate space marker types.
//!
//! Zero-sized types used as type parameters so that coordinates from the
//! original image, the model-input canvas and normalized label files can
//! never be mixed without an explicit conversion.

use std::fmt;

/// Marker for pixel coordinates of the original (unresized) image.
///
/// Every stored annotation lives in this space, never in a zoomed or panned
/// view and never in the model-input canvas.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates on the letterboxed model-input canvas
/// (e.g. 640×640), as produced by a detection model.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canvas {}

/// Marker for coordinates normalized by image width/height into `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
