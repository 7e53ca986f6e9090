//! Mask-to-polygon conversion.
//!
//! A user-drawn mask is thresholded into a [`BinaryGrid`] (alpha > 128 is
//! foreground) and its region boundaries are followed with Moore-Neighbor
//! tracing. Contour points are integer pixel positions of boundary pixels,
//! ordered clockwise in image coordinates.
//!
//! Degenerate masks never error: an empty mask gives no contours and an
//! isolated pixel gives a single-point contour that [`trace_all`] drops.

mod grid;
mod trace;

pub use grid::{decode_mask, BinaryGrid, ALPHA_THRESHOLD};
pub use trace::{trace, trace_all, DEFAULT_MIN_AREA};
