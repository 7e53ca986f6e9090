//! Detection-model output handling.
//!
//! The crate never runs a model. It prepares inputs ([`letterbox`],
//! [`to_tensor`]) and turns raw outputs into annotations:
//!
//! ```text
//! tensor ──decode──▶ RawBox (canvas) ──nms──▶ RawBox ──LetterboxTransform──▶ BBoxData (pixels)
//! ```
//!
//! All boxes before the inverse mapping live in model-input coordinates.

mod decode;
mod letterbox;
mod nms;
mod postprocess;

pub use decode::{decode, RawBox, TensorLayout};
pub use letterbox::{letterbox, to_tensor, LetterboxTransform, Letterboxed, PAD_COLOR};
pub use nms::{iou, nms, IOU_EPSILON};
pub use postprocess::{
    class_for_index, classify, detect, detections_to_annotations, scores_to_annotation,
    ClassScore, Detection, DetectionConfig,
};
