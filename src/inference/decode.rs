//! Decoding of raw YOLO detection tensors.

use serde::{Deserialize, Serialize};

use crate::error::AnnotixError;
use crate::ir::{BBoxXYXY, Canvas};

/// A candidate detection in model-input (letterbox canvas) coordinates,
/// corner form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub class_index: usize,
    pub confidence: f32,
}

impl RawBox {
    /// Builds a box from center form, as models emit it.
    pub fn from_center(
        cx: f32,
        cy: f32,
        width: f32,
        height: f32,
        class_index: usize,
        confidence: f32,
    ) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
            class_index,
            confidence,
        }
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn to_xyxy(&self) -> BBoxXYXY<Canvas> {
        BBoxXYXY::from_xywh(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

/// Tensor memory layout, inferred from the shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, N, C]`, one row per anchor (YOLOv5 style).
    AnchorMajor { boxes: usize, channels: usize, objectness: bool },
    /// `[1, C, N]`, one row per channel (YOLOv8 style).
    ChannelMajor { boxes: usize, channels: usize },
}

impl TensorLayout {
    /// Infers the layout of a `[1, a, b]` tensor for `num_classes` classes.
    pub fn infer(shape: &[usize], num_classes: usize) -> Result<Self, AnnotixError> {
        let shape_error = |message: String| AnnotixError::TensorShape {
            shape: shape.to_vec(),
            num_classes,
            message,
        };

        let [batch, a, b] = shape else {
            return Err(shape_error(format!(
                "expected 3 dimensions, got {}",
                shape.len()
            )));
        };
        if *batch != 1 {
            return Err(shape_error(format!("expected batch size 1, got {batch}")));
        }

        if a > b {
            let (boxes, channels) = (*a, *b);
            let objectness = if channels == num_classes + 4 {
                false
            } else if channels == num_classes + 5 {
                true
            } else {
                return Err(shape_error(format!(
                    "anchor-major rows have {channels} values, expected {} or {}",
                    num_classes + 4,
                    num_classes + 5
                )));
            };
            Ok(TensorLayout::AnchorMajor {
                boxes,
                channels,
                objectness,
            })
        } else {
            let (channels, boxes) = (*a, *b);
            if channels != num_classes + 4 {
                return Err(shape_error(format!(
                    "channel-major tensor has {channels} channels, expected {}",
                    num_classes + 4
                )));
            }
            Ok(TensorLayout::ChannelMajor { boxes, channels })
        }
    }

    pub fn num_boxes(&self) -> usize {
        match *self {
            TensorLayout::AnchorMajor { boxes, .. } | TensorLayout::ChannelMajor { boxes, .. } => {
                boxes
            }
        }
    }

    fn num_values(&self) -> usize {
        match *self {
            TensorLayout::AnchorMajor {
                boxes, channels, ..
            }
            | TensorLayout::ChannelMajor { boxes, channels } => boxes * channels,
        }
    }
}

/// Decodes a detection tensor into candidate boxes.
///
/// Each box takes its best class by strict maximum over scores starting from
/// zero (ties keep the lower class index); boxes whose best score does not
/// exceed `confidence_threshold` are dropped. With an objectness channel the
/// class score is multiplied by it.
///
/// # Errors
/// Returns [`AnnotixError::TensorShape`] if the shape is not `[1, a, b]`,
/// disagrees with `num_classes`, or does not match `tensor.len()`.
pub fn decode(
    tensor: &[f32],
    shape: &[usize],
    num_classes: usize,
    confidence_threshold: f32,
) -> Result<Vec<RawBox>, AnnotixError> {
    let layout = TensorLayout::infer(shape, num_classes)?;
    if tensor.len() != layout.num_values() {
        return Err(AnnotixError::TensorShape {
            shape: shape.to_vec(),
            num_classes,
            message: format!(
                "tensor holds {} values, shape implies {}",
                tensor.len(),
                layout.num_values()
            ),
        });
    }

    let mut boxes = Vec::new();
    match layout {
        TensorLayout::AnchorMajor {
            boxes: n,
            channels,
            objectness,
        } => {
            let class_offset = if objectness { 5 } else { 4 };
            for row in tensor.chunks_exact(channels).take(n) {
                let obj = if objectness { row[4] } else { 1.0 };
                let (class_index, confidence) =
                    best_class((0..num_classes).map(|c| row[class_offset + c] * obj));
                if confidence > confidence_threshold {
                    boxes.push(RawBox::from_center(
                        row[0],
                        row[1],
                        row[2],
                        row[3],
                        class_index,
                        confidence,
                    ));
                }
            }
        }
        TensorLayout::ChannelMajor { boxes: n, .. } => {
            let at = |c: usize, i: usize| tensor[c * n + i];
            for i in 0..n {
                let (class_index, confidence) =
                    best_class((0..num_classes).map(|c| at(4 + c, i)));
                if confidence > confidence_threshold {
                    boxes.push(RawBox::from_center(
                        at(0, i),
                        at(1, i),
                        at(2, i),
                        at(3, i),
                        class_index,
                        confidence,
                    ));
                }
            }
        }
    }

    tracing::debug!(
        candidates = boxes.len(),
        total = layout.num_boxes(),
        "Decoded detection tensor"
    );
    Ok(boxes)
}

fn best_class(scores: impl Iterator<Item = f32>) -> (usize, f32) {
    let mut best = (0, 0.0);
    for (c, score) in scores.enumerate() {
        if score > best.1 {
            best = (c, score);
        }
    }
    best
}
