//! From raw model output to stored annotations.

use serde::{Deserialize, Serialize};

use super::decode::decode;
use super::letterbox::LetterboxTransform;
use super::nms::nms;
use crate::error::AnnotixError;
use crate::ir::{Annotation, AnnotationData, BBoxData, ClassId, ClassificationData, Project};

/// Thresholds and input size for detection post-processing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            input_size: 640,
        }
    }
}

impl DetectionConfig {
    /// Sets the confidence threshold, clamped to `[0, 1]`.
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
    }

    /// Sets the IoU threshold, clamped to `[0, 1]`.
    pub fn set_iou_threshold(&mut self, threshold: f32) {
        self.iou_threshold = threshold.clamp(0.0, 1.0);
    }
}

/// A final detection in original image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub bbox: BBoxData,
    pub class_index: usize,
    pub confidence: f32,
}

/// Decodes, suppresses and inverse-maps a detection tensor.
///
/// Output is sorted by descending confidence.
pub fn detect(
    tensor: &[f32],
    shape: &[usize],
    num_classes: usize,
    transform: &LetterboxTransform,
    config: &DetectionConfig,
) -> Result<Vec<Detection>, AnnotixError> {
    let candidates = decode(tensor, shape, num_classes, config.confidence_threshold)?;
    let kept = nms(
        &candidates,
        config.iou_threshold,
        config.confidence_threshold,
    );
    tracing::debug!(
        candidates = candidates.len(),
        kept = kept.len(),
        "Applied non-max suppression"
    );

    Ok(kept
        .iter()
        .map(|raw| Detection {
            bbox: transform.scale_to_original(raw),
            class_index: raw.class_index,
            confidence: raw.confidence,
        })
        .collect())
}

/// Maps a model class index onto a project class id.
///
/// Models are trained on classes in ascending id order, so index `i` is the
/// `i`-th class by id; indices past the class list map to `ClassId(i)`.
pub fn class_for_index(project: &Project, class_index: usize) -> ClassId {
    project
        .classes_by_id()
        .get(class_index)
        .map(|c| c.id)
        .unwrap_or(ClassId(class_index as u64))
}

/// Turns detections into `bbox` annotations with fresh ids.
pub fn detections_to_annotations(detections: &[Detection], project: &Project) -> Vec<Annotation> {
    detections
        .iter()
        .map(|d| {
            Annotation::generated(
                Some(class_for_index(project, d.class_index)),
                AnnotationData::BBox(d.bbox),
            )
        })
        .collect()
}

/// One class score from a classification model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScore {
    pub class_index: usize,
    pub confidence: f32,
}

/// Softmaxes classifier logits and returns at most `top_k` classes scoring
/// at least `threshold`, best first.
pub fn classify(logits: &[f32], threshold: f32, top_k: usize) -> Vec<ClassScore> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return Vec::new();
    }

    let mut scores: Vec<ClassScore> = exps
        .iter()
        .enumerate()
        .map(|(class_index, e)| ClassScore {
            class_index,
            confidence: e / sum,
        })
        .filter(|s| s.confidence >= threshold)
        .collect();
    scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    scores.truncate(top_k);
    scores
}

/// Turns classifier scores into a single classification annotation, or
/// `None` when nothing passed the threshold.
pub fn scores_to_annotation(scores: &[ClassScore], project: &Project) -> Option<Annotation> {
    let best = scores.first()?;
    let labels = scores
        .iter()
        .map(|s| class_for_index(project, s.class_index))
        .collect();
    Some(Annotation::generated(
        Some(class_for_index(project, best.class_index)),
        AnnotationData::Classification(ClassificationData { labels }),
    ))
}
