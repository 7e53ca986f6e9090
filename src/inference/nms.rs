//! Per-class greedy non-maximum suppression.

use super::decode::RawBox;

/// Added to the union so zero-area boxes do not divide by zero.
pub const IOU_EPSILON: f32 = 1e-6;

/// Intersection over union of two boxes, `inter / (union + 1e-6)`.
pub fn iou(a: &RawBox, b: &RawBox) -> f32 {
    let (a, b) = (a.to_xyxy(), b.to_xyxy());
    let intersection = a.intersection_area(&b);
    let union = a.area() + b.area() - intersection;
    (intersection / (union + f64::from(IOU_EPSILON))) as f32
}

/// Suppresses duplicate detections.
///
/// Drops boxes with confidence below `conf_threshold`, sorts the rest by
/// descending confidence (stable, so equal scores keep input order), then
/// greedily keeps the best remaining box and suppresses every unselected
/// box of the same class whose IoU with it exceeds `iou_threshold`. Boxes of
/// different classes never suppress each other.
pub fn nms(boxes: &[RawBox], iou_threshold: f32, conf_threshold: f32) -> Vec<RawBox> {
    let mut candidates: Vec<RawBox> = boxes
        .iter()
        .filter(|b| b.confidence >= conf_threshold)
        .copied()
        .collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; candidates.len()];
    let mut selected = Vec::new();

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        let best = candidates[i];
        selected.push(best);

        for j in i + 1..candidates.len() {
            if suppressed[j] || candidates[j].class_index != best.class_index {
                continue;
            }
            if iou(&best, &candidates[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(x: f32, y: f32, w: f32, h: f32, class_index: usize, confidence: f32) -> RawBox {
        RawBox {
            x,
            y,
            width: w,
            height: h,
            class_index,
            confidence,
        }
    }

    #[test]
    fn iou_identity_and_disjoint() {
        let a = raw(10.0, 10.0, 100.0, 50.0, 0, 0.9);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        let b = raw(200.0, 200.0, 10.0, 10.0, 0, 0.9);
        assert_eq!(iou(&a, &b), 0.0);
        // touching edges do not overlap
        let c = raw(110.0, 10.0, 10.0, 10.0, 0, 0.9);
        assert_eq!(iou(&a, &c), 0.0);
    }

    #[test]
    fn iou_zero_area_is_finite() {
        let a = raw(5.0, 5.0, 0.0, 0.0, 0, 0.9);
        assert_eq!(iou(&a, &a), 0.0);
    }

    #[test]
    fn keeps_higher_confidence_duplicate() {
        // 100x100 boxes offset so IoU is about 0.7
        let a = raw(0.0, 0.0, 100.0, 100.0, 1, 0.8);
        let b = raw(0.0, 17.65, 100.0, 100.0, 1, 0.9);
        let overlap = iou(&a, &b);
        assert!((overlap - 0.7).abs() < 0.01, "iou={overlap}");

        let kept = nms(&[a, b], 0.45, 0.25);
        assert_eq!(kept, vec![b]);
    }

    #[test]
    fn different_classes_never_suppress() {
        let a = raw(0.0, 0.0, 100.0, 100.0, 0, 0.9);
        let b = raw(0.0, 0.0, 100.0, 100.0, 1, 0.8);
        assert_eq!(nms(&[a, b], 0.45, 0.5), vec![a, b]);
    }

    #[test]
    fn confidence_filter_is_inclusive() {
        let a = raw(0.0, 0.0, 10.0, 10.0, 0, 0.5);
        let b = raw(50.0, 50.0, 10.0, 10.0, 0, 0.49);
        assert_eq!(nms(&[a, b], 0.45, 0.5), vec![a]);
    }

    #[test]
    fn output_sorted_descending() {
        let boxes = [
            raw(0.0, 0.0, 10.0, 10.0, 0, 0.6),
            raw(100.0, 0.0, 10.0, 10.0, 0, 0.95),
            raw(200.0, 0.0, 10.0, 10.0, 2, 0.7),
        ];
        let kept = nms(&boxes, 0.45, 0.1);
        let confs: Vec<f32> = kept.iter().map(|b| b.confidence).collect();
        assert_eq!(confs, vec![0.95, 0.7, 0.6]);
    }

    #[test]
    fn chain_suppression_uses_selected_boxes_only() {
        // b overlaps a and c, but a and c do not overlap; b is suppressed by a,
        // so c survives
        let a = raw(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        let b = raw(3.0, 0.0, 10.0, 10.0, 0, 0.8);
        let c = raw(11.0, 0.0, 10.0, 10.0, 0, 0.7);
        assert_eq!(nms(&[c, b, a], 0.3, 0.0), vec![a, c]);
    }
}
