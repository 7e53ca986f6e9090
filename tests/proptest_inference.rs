use annotix::inference::{iou, nms, LetterboxTransform, RawBox};
use annotix::ir::{BBoxXYXY, Pixel};
use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::EPS_IOU;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn a_box_fully_overlaps_itself(b in proptest_helpers::arb_raw_box(4)) {
        prop_assert!((iou(&b, &b) - 1.0).abs() < EPS_IOU);
    }

    #[test]
    fn iou_is_symmetric_and_bounded(
        a in proptest_helpers::arb_raw_box(4),
        b in proptest_helpers::arb_raw_box(4),
    ) {
        let ab = iou(&a, &b);
        prop_assert!((ab - iou(&b, &a)).abs() < EPS_IOU);
        prop_assert!(ab >= 0.0 && ab <= 1.0 + EPS_IOU, "iou {}", ab);
    }

    #[test]
    fn disjoint_boxes_do_not_overlap(
        a in proptest_helpers::arb_raw_box(4),
        gap in 0.0f32..50.0,
    ) {
        let b = RawBox { x: a.x + a.width + gap, ..a };
        prop_assert!(iou(&a, &b) < EPS_IOU);
    }

    #[test]
    fn nms_keeps_a_sorted_subset_without_same_class_overlap(
        boxes in proptest_helpers::arb_raw_boxes(40, 3),
        iou_threshold in 0.1f32..0.9,
        conf_threshold in 0.0f32..0.5,
    ) {
        let kept = nms(&boxes, iou_threshold, conf_threshold);

        prop_assert!(kept.len() <= boxes.len());
        for k in &kept {
            prop_assert!(boxes.contains(k));
            prop_assert!(k.confidence >= conf_threshold);
        }
        prop_assert!(kept.windows(2).all(|w| w[0].confidence >= w[1].confidence));

        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                if a.class_index == b.class_index {
                    prop_assert!(iou(a, b) <= iou_threshold, "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn every_dropped_box_was_suppressed_or_too_weak(
        boxes in proptest_helpers::arb_raw_boxes(30, 2),
        iou_threshold in 0.1f32..0.9,
        conf_threshold in 0.0f32..0.5,
    ) {
        let kept = nms(&boxes, iou_threshold, conf_threshold);

        for b in boxes.iter().filter(|b| !kept.contains(b)) {
            let weak = b.confidence < conf_threshold;
            let suppressed = kept.iter().any(|k| {
                k.class_index == b.class_index
                    && k.confidence >= b.confidence
                    && iou(k, b) > iou_threshold
            });
            prop_assert!(weak || suppressed, "{:?} dropped without cause", b);
        }
    }

    #[test]
    fn full_image_box_survives_the_letterbox_round_trip(
        width in 1u32..2000,
        height in 1u32..2000,
        target in 32u32..1024,
    ) {
        let t = LetterboxTransform::new(width, height, target).expect("transform");
        let (w, h) = (f64::from(width), f64::from(height));
        let original: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(0.0, 0.0, w, h);

        let canvas = t.to_canvas(&original);
        prop_assert!(canvas.xmax() <= f64::from(target) + 1.0);
        prop_assert!(canvas.ymax() <= f64::from(target) + 1.0);

        let back = t.to_original(&canvas);
        prop_assert!(back.xmin().abs() <= 1.0);
        prop_assert!(back.ymin().abs() <= 1.0);
        prop_assert!((back.xmax() - w).abs() <= 1.0, "xmax {} vs {}", back.xmax(), w);
        prop_assert!((back.ymax() - h).abs() <= 1.0, "ymax {} vs {}", back.ymax(), h);
    }
}
