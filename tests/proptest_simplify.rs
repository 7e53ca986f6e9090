use annotix::ir::{Coord, Pixel};
use annotix::simplify::{calculate_reduction, douglas_peucker, simplify, simplify_radial_distance};
use proptest::prelude::*;

mod proptest_helpers;

/// True when `sub` can be obtained from `full` by removing points.
fn is_subsequence(sub: &[Coord<Pixel>], full: &[Coord<Pixel>]) -> bool {
    let mut rest = full.iter();
    sub.iter().all(|p| rest.any(|q| q == p))
}

#[test]
fn straight_line_keeps_only_its_endpoints() {
    let line: Vec<Coord<Pixel>> = (0..5).map(|i| Coord::new(f64::from(i), 0.0)).collect();
    let simplified = douglas_peucker(&line, 0.5);
    assert_eq!(simplified, vec![Coord::new(0.0, 0.0), Coord::new(4.0, 0.0)]);
    assert!((calculate_reduction(&line, &simplified) - 60.0).abs() < 1e-9);
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn simplify_is_idempotent(
        points in proptest_helpers::arb_walk(80),
        tolerance in 0.1f64..10.0,
    ) {
        let once = simplify(&points, tolerance);
        let twice = simplify(&once, tolerance);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn simplify_only_removes_points(
        points in proptest_helpers::arb_polyline(60),
        tolerance in 0.0f64..25.0,
    ) {
        let simplified = simplify(&points, tolerance);
        prop_assert!(simplified.len() <= points.len());
        prop_assert!(is_subsequence(&simplified, &points));

        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            prop_assert_eq!(simplified.first(), Some(first));
            prop_assert_eq!(simplified.last(), Some(last));
        }
    }

    #[test]
    fn each_stage_keeps_its_endpoints(
        points in proptest_helpers::arb_walk(60),
        tolerance in 0.1f64..10.0,
    ) {
        for stage in [
            simplify_radial_distance(&points, tolerance),
            douglas_peucker(&points, tolerance),
        ] {
            prop_assert!(is_subsequence(&stage, &points));
            prop_assert_eq!(stage.first(), points.first());
            prop_assert_eq!(stage.last(), points.last());
        }
    }

    #[test]
    fn non_positive_tolerance_is_a_no_op(
        points in proptest_helpers::arb_polyline(30),
        tolerance in -5.0f64..=0.0,
    ) {
        prop_assert_eq!(simplify(&points, tolerance), points);
    }

    #[test]
    fn reduction_is_a_percentage(
        points in proptest_helpers::arb_polyline(60),
        tolerance in 0.0f64..25.0,
    ) {
        let simplified = simplify(&points, tolerance);
        let reduction = calculate_reduction(&points, &simplified);
        prop_assert!((0.0..=100.0).contains(&reduction), "reduction {}", reduction);
    }
}
