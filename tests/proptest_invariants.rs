mod common;

use approx::relative_eq;
use common::{brute_force_cost, model_with, points_from_pairs, points_from_ys};
use proptest::prelude::*;
use seg_lines::solver::{line_segments, segmented_least_squares, NoPause};

fn ys(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-10.0f64..10.0, 2..=max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn mse_is_non_negative_for_distinct_x(values in ys(12), a in 0usize..12, b in 0usize..12) {
        let points = points_from_ys(&values);
        let n = points.len();
        let start = a % n;
        let end = start + 1 + b % (n - start);

        let mut model = model_with(&points);
        let fit = *model.best_fit(end, start);
        prop_assert!(fit.mse.is_finite());
        prop_assert!(fit.mse >= 0.0);
    }

    #[test]
    fn dp_table_is_non_negative(values in ys(12), lambda in 0.0f64..5.0) {
        let points = points_from_ys(&values);
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();

        prop_assert_eq!(solution.opt.len(), points.len() + 1);
        prop_assert_eq!(solution.opt[0], 0.0);
        prop_assert!(solution.opt.iter().all(|&m| m >= 0.0));
        prop_assert!(solution.prev.iter().enumerate().skip(1).all(|(i, &j)| j < i));
    }

    #[test]
    fn active_segments_tile_every_point(values in ys(12), lambda in 0.0f64..5.0) {
        let points = points_from_ys(&values);
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();

        let segments = model.active_segments();
        prop_assert_eq!(segments.first().map(|s| s.start), Some(0));
        prop_assert_eq!(segments.last().map(|s| s.end), Some(points.len()));
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        prop_assert_eq!(line_segments(&solution.prev, points.len()), solution.splits);
        prop_assert!(relative_eq!(model.objective(lambda), solution.cost, epsilon = 1e-9));
    }

    #[test]
    fn dp_matches_exhaustive_search(values in ys(8), lambda in 0.0f64..5.0) {
        let points = points_from_ys(&values);
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();

        let brute = brute_force_cost(&points, lambda);
        prop_assert!(
            relative_eq!(solution.cost, brute, epsilon = 1e-9, max_relative = 1e-9),
            "dp={} brute={}", solution.cost, brute
        );
    }

    #[test]
    fn dp_skips_repeated_x_ranges(
        pairs in prop::collection::vec((0u8..4, -10.0f64..10.0), 2..=8),
        lambda in 0.0f64..5.0,
    ) {
        let points = points_from_pairs(&pairs);
        let mut model = model_with(&points);
        let solution = segmented_least_squares(&mut model, lambda, &mut NoPause).unwrap();

        prop_assert!(solution.opt.iter().all(|m| m.is_finite() && *m >= 0.0));
        prop_assert!(model.active_segments().iter().all(|s| s.fit.mse.is_finite()));
        prop_assert!(relative_eq!(model.objective(lambda), solution.cost, epsilon = 1e-9));

        let brute = brute_force_cost(&points, lambda);
        prop_assert!(
            relative_eq!(solution.cost, brute, epsilon = 1e-9, max_relative = 1e-9),
            "dp={} brute={}", solution.cost, brute
        );
    }
}
