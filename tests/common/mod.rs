#![allow(dead_code)]

use seg_lines::domain::Point;
use seg_lines::model::SegmentModel;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Points at `x = 0, 1, 2, ...` with the given y values.
pub fn points_from_ys(ys: &[f64]) -> Vec<Point> {
    ys.iter()
        .enumerate()
        .map(|(i, &y)| Point::new(i as f64, y))
        .collect()
}

/// Points sorted by x, where x values may repeat.
pub fn points_from_pairs(pairs: &[(u8, f64)]) -> Vec<Point> {
    let mut points: Vec<Point> = pairs
        .iter()
        .map(|&(x, y)| Point::new(f64::from(x), y))
        .collect();
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    points
}

pub fn model_with(points: &[Point]) -> SegmentModel {
    let mut model = SegmentModel::new();
    for (i, &p) in points.iter().enumerate() {
        model.add_point(i, p);
    }
    model
}

/// Minimum of `Σ mse + λ·k` over every segmentation of `points`, by enumeration.
pub fn brute_force_cost(points: &[Point], lambda: f64) -> f64 {
    let n = points.len();
    let mut model = model_with(points);
    let mut best = f64::INFINITY;
    // Bit b set means a segment boundary after point b.
    for mask in 0u32..(1 << (n - 1)) {
        let mut cost = 0.0;
        let mut start = 0;
        for end in 1..=n {
            let boundary = end == n || mask & (1 << (end - 1)) != 0;
            if boundary {
                cost += model.best_fit(end, start).mse + lambda;
                start = end;
            }
        }
        best = best.min(cost);
    }
    best
}
