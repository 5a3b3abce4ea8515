//! Synthetic point generation.
//!
//! Points are spaced evenly on `[x_min, x_max)` as `x_min + i·(x_max − x_min)/n`,
//! their y read off the configured shape, optionally perturbed by seeded
//! Gaussian noise, and returned sorted by ascending x.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Point, RunConfig, Shape};
use crate::error::AppError;

/// Period (in x units) of the zigzag shape.
const ZIGZAG_PERIOD: f64 = 5.0;

/// Width (in x units) of one plateau of the steps shape.
const STEP_WIDTH: f64 = 4.0;

pub fn generate_sample(config: &RunConfig) -> Result<Vec<Point>, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = if config.noise > 0.0 {
        Some(
            Normal::new(0.0, config.noise)
                .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?,
        )
    } else {
        None
    };

    let span = config.x_max - config.x_min;
    let mut points: Vec<Point> = (0..config.n)
        .map(|i| {
            let x = config.x_min + i as f64 * span / config.n as f64;
            let mut y = shape_value(config.shape, x, config.x_min);
            if let Some(dist) = &noise {
                y += dist.sample(&mut rng);
            }
            Point::new(x, y)
        })
        .collect();

    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    Ok(points)
}

/// Noise-free y of `shape` at `x`.
pub fn shape_value(shape: Shape, x: f64, x_min: f64) -> f64 {
    match shape {
        Shape::Sine => 3.0 * (x / 3.0).sin(),
        Shape::Line => 0.5 * x + 1.0,
        Shape::Zigzag => {
            let phase = (x - x_min).rem_euclid(ZIGZAG_PERIOD) / ZIGZAG_PERIOD;
            let tri = if phase < 0.5 { 4.0 * phase - 1.0 } else { 3.0 - 4.0 * phase };
            3.0 * tri
        }
        Shape::Steps => 2.0 * ((x - x_min) / STEP_WIDTH).floor() - 4.0,
    }
}
