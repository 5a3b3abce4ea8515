//! Closed-form simple linear regression.
//!
//! For points `(x_k, y_k)`, `k = 1..n`:
//!
//! ```text
//! beta  = Σ (x - x̄)(y - ȳ) / Σ (x - x̄)²
//! alpha = ȳ - beta · x̄
//! mse   = (1/n) Σ (y - (alpha + beta · x))²
//! ```
//!
//! Numerical notes:
//! - All sums run over the same set of points.
//! - When `Σ (x - x̄)² = 0` (one point, or every x identical) the slope is
//!   undefined. We do not special-case it: `beta`, `alpha` and `mse` come out
//!   NaN, and any `<` comparison against them is false, so the dynamic program
//!   never picks such a range.
//! - An empty slice gives NaN for the same reason (`0 / 0`).

use crate::domain::Point;

/// Slope, intercept and mean squared error of a least-squares line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub alpha: f64,
    pub beta: f64,
    pub mse: f64,
}

impl LineFit {
    /// Evaluate the fitted line at `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.alpha + self.beta * x
    }
}

/// Fit `y = alpha + beta · x` to `points` by ordinary least squares.
pub fn best_fit(points: &[Point]) -> LineFit {
    let n = points.len() as f64;

    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let x_bar = sum_x / n;
    let y_bar = sum_y / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for p in points {
        let dx = p.x - x_bar;
        sxy += dx * (p.y - y_bar);
        sxx += dx * dx;
    }

    let beta = sxy / sxx;
    let alpha = y_bar - beta * x_bar;

    let sse: f64 = points
        .iter()
        .map(|p| {
            let resid = p.y - (alpha + beta * p.x);
            resid * resid
        })
        .sum();

    LineFit {
        alpha,
        beta,
        mse: sse / n,
    }
}
