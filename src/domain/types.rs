//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the model and the solver
//! - streamed to stdout as NDJSON events
//! - rendered by the terminal front ends

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cached least-squares fit for the half-open index range `[start, end)`.
///
/// `active` marks whether the record currently belongs to the displayed
/// segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitRecord {
    pub alpha: f64,
    pub beta: f64,
    pub mse: f64,
    pub active: bool,
}

impl FitRecord {
    /// Evaluate the fitted line at `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.alpha + self.beta * x
    }
}

/// An active segment of the current segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// First point index (inclusive).
    pub start: usize,
    /// One past the last point index.
    pub end: usize,
    pub fit: FitRecord,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Change notifications emitted by the segment model.
///
/// Segment events carry the `(end, start)` key of the cached record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    PointAdded {
        index: usize,
        point: Point,
    },
    PointRemoved {
        index: usize,
    },
    /// `from` / `to` are the fitted line evaluated at the x of the first and
    /// last point of the range.
    SegmentAdded {
        end: usize,
        start: usize,
        from: Point,
        to: Point,
    },
    SegmentRemoved {
        end: usize,
        start: usize,
    },
}

/// Curve sampled by the synthetic dataset generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// `3 sin(x / 3)`: one smooth hump, the classic demo curve.
    Sine,
    /// A single straight line (the optimum is always one segment).
    Line,
    /// Alternating slopes with sharp corners.
    Zigzag,
    /// Piecewise-constant plateaus.
    Steps,
}

impl Shape {
    pub fn display_name(self) -> &'static str {
        match self {
            Shape::Sine => "sine",
            Shape::Line => "line",
            Shape::Zigzag => "zigzag",
            Shape::Steps => "steps",
        }
    }

    /// Cycle to the next shape (used by the TUI).
    pub fn next(self) -> Self {
        match self {
            Shape::Sine => Shape::Line,
            Shape::Line => Shape::Zigzag,
            Shape::Zigzag => Shape::Steps,
            Shape::Steps => Shape::Sine,
        }
    }
}

/// Smallest number of points the solver accepts.
pub const MIN_POINTS: usize = 2;

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `SLS_*` environment defaults).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Number of generated points.
    pub n: usize,
    /// Per-segment penalty.
    pub lambda: f64,
    /// Pause between candidate evaluations, in milliseconds (0 disables pacing).
    pub delay_ms: u64,
    /// Seed for the noise generator.
    pub seed: u64,
    /// Standard deviation of Gaussian noise added to y (0 disables noise).
    pub noise: f64,
    pub shape: Shape,
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n: 10,
            lambda: 1.0,
            delay_ms: 100,
            seed: 42,
            noise: 0.0,
            shape: Shape::Sine,
            x_min: -10.0,
            x_max: 10.0,
        }
    }
}

impl RunConfig {
    /// Check parameter ranges before any work starts.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.n < MIN_POINTS {
            return Err(AppError::new(
                2,
                format!("Point count must be >= {MIN_POINTS} (got {}).", self.n),
            ));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(AppError::new(
                2,
                format!("Penalty must be finite and >= 0 (got {}).", self.lambda),
            ));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(AppError::new(
                2,
                format!("Noise must be finite and >= 0 (got {}).", self.noise),
            ));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite() && self.x_max > self.x_min) {
            return Err(AppError::new(2, "Invalid x range for sample generation."));
        }
        Ok(())
    }
}
