//! Shared "fit pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! generate points -> fresh model + observers -> load points -> solve
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use log::info;

use crate::data::generate_sample;
use crate::domain::{Point, RunConfig};
use crate::error::{AppError, SolverError};
use crate::model::{Observer, SegmentModel};
use crate::solver::{Pacer, Solution, Solver};

/// All computed outputs of a single run.
#[derive(Debug)]
pub struct RunOutput {
    pub points: Vec<Point>,
    pub solution: Solution,
    /// The model as the solver left it (active segments = the optimum).
    pub model: SegmentModel,
}

/// Generate a dataset for `config` and segment it.
pub fn run(
    config: &RunConfig,
    observers: Vec<Box<dyn Observer>>,
    pacer: &mut dyn Pacer,
) -> Result<RunOutput, AppError> {
    let points = generate_sample(config)?;
    info!(
        "generated {} points (shape={}, noise={}, seed={})",
        points.len(),
        config.shape.display_name(),
        config.noise,
        config.seed
    );

    let model = load_model(&points, observers);
    Ok(solve(model, &points, config.lambda, pacer)?)
}

/// Build a fresh model with `observers` registered and `points` loaded at `0..n`.
///
/// Observers are registered first so they see every `PointAdded`.
pub fn load_model(points: &[Point], observers: Vec<Box<dyn Observer>>) -> SegmentModel {
    let mut model = SegmentModel::new();
    for observer in observers {
        model.add_listener(observer);
    }
    for (i, &p) in points.iter().enumerate() {
        model.add_point(i, p);
    }
    model
}

/// Run the solver to completion on a loaded model.
pub fn solve(
    mut model: SegmentModel,
    points: &[Point],
    lambda: f64,
    pacer: &mut dyn Pacer,
) -> Result<RunOutput, SolverError> {
    let solution = Solver::start(&mut model, lambda)?.run(&mut model, pacer)?;
    Ok(RunOutput {
        points: points.to_vec(),
        solution,
        model,
    })
}
