//! Segmented least squares by dynamic programming.
//!
//! For a prefix of `i` points (indices `0..i`) the optimal cost is
//!
//! ```text
//! OPT(0) = 0
//! OPT(i) = min_{0 <= j < i}  OPT(j) + mse([j, i)) + λ
//! ```
//!
//! where the last segment covers `[j, i)`. The solver is an explicit state
//! machine: each [`Solver::step`] settles one more prefix, then rewrites the
//! model's active segments to the best segmentation of that prefix. Between
//! candidate evaluations it pauses through a [`Pacer`] so a viewer can follow.

use log::{debug, info, trace, warn};

use crate::domain::{MIN_POINTS, Segment};
use crate::error::SolverError;
use crate::model::{RunId, SegmentModel};

pub mod pacing;

pub use pacing::*;

/// Final state of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub lambda: f64,
    /// `opt[i]` is OPT(i); `opt[0] = 0`.
    pub opt: Vec<f64>,
    /// `prev[i]` is the start of the last segment in the best segmentation of `0..i`.
    pub prev: Vec<usize>,
    /// Split points `[0, …, n]`.
    pub splits: Vec<usize>,
    pub segments: Vec<Segment>,
    /// OPT(n): `Σ mse + λ · segments`.
    pub cost: f64,
}

impl Solution {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// Outcome of a single solver step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Advanced {
        prefix: usize,
        cost: f64,
        segments: usize,
    },
    Finished(Solution),
}

#[derive(Debug)]
pub struct Solver {
    lambda: f64,
    n: usize,
    run: RunId,
    revision: u64,
    opt: Vec<f64>,
    prev: Vec<usize>,
    next_prefix: usize,
}

impl Solver {
    /// Validate inputs and take ownership of `model` for a new run.
    ///
    /// Points must occupy indices `0..n` with no gaps.
    pub fn start(model: &mut SegmentModel, lambda: f64) -> Result<Self, SolverError> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(SolverError::InvalidPenalty(lambda));
        }
        let n = model.point_count();
        if n < MIN_POINTS {
            return Err(SolverError::TooFewPoints { n });
        }
        if let Some(found) = model
            .points()
            .map(|(i, _)| i)
            .enumerate()
            .find_map(|(expected, i)| (expected != i).then_some(expected))
        {
            return Err(SolverError::IndexGap { missing: found });
        }

        let run = model.claim_run()?;
        info!("segmented least squares: n={n} lambda={lambda} run={run}");

        Ok(Self {
            lambda,
            n,
            run,
            revision: model.revision(),
            opt: vec![0.0],
            prev: vec![0],
            next_prefix: 1,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// OPT values settled so far.
    pub fn opt(&self) -> &[f64] {
        &self.opt
    }

    /// Back-pointers settled so far.
    pub fn prev(&self) -> &[usize] {
        &self.prev
    }

    /// Next prefix length `step` will solve.
    pub fn next_prefix(&self) -> usize {
        self.next_prefix
    }

    pub fn is_finished(&self) -> bool {
        self.next_prefix > self.n
    }

    /// Settle the next prefix and refresh the model's active segments.
    ///
    /// Fails with `PointsChanged` (and gives the model back) if points were
    /// added or removed since `start`.
    pub fn step<P: Pacer + ?Sized>(
        &mut self,
        model: &mut SegmentModel,
        pacer: &mut P,
    ) -> Result<Step, SolverError> {
        if self.is_finished() || !model.owns_run(self.run) {
            return Err(SolverError::RunNotActive);
        }
        if model.revision() != self.revision {
            warn!("run {} aborted: points changed before prefix {}", self.run, self.next_prefix);
            model.release_run(self.run);
            self.next_prefix = self.n + 1;
            return Err(SolverError::PointsChanged);
        }

        let i = self.next_prefix;
        let mut best_cost = f64::INFINITY;
        let mut best_split = 0;

        for j in 0..i {
            let mse = model.best_fit(i, j).mse;
            let cost = self.opt[j] + mse + self.lambda;
            trace!("prefix {i}: split {j} mse={mse:.6} cost={cost:.6}");
            if cost < best_cost {
                best_cost = cost;
                best_split = j;
            }

            let progress = Progress {
                prefix: i,
                split: j,
                candidate_cost: cost,
                best_cost,
                total: self.n,
            };
            if pacer.pause(&progress).is_break() {
                info!("run {} cancelled at prefix {i}", self.run);
                model.release_run(self.run);
                self.next_prefix = self.n + 1;
                return Err(SolverError::Cancelled { prefix: i });
            }
        }

        self.prev.push(best_split);
        self.opt.push(best_cost);

        let splits = line_segments(&self.prev, i);
        model.clear_segments();
        for pair in splits.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if start == end {
                continue;
            }
            model.add_segment(end, start);
        }
        let segments = splits.len().saturating_sub(1);
        debug!("prefix {i}: split={best_split} opt={best_cost:.6} segments={segments}");

        self.next_prefix += 1;
        if i < self.n {
            return Ok(Step::Advanced {
                prefix: i,
                cost: best_cost,
                segments,
            });
        }

        model.release_run(self.run);
        let solution = Solution {
            lambda: self.lambda,
            opt: self.opt.clone(),
            prev: self.prev.clone(),
            splits,
            segments: model.active_segments(),
            cost: best_cost,
        };
        info!(
            "run {} finished: segments={} cost={:.6} fits={}",
            self.run,
            solution.segment_count(),
            solution.cost,
            model.fit_evaluations()
        );
        Ok(Step::Finished(solution))
    }

    /// Step until every prefix is settled.
    pub fn run<P: Pacer + ?Sized>(
        mut self,
        model: &mut SegmentModel,
        pacer: &mut P,
    ) -> Result<Solution, SolverError> {
        loop {
            if let Step::Finished(solution) = self.step(model, pacer)? {
                return Ok(solution);
            }
        }
    }

    /// Abandon the run and give the model back. Active segments are left as they are.
    pub fn cancel(self, model: &mut SegmentModel) {
        model.release_run(self.run);
    }
}

/// Convenience wrapper: start and run to completion.
pub fn segmented_least_squares<P: Pacer + ?Sized>(
    model: &mut SegmentModel,
    lambda: f64,
    pacer: &mut P,
) -> Result<Solution, SolverError> {
    Solver::start(model, lambda)?.run(model, pacer)
}

/// Split points of the best segmentation of `0..prefix`, ascending from `0` to `prefix`.
pub fn line_segments(prev: &[usize], prefix: usize) -> Vec<usize> {
    let mut splits = vec![prefix];
    let mut k = prefix;
    while k > 0 {
        k = prev[k];
        splits.push(k);
    }
    splits.reverse();
    splits
}
