//! Pacing between candidate evaluations.
//!
//! The solver calls [`Pacer::pause`] after every candidate split it scores.
//! A pacer may sleep, redraw a screen, or poll for input; returning
//! `ControlFlow::Break` cancels the run.

use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

/// Where the solver is when it pauses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Prefix length being solved (points `0..prefix`).
    pub prefix: usize,
    /// Candidate start of the last segment that was just scored.
    pub split: usize,
    /// `OPT(split) + mse(split..prefix) + λ` for that candidate.
    pub candidate_cost: f64,
    /// Best cost seen so far for this prefix.
    pub best_cost: f64,
    /// Total number of points.
    pub total: usize,
}

pub trait Pacer {
    fn pause(&mut self, progress: &Progress) -> ControlFlow<()>;
}

/// Never waits. Used by tests and non-visual runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    fn pause(&mut self, _progress: &Progress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Sleeps for a fixed interval at every pause.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Pacer for FixedDelay {
    fn pause(&mut self, _progress: &Progress) -> ControlFlow<()> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        ControlFlow::Continue(())
    }
}

impl<P: Pacer + ?Sized> Pacer for &mut P {
    fn pause(&mut self, progress: &Progress) -> ControlFlow<()> {
        (**self).pause(progress)
    }
}
