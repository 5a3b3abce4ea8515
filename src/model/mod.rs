//! Observable segment model.
//!
//! `SegmentModel` owns:
//!
//! - the point sequence (index → point, gaps allowed)
//! - a memo of least-squares fits keyed by `(end, start)`, each covering the
//!   half-open index range `[start, end)`
//! - the registered observers
//!
//! Every mutation that changes what a viewer would draw emits a
//! [`ModelEvent`] to all observers, synchronously and in registration order.

use std::collections::BTreeMap;

use log::{trace, warn};

use crate::domain::{FitRecord, ModelEvent, Point, Segment};
use crate::error::SolverError;
use crate::math::best_fit;

pub mod observer;

pub use observer::*;

/// Token identifying the solver run that currently owns a model.
pub type RunId = u64;

#[derive(Default)]
pub struct SegmentModel {
    data: BTreeMap<usize, Point>,
    coeffs: BTreeMap<usize, BTreeMap<usize, FitRecord>>,
    listeners: Vec<Box<dyn Observer>>,
    run: Option<RunId>,
    last_run: RunId,
    /// Bumped on every point change; a running solver checks it between steps.
    revision: u64,
    fit_evaluations: usize,
}

impl std::fmt::Debug for SegmentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentModel")
            .field("points", &self.data.len())
            .field("cached_fits", &self.cached_fits())
            .field("active_segments", &self.active_count())
            .field("listeners", &self.listeners.len())
            .field("run", &self.run)
            .finish()
    }
}

impl SegmentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. There is no removal; observers live as long as the model.
    pub fn add_listener(&mut self, observer: Box<dyn Observer>) {
        self.listeners.push(observer);
    }

    /// Deliver `event` to every observer.
    ///
    /// A failing observer is logged and skipped; the remaining observers still
    /// receive the event.
    pub fn emit(&mut self, event: &ModelEvent) {
        trace!("emit {event:?}");
        for (idx, listener) in self.listeners.iter_mut().enumerate() {
            if let Err(err) = listener.notify(event) {
                warn!("observer #{idx} failed on {event:?}: {err}");
            }
        }
    }

    // ---- points ----

    /// Insert or overwrite the point at `index`.
    ///
    /// Doing this while a solver run owns the model makes that run fail with
    /// `PointsChanged` at its next step.
    pub fn add_point(&mut self, index: usize, point: Point) {
        self.evict_covering(index);
        self.data.insert(index, point);
        self.revision += 1;
        self.emit(&ModelEvent::PointAdded { index, point });
    }

    /// Remove the point at `index`; absent indices are ignored.
    pub fn delete_point(&mut self, index: usize) {
        if self.data.remove(&index).is_none() {
            return;
        }
        self.revision += 1;
        self.evict_covering(index);
        self.emit(&ModelEvent::PointRemoved { index });
    }

    pub fn clear_points(&mut self) {
        let indices: Vec<usize> = self.data.keys().copied().collect();
        for index in indices {
            self.delete_point(index);
        }
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.data.get(&index).copied()
    }

    /// Present points in index order.
    pub fn points(&self) -> impl Iterator<Item = (usize, Point)> + '_ {
        self.data.iter().map(|(&i, &p)| (i, p))
    }

    pub fn point_count(&self) -> usize {
        self.data.len()
    }

    /// Counter of point insertions and deletions.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ---- fits ----

    /// Least-squares fit of the points in `[start, end)`, memoized.
    ///
    /// New records start inactive. A single-point range is a zero-cost
    /// segment (horizontal line through the point).
    pub fn best_fit(&mut self, end: usize, start: usize) -> &FitRecord {
        self.fit_entry(end, start)
    }

    fn fit_entry(&mut self, end: usize, start: usize) -> &mut FitRecord {
        let data = &self.data;
        let evaluations = &mut self.fit_evaluations;
        self.coeffs
            .entry(end)
            .or_default()
            .entry(start)
            .or_insert_with(|| {
                *evaluations += 1;
                fit_range(data, start, end)
            })
    }

    /// Cached record for `(end, start)`, if it was ever computed.
    pub fn cached_fit(&self, end: usize, start: usize) -> Option<&FitRecord> {
        self.coeffs.get(&end).and_then(|row| row.get(&start))
    }

    /// Mark the fit for `[start, end)` active and announce it.
    pub fn add_segment(&mut self, end: usize, start: usize) -> FitRecord {
        let record = {
            let record = self.fit_entry(end, start);
            record.active = true;
            *record
        };

        let (from, to) = self.segment_endpoints(start, end, &record);
        self.emit(&ModelEvent::SegmentAdded {
            end,
            start,
            from,
            to,
        });
        record
    }

    /// Deactivate the fit for `[start, end)`; unknown keys are ignored.
    pub fn remove_segment(&mut self, end: usize, start: usize) {
        let Some(record) = self.coeffs.get_mut(&end).and_then(|row| row.get_mut(&start)) else {
            return;
        };
        record.active = false;
        self.emit(&ModelEvent::SegmentRemoved { end, start });
    }

    /// Deactivate every active segment.
    pub fn clear_segments(&mut self) {
        let active: Vec<(usize, usize)> = self
            .coeffs
            .iter()
            .flat_map(|(&end, row)| {
                row.iter()
                    .filter(|(_, r)| r.active)
                    .map(move |(&start, _)| (end, start))
            })
            .collect();
        for (end, start) in active {
            self.remove_segment(end, start);
        }
    }

    /// Active segments ordered by start index.
    pub fn active_segments(&self) -> Vec<Segment> {
        let mut out: Vec<Segment> = self
            .coeffs
            .iter()
            .flat_map(|(&end, row)| {
                row.iter()
                    .filter(|(_, r)| r.active)
                    .map(move |(&start, &fit)| Segment { start, end, fit })
            })
            .collect();
        out.sort_by_key(|s| (s.start, s.end));
        out
    }

    pub fn active_count(&self) -> usize {
        self.coeffs
            .values()
            .flat_map(|row| row.values())
            .filter(|r| r.active)
            .count()
    }

    /// Sum of mean squared errors over the active segments.
    pub fn total_cost(&self) -> f64 {
        self.coeffs
            .values()
            .flat_map(|row| row.values())
            .filter(|r| r.active)
            .map(|r| r.mse)
            .sum()
    }

    /// Penalized objective of the active segmentation: `Σ mse + λ · segments`.
    pub fn objective(&self, lambda: f64) -> f64 {
        self.total_cost() + lambda * self.active_count() as f64
    }

    /// Number of memoized records (active or not).
    pub fn cached_fits(&self) -> usize {
        self.coeffs.values().map(|row| row.len()).sum()
    }

    /// How many times a fit was actually computed (cache misses).
    pub fn fit_evaluations(&self) -> usize {
        self.fit_evaluations
    }

    // ---- run ownership ----

    /// Reserve the model for a solver run.
    pub fn claim_run(&mut self) -> Result<RunId, SolverError> {
        if self.run.is_some() {
            return Err(SolverError::ConcurrentRun);
        }
        self.last_run += 1;
        self.run = Some(self.last_run);
        Ok(self.last_run)
    }

    /// Release the model if `id` still owns it.
    pub fn release_run(&mut self, id: RunId) {
        if self.run == Some(id) {
            self.run = None;
        }
    }

    pub fn owns_run(&self, id: RunId) -> bool {
        self.run == Some(id)
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Line endpoints at the first and last present point of `[start, end)`.
    fn segment_endpoints(&self, start: usize, end: usize, record: &FitRecord) -> (Point, Point) {
        let on_line = |p: &Point| Point::new(p.x, record.at(p.x));
        let missing = Point::new(f64::NAN, f64::NAN);
        if start >= end {
            return (missing, missing);
        }
        let mut range = self.data.range(start..end);
        let first = range.next().map(|(_, p)| on_line(p));
        let last = range.next_back().map(|(_, p)| on_line(p)).or(first);
        (first.unwrap_or(missing), last.unwrap_or(missing))
    }

    /// Drop memoized fits that depend on the point at `index`.
    fn evict_covering(&mut self, index: usize) {
        let mut evicted_active = Vec::new();
        for (&end, row) in self.coeffs.iter_mut() {
            if end <= index {
                continue;
            }
            row.retain(|&start, record| {
                let covers = start <= index;
                if covers && record.active {
                    evicted_active.push((end, start));
                }
                !covers
            });
        }
        self.coeffs.retain(|_, row| !row.is_empty());

        for (end, start) in evicted_active {
            self.emit(&ModelEvent::SegmentRemoved { end, start });
        }
    }
}

/// Fit the present points of `[start, end)`.
fn fit_range(data: &BTreeMap<usize, Point>, start: usize, end: usize) -> FitRecord {
    let points: Vec<Point> = if start < end {
        data.range(start..end).map(|(_, &p)| p).collect()
    } else {
        Vec::new()
    };

    if let [only] = points.as_slice() {
        return FitRecord {
            alpha: only.y,
            beta: 0.0,
            mse: 0.0,
            active: false,
        };
    }

    let fit = best_fit(&points);
    FitRecord {
        alpha: fit.alpha,
        beta: fit.beta,
        mse: fit.mse,
        active: false,
    }
}
