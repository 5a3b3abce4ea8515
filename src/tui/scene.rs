//! Render state kept in sync with the model through events.

use std::collections::BTreeMap;

use crate::domain::{ModelEvent, Point};
use crate::error::ObserverError;
use crate::model::Observer;

/// What the chart currently shows: the points and the active fitted lines.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    points: BTreeMap<usize, Point>,
    /// Keyed by `(end, start)`, like the model's records.
    lines: BTreeMap<(usize, usize), (Point, Point)>,
    events_seen: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the scene with `points` at indices `0..n` and no lines.
    pub fn show_points(&mut self, points: &[Point]) {
        self.clear();
        self.points = points.iter().copied().enumerate().collect();
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.points.values().map(|p| (p.x, p.y)).collect()
    }

    pub fn lines(&self) -> Vec<[(f64, f64); 2]> {
        self.lines
            .values()
            .map(|(a, b)| [(a.x, a.y), (b.x, b.y)])
            .collect()
    }

    /// Points with index in `[start, end)`.
    pub fn points_in(&self, start: usize, end: usize) -> Vec<(f64, f64)> {
        if start >= end {
            return Vec::new();
        }
        self.points.range(start..end).map(|(_, p)| (p.x, p.y)).collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen
    }
}

impl Observer for Scene {
    fn notify(&mut self, event: &ModelEvent) -> Result<(), ObserverError> {
        self.events_seen += 1;
        match *event {
            ModelEvent::PointAdded { index, point } => {
                self.points.insert(index, point);
            }
            ModelEvent::PointRemoved { index } => {
                self.points.remove(&index);
            }
            ModelEvent::SegmentAdded { end, start, from, to } => {
                self.lines.insert((end, start), (from, to));
            }
            ModelEvent::SegmentRemoved { end, start } => {
                self.lines.remove(&(end, start));
            }
        }
        Ok(())
    }
}
