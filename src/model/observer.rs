//! Observer contract for [`SegmentModel`](super::SegmentModel) events.
//!
//! Observers are plain synchronous callbacks: the model calls `notify` on each
//! registered observer, in registration order, before the mutating call returns.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::domain::ModelEvent;
use crate::error::ObserverError;

/// Anything that wants to follow the model's state.
pub trait Observer {
    fn notify(&mut self, event: &ModelEvent) -> Result<(), ObserverError>;
}

/// Shared handle, so a caller can register an observer and still inspect it.
impl<O: Observer + ?Sized> Observer for Rc<RefCell<O>> {
    fn notify(&mut self, event: &ModelEvent) -> Result<(), ObserverError> {
        let mut inner = self
            .try_borrow_mut()
            .map_err(|_| ObserverError::Render("observer is already borrowed".to_string()))?;
        inner.notify(event)
    }
}

/// Records every event it receives.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<ModelEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ModelEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Observer for EventLog {
    fn notify(&mut self, event: &ModelEvent) -> Result<(), ObserverError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Streams events as newline-delimited JSON.
pub struct NdjsonWriter<W: Write> {
    out: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Observer for NdjsonWriter<W> {
    fn notify(&mut self, event: &ModelEvent) -> Result<(), ObserverError> {
        let line = serde_json::to_string(event)
            .map_err(|e| ObserverError::Render(format!("event serialization failed: {e}")))?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    #[test]
    fn shared_handle_forwards_to_inner_log() {
        let log = Rc::new(RefCell::new(EventLog::new()));
        let mut handle = log.clone();
        handle.notify(&ModelEvent::PointRemoved { index: 3 }).unwrap();
        assert_eq!(log.borrow().events(), &[ModelEvent::PointRemoved { index: 3 }]);
    }

    #[test]
    fn busy_shared_handle_reports_error() {
        let log = Rc::new(RefCell::new(EventLog::new()));
        let mut handle = log.clone();
        let _guard = log.borrow();
        assert!(handle.notify(&ModelEvent::PointRemoved { index: 0 }).is_err());
    }

    #[test]
    fn ndjson_writes_one_line_per_event() {
        let mut writer = NdjsonWriter::new(Vec::new());
        writer
            .notify(&ModelEvent::PointAdded {
                index: 0,
                point: Point::new(1.0, 2.0),
            })
            .unwrap();
        writer.notify(&ModelEvent::PointRemoved { index: 0 }).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"point_added","index":0,"point":{"x":1.0,"y":2.0}}"#);
        assert_eq!(lines[1], r#"{"type":"point_removed","index":0}"#);
    }
}
