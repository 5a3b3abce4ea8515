//! Reporting utilities: run summaries and segment tables.

pub mod format;

pub use format::*;
