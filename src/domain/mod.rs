//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations (`Point`) and cached fits (`FitRecord`, `Segment`)
//! - the model's change notifications (`ModelEvent`)
//! - run configuration (`RunConfig`, `Shape`)

pub mod types;

pub use types::*;
