//! Input data for a run.
//!
//! - synthetic point generation (`sample`)

pub mod sample;

pub use sample::*;
