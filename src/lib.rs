//! `seg-lines` library crate: segmented least squares, watchable step by step.
//!
//! The binary (`sls`) is a thin wrapper around this library so the model and
//! solver are testable without a terminal.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod math;
pub mod model;
pub mod plot;
pub mod report;
pub mod solver;
pub mod tui;
