//! Terminal plotting for headless runs.

pub mod ascii;

pub use ascii::*;
