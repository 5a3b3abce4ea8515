//! Mathematical utilities: closed-form line fitting.

pub mod fit;

pub use fit::*;
