//! Utility functions and helpers

pub mod math;
pub mod matrix;

pub use math::{entropy, include_bias, log_softmax, softmax, weighted_sample};
pub use matrix::{dot, Matrix};
