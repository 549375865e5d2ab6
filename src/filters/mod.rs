//! Signal filtering for the yaw and pitch streams.
//!
//! The gesture engine smooths each axis independently with a first-order
//! exponential filter and classifies the change of the filtered value, so
//! the filter reports both the new output and its delta.

/// Exponential filter for responsive smoothing
pub mod exponential;

pub use exponential::{ExponentialFilter, FilterStep};
