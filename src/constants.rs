//! Constants used throughout the gesture pipeline

/// Exponential smoothing coefficient applied to yaw and pitch
pub const SMOOTHING_ALPHA: f64 = 0.2;

/// Minimum time between two accepted gestures, in seconds
pub const DEBOUNCE_WINDOW_SECS: f64 = 1.0;

/// Yaw/pitch thresholds in degrees for the low sensitivity profile
pub const LOW_YAW_THRESHOLD: f64 = 10.0;
pub const LOW_PITCH_THRESHOLD: f64 = 4.0;

/// Yaw/pitch thresholds in degrees for the medium sensitivity profile
pub const MEDIUM_YAW_THRESHOLD: f64 = 7.0;
pub const MEDIUM_PITCH_THRESHOLD: f64 = 3.0;

/// Yaw/pitch thresholds in degrees for the high sensitivity profile
pub const HIGH_YAW_THRESHOLD: f64 = 4.0;
pub const HIGH_PITCH_THRESHOLD: f64 = 2.0;

/// Default bound of the source to consumer sample channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default bound of the recognized gesture channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// How long shutdown waits for running actions, in seconds
pub const DEFAULT_ACTION_DRAIN_SECS: u64 = 5;

/// Exponential filter bounds
pub const SMOOTHING_ALPHA_MIN: f64 = 0.0;
pub const SMOOTHING_ALPHA_MAX: f64 = 1.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
