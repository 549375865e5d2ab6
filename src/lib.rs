//! Head gesture recognition from headphone orientation samples.
//!
//! This library turns a stream of device orientation quaternions into
//! discrete head gestures and maps them to media actions:
//! - Left/right head flicks and downward nods
//! - Three sensitivity levels
//! - Configurable gesture to action bindings
//! - Calibration of a neutral head posture
//!
//! The recognition pipeline consists of:
//! 1. Calibration offset removal
//! 2. Conversion from the device frame to the reference frame
//! 3. Yaw/pitch/roll decoding
//! 4. Exponential smoothing and per-sample delta thresholds
//! 5. A global debounce window between gestures
//!
//! # Examples
//!
//! ## Recognizing Gestures
//!
//! ```no_run
//! use head_gesture_control::gesture::{process_degrees, FilterState, GestureConfig, Sensitivity};
//!
//! let mut config = GestureConfig::default();
//! config.sensitivity = Sensitivity::Medium;
//! let mut state = FilterState::new();
//!
//! for (t, yaw) in [(0.0, 0.0), (0.1, 50.0), (0.2, 50.0), (1.2, 50.0)] {
//!     if let Some(event) = process_degrees(yaw, 0.0, t, &config, &mut state) {
//!         println!("{} at {:.1}s", event.kind, event.timestamp);
//!     }
//! }
//! ```
//!
//! ## Running a Session
//!
//! ```no_run
//! use head_gesture_control::{
//!     action::{Dispatcher, LogExecutor},
//!     orientation::Quaternion,
//!     session::{ConfigHandle, SessionOptions, TrackingSession},
//!     tracker::HeadTracker,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> head_gesture_control::Result<()> {
//! let session = TrackingSession::spawn(
//!     HeadTracker::default(),
//!     ConfigHandle::default(),
//!     Dispatcher::new(Arc::new(LogExecutor)),
//!     SessionOptions::default(),
//! )?;
//!
//! let handle = session.handle();
//! handle.start_calibration()?;
//! handle.push_sample(Quaternion::IDENTITY)?;
//! handle.finish_calibration()?;
//!
//! let stats = session.shutdown()?;
//! println!("{} samples processed", stats.samples_processed);
//! # Ok(())
//! # }
//! ```

/// Gesture to action bindings and action execution
pub mod action;

/// Neutral posture calibration
pub mod calibration;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// Signal filtering for orientation angles
pub mod filters;

/// Gesture recognition engine
pub mod gesture;

/// Quaternion math and Euler angle decoding
pub mod orientation;

/// Threaded tracking session
pub mod session;

/// Recorded orientation traces
pub mod trace;

/// Per-sample tracking pipeline
pub mod tracker;

/// 3D vector math
pub mod vector;

pub use error::{Error, Result};
