//! Gesture recognition engine.
//!
//! Turns a stream of decoded head orientations into discrete, debounced
//! gesture events. Each sample:
//!
//! 1. smooths yaw and pitch (degrees) with an exponential filter, α = 0.2;
//! 2. takes the change of each filtered value since the previous sample;
//! 3. fires when a change strictly exceeds the active sensitivity threshold
//!    and at least [`DEBOUNCE_WINDOW_SECS`] have passed since the last
//!    gesture of *any* kind.
//!
//! Positive yaw change is a left flick, negative a right flick. Positive
//! pitch change (nose down) is a nod; negative pitch change never fires.
//! Flicks are evaluated before nods, so one sample yields at most one event.
//!
//! The engine is a pure function over [`FilterState`]: configuration is
//! passed in as a snapshot on every call and nothing is dispatched from here.

use crate::{
    action::ActionBindings,
    constants::{
        DEBOUNCE_WINDOW_SECS, HIGH_PITCH_THRESHOLD, HIGH_YAW_THRESHOLD, LOW_PITCH_THRESHOLD, LOW_YAW_THRESHOLD,
        MEDIUM_PITCH_THRESHOLD, MEDIUM_YAW_THRESHOLD, SMOOTHING_ALPHA,
    },
    filters::ExponentialFilter,
    orientation::{rad_to_deg, EulerAngles},
    Error,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Gesture threshold profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sensitivity {
    /// Largest thresholds, fewest triggers
    #[serde(alias = "low")]
    Low,
    /// Default profile
    #[default]
    #[serde(alias = "medium")]
    Medium,
    /// Smallest thresholds
    #[serde(alias = "high")]
    High,
}

/// Per-axis change thresholds in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum yaw change for a flick
    pub yaw: f64,
    /// Minimum pitch change for a nod
    pub pitch: f64,
}

impl Sensitivity {
    /// All profiles, lowest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Threshold table for this profile
    #[must_use]
    pub const fn thresholds(self) -> Thresholds {
        match self {
            Self::Low => Thresholds {
                yaw: LOW_YAW_THRESHOLD,
                pitch: LOW_PITCH_THRESHOLD,
            },
            Self::Medium => Thresholds {
                yaw: MEDIUM_YAW_THRESHOLD,
                pitch: MEDIUM_PITCH_THRESHOLD,
            },
            Self::High => Thresholds {
                yaw: HIGH_YAW_THRESHOLD,
                pitch: HIGH_PITCH_THRESHOLD,
            },
        }
    }

    /// Display label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::InvalidInput(format!("Unknown sensitivity: {s}"))),
        }
    }
}

/// Kind of recognized gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    /// Quick yaw to the left
    LeftFlick,
    /// Quick yaw to the right
    RightFlick,
    /// Quick downward pitch
    Nod,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LeftFlick => "Left Flick",
            Self::RightFlick => "Right Flick",
            Self::Nod => "Nod",
        };
        f.pad(label)
    }
}

/// A recognized gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// What was recognized
    pub kind: GestureKind,
    /// Sample time in seconds
    pub timestamp: f64,
}

/// Configuration snapshot read by the engine on every sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Active threshold profile
    pub sensitivity: Sensitivity,
    /// Gesture to action mapping
    pub bindings: ActionBindings,
}

/// Smoothing and cooldown memory of one tracking session
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    yaw: ExponentialFilter,
    pitch: ExponentialFilter,
    last_gesture_at: Option<f64>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Fresh state: both axes seeded at zero, no cooldown pending
    #[must_use]
    pub fn new() -> Self {
        Self {
            yaw: ExponentialFilter::new(SMOOTHING_ALPHA),
            pitch: ExponentialFilter::new(SMOOTHING_ALPHA),
            last_gesture_at: None,
        }
    }

    /// Filtered yaw in degrees
    #[must_use]
    pub const fn filtered_yaw(&self) -> f64 {
        self.yaw.value()
    }

    /// Filtered pitch in degrees
    #[must_use]
    pub const fn filtered_pitch(&self) -> f64 {
        self.pitch.value()
    }

    /// Timestamp of the last emitted gesture
    #[must_use]
    pub const fn last_gesture_at(&self) -> Option<f64> {
        self.last_gesture_at
    }

    /// Forget all smoothing and cooldown history
    pub fn reset(&mut self) {
        self.yaw.reset();
        self.pitch.reset();
        self.last_gesture_at = None;
    }

    fn cooled_down(&self, now: f64) -> bool {
        self.last_gesture_at
            .map_or(true, |last| now - last >= DEBOUNCE_WINDOW_SECS)
    }
}

/// Map filtered deltas to a gesture, ignoring the debounce window.
///
/// Thresholds are strict: a delta equal to the threshold does not fire.
#[must_use]
pub fn classify(yaw_delta: f64, pitch_delta: f64, thresholds: Thresholds) -> Option<GestureKind> {
    if yaw_delta.abs() > thresholds.yaw {
        return Some(if yaw_delta > 0.0 {
            GestureKind::LeftFlick
        } else {
            GestureKind::RightFlick
        });
    }
    if pitch_delta > thresholds.pitch {
        return Some(GestureKind::Nod);
    }
    None
}

/// Process one decoded orientation sampled at `now` seconds.
pub fn process(
    angles: &EulerAngles,
    now: f64,
    config: &GestureConfig,
    state: &mut FilterState,
) -> Option<GestureEvent> {
    process_degrees(rad_to_deg(angles.yaw), rad_to_deg(angles.pitch), now, config, state)
}

/// Process one sample given yaw and pitch in degrees.
///
/// Non-finite angles or timestamps are dropped without touching `state`.
pub fn process_degrees(
    yaw: f64,
    pitch: f64,
    now: f64,
    config: &GestureConfig,
    state: &mut FilterState,
) -> Option<GestureEvent> {
    if !(yaw.is_finite() && pitch.is_finite() && now.is_finite()) {
        debug!("Dropping non-finite sample: yaw={yaw}, pitch={pitch}, t={now}");
        return None;
    }

    // Both axes are finite, so both filters advance together
    let yaw_step = state.yaw.apply(yaw)?;
    let pitch_step = state.pitch.apply(pitch)?;

    if !state.cooled_down(now) {
        return None;
    }

    let kind = classify(yaw_step.delta, pitch_step.delta, config.sensitivity.thresholds())?;
    state.last_gesture_at = Some(now);

    debug!(
        "{kind} detected at {now:.3}s (yaw delta {:.2}°, pitch delta {:.2}°, {} sensitivity)",
        yaw_step.delta, pitch_step.delta, config.sensitivity
    );

    Some(GestureEvent { kind, timestamp: now })
}
