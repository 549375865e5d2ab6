//! Per-sample pipeline from raw device quaternion to gesture event.
//!
//! raw sample -> calibration offset -> reference frame -> Euler angles ->
//! gesture engine. The tracker owns the [`Calibration`] and the session's
//! [`FilterState`]; it is single-owner and must be driven from one thread.

use crate::{
    calibration::{Calibration, CalibrationPhase, CaptureResult},
    gesture::{self, FilterState, GestureConfig, GestureEvent},
    orientation::{to_euler_angles, to_reference_frame, EulerAngles, Quaternion},
    Error, Result,
};
use log::info;

/// Last decoded orientation, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationReadout {
    /// Yaw in degrees
    pub yaw: f64,
    /// Pitch in degrees
    pub pitch: f64,
    /// Roll in degrees
    pub roll: f64,
}

impl From<EulerAngles> for OrientationReadout {
    fn from(angles: EulerAngles) -> Self {
        Self {
            yaw: angles.yaw_degrees(),
            pitch: angles.pitch_degrees(),
            roll: angles.roll_degrees(),
        }
    }
}

/// Head tracker combining calibration and gesture recognition
#[derive(Debug)]
pub struct HeadTracker {
    calibration: Calibration,
    filter: FilterState,
    tracking: bool,
    readout: Option<OrientationReadout>,
}

impl Default for HeadTracker {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

impl HeadTracker {
    /// Create a tracker with tracking enabled
    #[must_use]
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            filter: FilterState::new(),
            tracking: true,
            readout: None,
        }
    }

    /// Handle one raw device-frame sample taken at `now` seconds.
    ///
    /// Samples are recorded by a running calibration capture even while
    /// tracking is paused; recognition only happens while tracking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteSample`] or [`Error::DegenerateQuaternion`]
    /// for unusable samples. The filter state is unchanged in that case.
    pub fn handle_sample(&mut self, raw: Quaternion, now: f64, config: &GestureConfig) -> Result<Option<GestureEvent>> {
        if !raw.is_finite() || !now.is_finite() {
            return Err(Error::NonFiniteSample);
        }

        self.calibration.record(&raw);

        if !self.tracking {
            return Ok(None);
        }

        let corrected = self.calibration.apply(&raw)?;
        let angles = to_euler_angles(to_reference_frame(corrected));
        if !angles.is_finite() {
            return Err(Error::NonFiniteSample);
        }

        self.readout = Some(angles.into());
        Ok(gesture::process(&angles, now, config, &mut self.filter))
    }

    /// Pause or resume recognition. Pausing discards the filter state.
    pub fn set_tracking(&mut self, enabled: bool) {
        if self.tracking == enabled {
            return;
        }
        self.tracking = enabled;
        if !enabled {
            self.filter.reset();
            self.readout = None;
        }
        info!("Tracking {}", if enabled { "enabled" } else { "paused" });
    }

    /// Whether recognition is running
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Begin a calibration capture
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalibrationAlreadyInProgress`] while capturing.
    pub fn start_calibration(&mut self) -> Result<()> {
        self.calibration.start()
    }

    /// Complete the running capture.
    ///
    /// The filter state, including the gesture cooldown, carries over: only
    /// [`Self::reset_orientation`] and pausing discard it.
    ///
    /// # Errors
    ///
    /// See [`Calibration::finish`].
    pub fn finish_calibration(&mut self) -> Result<CaptureResult> {
        self.calibration.finish()
    }

    /// Drop the calibration offset and the filter state
    pub fn reset_orientation(&mut self) {
        self.calibration.reset_orientation();
        self.filter.reset();
    }

    /// Calibration phase
    #[must_use]
    pub const fn calibration_phase(&self) -> CalibrationPhase {
        self.calibration.phase()
    }

    /// Calibration state machine
    #[must_use]
    pub const fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Smoothing state of the running session
    #[must_use]
    pub const fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    /// Last decoded orientation, if tracking produced one
    #[must_use]
    pub const fn readout(&self) -> Option<OrientationReadout> {
        self.readout
    }
}
