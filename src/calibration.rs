//! Reference-orientation calibration.
//!
//! Lifecycle: `Idle -> Capturing -> Calibrated`, with
//! [`Calibration::reset_orientation`] returning to `Idle` from anywhere.
//! While capturing, raw samples go to a pluggable [`CalibrationCapture`];
//! the offset in use does not change until [`Calibration::finish`]
//! succeeds. Corrected samples are `offset⁻¹ ⊗ raw`, so holding the
//! captured pose reads as the identity rotation.

use crate::{orientation::Quaternion, vector::Vector3, Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forward direction in the device frame (x right, y up, z back)
const DEVICE_FORWARD: Vector3 = Vector3::new(0.0, 0.0, -1.0);

/// Phase of the calibration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalibrationPhase {
    /// No offset captured; the identity offset is in use
    #[default]
    Idle,
    /// Samples are being recorded
    Capturing,
    /// A captured offset is in use
    Calibrated,
}

/// Result of a completed capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureResult {
    /// Unit quaternion of the neutral head pose, in the device frame
    pub offset: Quaternion,
    /// Number of samples that contributed
    pub samples: usize,
    /// Estimated nod axis in the device frame, when the head moved enough
    pub nod_axis: Option<Vector3>,
}

/// Capture algorithm that turns recorded samples into a neutral pose
pub trait CalibrationCapture: Send {
    /// Start a fresh recording
    fn begin(&mut self);

    /// Record one raw sample
    fn record(&mut self, raw: &Quaternion);

    /// Finish the recording
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCalibration`] when nothing usable was recorded.
    fn complete(&mut self) -> Result<CaptureResult>;

    /// Discard the recording
    fn abort(&mut self);

    /// Capture algorithm name
    fn name(&self) -> &str;
}

/// Averages the recorded orientations.
///
/// Samples are sign-aligned with the first one before summing, since `q`
/// and `-q` encode the same rotation. The nod axis is estimated from the
/// cross products between the first forward vector and every later one.
#[derive(Debug, Clone)]
pub struct MeanOrientationCapture {
    first: Option<Quaternion>,
    sum: Quaternion,
    axis_sum: Vector3,
    count: usize,
}

impl Default for MeanOrientationCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl MeanOrientationCapture {
    /// Create an empty capture
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first: None,
            sum: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            axis_sum: Vector3::ZERO,
            count: 0,
        }
    }

    /// Number of samples recorded so far
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// True when nothing was recorded
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl CalibrationCapture for MeanOrientationCapture {
    fn begin(&mut self) {
        *self = Self::new();
    }

    fn record(&mut self, raw: &Quaternion) {
        let q = match raw.normalized() {
            Ok(q) => q,
            Err(e) => {
                debug!("Skipping calibration sample: {e}");
                return;
            }
        };

        let first = *self.first.get_or_insert(q);
        let q = if q.dot(&first) < 0.0 { q.negated() } else { q };

        self.sum = Quaternion::new(
            self.sum.w + q.w,
            self.sum.x + q.x,
            self.sum.y + q.y,
            self.sum.z + q.z,
        );

        let forward_first = first.rotate_vector(DEVICE_FORWARD);
        let forward = q.rotate_vector(DEVICE_FORWARD);
        self.axis_sum = self.axis_sum + forward_first.cross(&forward);
        self.count += 1;
    }

    fn complete(&mut self) -> Result<CaptureResult> {
        if self.count == 0 {
            return Err(Error::EmptyCalibration);
        }

        let offset = self.sum.normalized()?;
        // No head motion during capture leaves no usable axis
        let nod_axis = self.axis_sum.normalized().ok();
        let result = CaptureResult {
            offset,
            samples: self.count,
            nod_axis,
        };

        *self = Self::new();
        Ok(result)
    }

    fn abort(&mut self) {
        *self = Self::new();
    }

    fn name(&self) -> &str {
        "MeanOrientationCapture"
    }
}

/// Calibration state machine and the offset it produces
pub struct Calibration {
    phase: CalibrationPhase,
    offset: Quaternion,
    restore: Option<(CalibrationPhase, Quaternion)>,
    capture: Box<dyn CalibrationCapture>,
}

impl fmt::Debug for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calibration")
            .field("phase", &self.phase)
            .field("offset", &self.offset)
            .field("capture", &self.capture.name())
            .finish()
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(Box::new(MeanOrientationCapture::new()))
    }
}

impl Calibration {
    /// Create an idle calibration using `capture` for future recordings
    #[must_use]
    pub fn new(capture: Box<dyn CalibrationCapture>) -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            offset: Quaternion::IDENTITY,
            restore: None,
            capture,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Offset currently applied to raw samples
    #[must_use]
    pub const fn offset(&self) -> Quaternion {
        self.offset
    }

    /// Begin a capture.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalibrationAlreadyInProgress`] while capturing; the
    /// running capture is left untouched.
    pub fn start(&mut self) -> Result<()> {
        if self.phase == CalibrationPhase::Capturing {
            return Err(Error::CalibrationAlreadyInProgress);
        }

        self.restore = Some((self.phase, self.offset));
        self.capture.begin();
        self.phase = CalibrationPhase::Capturing;
        info!("Calibration started ({})", self.capture.name());
        Ok(())
    }

    /// Feed a raw sample; ignored unless capturing
    pub fn record(&mut self, raw: &Quaternion) {
        if self.phase == CalibrationPhase::Capturing {
            self.capture.record(raw);
        }
    }

    /// Complete the capture and adopt its offset.
    ///
    /// On failure the phase and offset from before [`Calibration::start`]
    /// are restored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalibrationNotInProgress`] outside a capture, or the
    /// capture algorithm's error (e.g. [`Error::EmptyCalibration`]).
    pub fn finish(&mut self) -> Result<CaptureResult> {
        if self.phase != CalibrationPhase::Capturing {
            return Err(Error::CalibrationNotInProgress);
        }

        match self.capture.complete() {
            Ok(result) => {
                self.offset = result.offset;
                self.phase = CalibrationPhase::Calibrated;
                self.restore = None;
                info!("Calibration finished with {} samples", result.samples);
                Ok(result)
            }
            Err(e) => {
                let (phase, offset) = self
                    .restore
                    .take()
                    .unwrap_or((CalibrationPhase::Idle, Quaternion::IDENTITY));
                self.phase = phase;
                self.offset = offset;
                info!("Calibration failed: {e}");
                Err(e)
            }
        }
    }

    /// Return to `Idle` with the identity offset, aborting any capture
    pub fn reset_orientation(&mut self) {
        if self.phase == CalibrationPhase::Capturing {
            self.capture.abort();
        }
        self.phase = CalibrationPhase::Idle;
        self.offset = Quaternion::IDENTITY;
        self.restore = None;
        debug!("Orientation reset");
    }

    /// Apply the offset to a raw sample
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteSample`] or [`Error::DegenerateQuaternion`]
    /// for unusable samples.
    pub fn apply(&self, raw: &Quaternion) -> Result<Quaternion> {
        let raw = raw.normalized()?;
        Ok(self.offset.conjugate() * raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::to_euler_angles;

    fn yaw_rotation(angle: f64) -> Quaternion {
        Quaternion::from_axis_angle(Vector3::Y, angle).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let calibration = Calibration::default();
        assert_eq!(calibration.phase(), CalibrationPhase::Idle);
        assert_eq!(calibration.offset(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_full_cycle() {
        let mut calibration = Calibration::default();
        let pose = yaw_rotation(0.5);

        calibration.start().unwrap();
        for _ in 0..10 {
            calibration.record(&pose);
        }
        let result = calibration.finish().unwrap();

        assert_eq!(result.samples, 10);
        assert_eq!(calibration.phase(), CalibrationPhase::Calibrated);

        let corrected = calibration.apply(&pose).unwrap();
        let angles = to_euler_angles(corrected);
        assert!(angles.yaw.abs() < 1e-9);
        assert!(angles.pitch.abs() < 1e-9);
    }

    #[test]
    fn test_offset_unchanged_until_finish() {
        let mut calibration = Calibration::default();
        calibration.start().unwrap();
        calibration.record(&yaw_rotation(1.0));
        assert_eq!(calibration.offset(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut calibration = Calibration::default();
        calibration.start().unwrap();
        calibration.record(&yaw_rotation(0.2));

        assert!(matches!(calibration.start(), Err(Error::CalibrationAlreadyInProgress)));
        assert_eq!(calibration.phase(), CalibrationPhase::Capturing);
        // The first capture keeps its samples
        assert_eq!(calibration.finish().unwrap().samples, 1);
    }

    #[test]
    fn test_finish_without_start() {
        let mut calibration = Calibration::default();
        assert!(matches!(calibration.finish(), Err(Error::CalibrationNotInProgress)));
    }

    #[test]
    fn test_empty_capture_restores_previous_offset() {
        let mut calibration = Calibration::default();
        calibration.start().unwrap();
        calibration.record(&yaw_rotation(0.3));
        let offset = calibration.finish().unwrap().offset;

        calibration.start().unwrap();
        assert!(matches!(calibration.finish(), Err(Error::EmptyCalibration)));
        assert_eq!(calibration.phase(), CalibrationPhase::Calibrated);
        assert_eq!(calibration.offset(), offset);
    }

    #[test]
    fn test_reset_aborts_capture() {
        let mut calibration = Calibration::default();
        calibration.start().unwrap();
        calibration.record(&yaw_rotation(0.3));
        calibration.reset_orientation();

        assert_eq!(calibration.phase(), CalibrationPhase::Idle);
        assert_eq!(calibration.offset(), Quaternion::IDENTITY);
        assert!(matches!(calibration.finish(), Err(Error::CalibrationNotInProgress)));
    }

    #[test]
    fn test_mean_capture_handles_sign_flips() {
        let mut capture = MeanOrientationCapture::new();
        let pose = yaw_rotation(0.8);
        capture.record(&pose);
        capture.record(&pose.negated());

        let result = capture.complete().unwrap();
        assert!((result.offset.dot(&pose).abs() - 1.0).abs() < 1e-9);
        assert!(capture.is_empty());
    }

    #[test]
    fn test_still_capture_has_no_nod_axis() {
        let mut capture = MeanOrientationCapture::new();
        for _ in 0..5 {
            capture.record(&Quaternion::IDENTITY);
        }
        assert_eq!(capture.complete().unwrap().nod_axis, None);
    }

    #[test]
    fn test_nod_axis_is_lateral() {
        let mut capture = MeanOrientationCapture::new();
        capture.record(&Quaternion::IDENTITY);
        for step in 1..=5 {
            let nod = Quaternion::from_axis_angle(-Vector3::X, 0.05 * f64::from(step)).unwrap();
            capture.record(&nod);
        }

        let axis = capture.complete().unwrap().nod_axis.unwrap();
        assert!((axis.x.abs() - 1.0).abs() < 1e-9);
        assert!(axis.y.abs() < 1e-9);
        assert!(axis.z.abs() < 1e-9);
    }

    #[test]
    fn test_capture_skips_unusable_samples() {
        let mut capture = MeanOrientationCapture::new();
        capture.record(&Quaternion::new(f64::NAN, 0.0, 0.0, 0.0));
        capture.record(&Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert!(capture.is_empty());
        assert!(matches!(capture.complete(), Err(Error::EmptyCalibration)));
    }
}
