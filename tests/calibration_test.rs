//! Calibration lifecycle tests


use head_gesture_control::{
    calibration::{Calibration, CalibrationCapture, CalibrationPhase, CaptureResult, MeanOrientationCapture},
    gesture::GestureConfig,
    orientation::{to_euler_angles, to_reference_frame, Quaternion},
    tracker::HeadTracker,
    Error, Result,
};
use test_helpers::{assert_close, assert_same_rotation, nod, turn};

fn calibrate(calibration: &mut Calibration, samples: &[Quaternion]) -> Result<CaptureResult> {
    calibration.start()?;
    for sample in samples {
        calibration.record(sample);
    }
    calibration.finish()
}

#[test]
fn test_captured_pose_reads_as_identity() {
    let mut calibration = Calibration::default();
    let posture = turn(20.0) * nod(10.0);

    let result = calibrate(&mut calibration, &[posture; 8]).unwrap();
    assert_eq!(result.samples, 8);
    assert_eq!(calibration.phase(), CalibrationPhase::Calibrated);
    assert_same_rotation(&calibration.offset(), &posture, 1e-9);

    let corrected = calibration.apply(&posture).unwrap();
    assert_same_rotation(&corrected, &Quaternion::IDENTITY, 1e-9);
}

#[test]
fn test_turn_is_measured_from_calibrated_pose() {
    let mut calibration = Calibration::default();
    calibrate(&mut calibration, &[turn(30.0)]).unwrap();

    let corrected = calibration.apply(&turn(45.0)).unwrap();
    let angles = to_euler_angles(to_reference_frame(corrected));
    assert_close(angles.yaw_degrees(), 15.0, 1e-6);
}

#[test]
fn test_start_while_capturing_is_rejected() {
    let mut calibration = Calibration::default();
    calibration.start().unwrap();
    calibration.record(&turn(10.0));

    assert!(matches!(calibration.start(), Err(Error::CalibrationAlreadyInProgress)));
    assert_eq!(calibration.phase(), CalibrationPhase::Capturing);

    // The running capture kept its sample
    let result = calibration.finish().unwrap();
    assert_eq!(result.samples, 1);
}

#[test]
fn test_finish_without_start() {
    let mut calibration = Calibration::default();
    assert!(matches!(calibration.finish(), Err(Error::CalibrationNotInProgress)));
    assert_eq!(calibration.phase(), CalibrationPhase::Idle);
}

#[test]
fn test_empty_capture_restores_previous_state() {
    let mut calibration = Calibration::default();
    assert!(matches!(calibrate(&mut calibration, &[]), Err(Error::EmptyCalibration)));
    assert_eq!(calibration.phase(), CalibrationPhase::Idle);
    assert_eq!(calibration.offset(), Quaternion::IDENTITY);

    let posture = turn(12.0);
    calibrate(&mut calibration, &[posture]).unwrap();
    assert!(matches!(calibrate(&mut calibration, &[]), Err(Error::EmptyCalibration)));
    assert_eq!(calibration.phase(), CalibrationPhase::Calibrated);
    assert_same_rotation(&calibration.offset(), &posture, 1e-9);
}

#[test]
fn test_unusable_samples_are_not_recorded() {
    let mut calibration = Calibration::default();
    let samples = [
        Quaternion::new(0.0, 0.0, 0.0, 0.0),
        Quaternion::new(f64::NAN, 0.0, 0.0, 0.0),
    ];
    assert!(matches!(calibrate(&mut calibration, &samples), Err(Error::EmptyCalibration)));
}

#[test]
fn test_offset_unchanged_while_capturing() {
    let mut calibration = Calibration::default();
    let first = turn(15.0);
    calibrate(&mut calibration, &[first]).unwrap();

    calibration.start().unwrap();
    calibration.record(&turn(-40.0));
    assert_same_rotation(&calibration.offset(), &first, 1e-9);
}

#[test]
fn test_reset_is_idempotent() {
    let mut calibration = Calibration::default();
    calibrate(&mut calibration, &[turn(25.0)]).unwrap();

    calibration.reset_orientation();
    assert_eq!(calibration.phase(), CalibrationPhase::Idle);
    assert_eq!(calibration.offset(), Quaternion::IDENTITY);

    calibration.reset_orientation();
    assert_eq!(calibration.phase(), CalibrationPhase::Idle);
    assert_eq!(calibration.offset(), Quaternion::IDENTITY);
}

#[test]
fn test_reset_aborts_capture() {
    let mut calibration = Calibration::default();
    calibration.start().unwrap();
    calibration.record(&turn(25.0));
    calibration.reset_orientation();

    assert_eq!(calibration.phase(), CalibrationPhase::Idle);
    assert!(matches!(calibration.finish(), Err(Error::CalibrationNotInProgress)));

    // A fresh capture does not see the aborted sample
    let result = calibrate(&mut calibration, &[turn(5.0)]).unwrap();
    assert_eq!(result.samples, 1);
}

#[test]
fn test_mean_is_sign_invariant() {
    let mut capture = MeanOrientationCapture::new();
    let posture = turn(35.0);
    capture.begin();
    capture.record(&posture);
    capture.record(&posture.negated());
    capture.record(&posture);

    let result = capture.complete().unwrap();
    assert_same_rotation(&result.offset, &posture, 1e-9);
    assert!(capture.is_empty());
}

#[test]
fn test_nod_axis_estimate() {
    let mut capture = MeanOrientationCapture::new();
    capture.begin();
    capture.record(&Quaternion::IDENTITY);
    capture.record(&nod(10.0));
    capture.record(&nod(20.0));

    let axis = capture.complete().unwrap().nod_axis.unwrap();
    assert_close(axis.x, -1.0, 1e-9);
    assert_close(axis.y, 0.0, 1e-9);
    assert_close(axis.z, 0.0, 1e-9);
}

#[test]
fn test_still_capture_has_no_nod_axis() {
    let mut capture = MeanOrientationCapture::new();
    capture.begin();
    for _ in 0..4 {
        capture.record(&turn(5.0));
    }
    assert_eq!(capture.complete().unwrap().nod_axis, None);
}

#[test]
fn test_tracker_records_samples_while_paused() {
    let mut tracker = HeadTracker::default();
    let config = GestureConfig::default();
    tracker.set_tracking(false);

    tracker.start_calibration().unwrap();
    tracker.handle_sample(turn(20.0), 0.0, &config).unwrap();
    let result = tracker.finish_calibration().unwrap();
    assert_eq!(result.samples, 1);
    assert_eq!(tracker.calibration_phase(), CalibrationPhase::Calibrated);
}

#[test]
fn test_calibration_keeps_gesture_cooldown() {
    let mut tracker = HeadTracker::default();
    let config = GestureConfig::default();

    let first = tracker.handle_sample(turn(50.0), 0.0, &config).unwrap();
    assert_eq!(first.map(|e| e.timestamp), Some(0.0));

    tracker.start_calibration().unwrap();
    tracker.handle_sample(turn(0.0), 0.1, &config).unwrap();
    tracker.finish_calibration().unwrap();

    // Delta 10.4 exceeds the threshold but the window is still open
    assert!(tracker.handle_sample(turn(60.0), 0.3, &config).unwrap().is_none());
    assert_eq!(tracker.filter_state().last_gesture_at(), Some(0.0));

    // Delta 8.32, one second after the first flick
    let next = tracker.handle_sample(turn(60.0), 1.0, &config).unwrap();
    assert_eq!(next.map(|e| e.timestamp), Some(1.0));
}

#[test]
fn test_empty_calibration_keeps_gesture_cooldown() {
    let mut tracker = HeadTracker::default();
    let config = GestureConfig::default();

    assert!(tracker.handle_sample(turn(50.0), 0.0, &config).unwrap().is_some());
    let before = tracker.filter_state().clone();

    tracker.start_calibration().unwrap();
    assert!(matches!(tracker.finish_calibration(), Err(Error::EmptyCalibration)));
    assert_eq!(tracker.filter_state(), &before);

    assert!(tracker.handle_sample(turn(60.0), 0.3, &config).unwrap().is_none());
}
