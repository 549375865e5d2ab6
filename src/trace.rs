//! Recorded orientation traces.
//!
//! A trace is JSON Lines: one object per line, tagged by `kind`. Blank
//! lines and lines starting with `#` are ignored.
//!
//! ```text
//! {"kind": "sample", "t": 0.10, "w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0}
//! {"kind": "connectivity", "connected": false}
//! {"kind": "calibration_start"}
//! {"kind": "calibration_finish"}
//! {"kind": "reset_orientation"}
//! {"kind": "tracking", "enabled": false}
//! ```

use crate::{orientation::Quaternion, session::SessionHandle, Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// One line of a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Raw device-frame orientation at `t` seconds
    Sample {
        /// Timestamp in seconds
        t: f64,
        /// Scalar part
        w: f64,
        /// X component
        x: f64,
        /// Y component
        y: f64,
        /// Z component
        z: f64,
    },
    /// Source connectivity change
    Connectivity {
        /// Whether the source is connected
        connected: bool,
    },
    /// Begin calibration capture
    CalibrationStart,
    /// Complete calibration capture
    CalibrationFinish,
    /// Reset the calibration offset
    ResetOrientation,
    /// Pause or resume recognition
    Tracking {
        /// Whether recognition runs
        enabled: bool,
    },
}

impl TraceRecord {
    /// Sample record for `q` at `t`
    #[must_use]
    pub const fn sample(t: f64, q: Quaternion) -> Self {
        Self::Sample {
            t,
            w: q.w,
            x: q.x,
            y: q.y,
            z: q.z,
        }
    }
}

/// Parse one line; `None` for blank and comment lines
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for malformed JSON or unknown kinds.
pub fn parse_line(line: &str) -> Result<Option<TraceRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("Invalid trace record: {e}")))
}

/// Read a whole trace
///
/// # Errors
///
/// Returns [`Error::Io`] on read failures and [`Error::InvalidInput`] naming
/// the first malformed line.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<TraceRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(Error::InvalidInput(msg)) => return Err(Error::InvalidInput(format!("line {}: {msg}", index + 1))),
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

/// Read a trace file
///
/// # Errors
///
/// See [`read_trace`].
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceRecord>> {
    let file = File::open(path)?;
    read_trace(BufReader::new(file))
}

/// Feed records into a running session, in order.
///
/// Calibration failures are logged and replay continues.
///
/// # Errors
///
/// Returns [`Error::SessionClosed`] if the session stopped.
pub fn replay(records: &[TraceRecord], handle: &SessionHandle) -> Result<()> {
    for record in records {
        match *record {
            TraceRecord::Sample { t, w, x, y, z } => handle.push_sample_at(Quaternion::new(w, x, y, z), t)?,
            TraceRecord::Connectivity { connected } => handle.set_connected(connected),
            TraceRecord::CalibrationStart => match handle.start_calibration() {
                Err(Error::SessionClosed) => return Err(Error::SessionClosed),
                Err(e) => warn!("Calibration start ignored: {e}"),
                Ok(()) => {}
            },
            TraceRecord::CalibrationFinish => match handle.finish_calibration() {
                Ok(result) => info!(
                    "Calibrated from {} samples (nod axis: {:?})",
                    result.samples, result.nod_axis
                ),
                Err(Error::SessionClosed) => return Err(Error::SessionClosed),
                Err(e) => warn!("Calibration finish ignored: {e}"),
            },
            TraceRecord::ResetOrientation => handle.reset_orientation()?,
            TraceRecord::Tracking { enabled } => handle.set_tracking(enabled)?,
        }
    }
    Ok(())
}
