//! Quaternion algebra, frame remapping and Tait-Bryan decomposition.
//!
//! Two frames are involved:
//!
//! - the **device frame** reported by the sensor: x right, y up, z toward
//!   the back of the head;
//! - the **reference frame** the gesture engine reasons in: x forward,
//!   y left, z up (right-handed).
//!
//! Euler angles are intrinsic Z-Y'-X'' (yaw, then pitch, then roll) in the
//! reference frame. With this convention a positive yaw is a turn to the
//! left and a positive pitch lowers the nose, which is what the gesture
//! classifier expects.

use crate::{constants::EPSILON, vector::Vector3, Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Orientation sample as a (not necessarily unit) quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar part
    pub w: f64,
    /// X component of the vector part
    pub x: f64,
    /// Y component of the vector part
    pub y: f64,
    /// Z component of the vector part
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// The identity rotation
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// Create a quaternion from components
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians around `axis`
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateVector`] when `axis` has zero length.
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Result<Self> {
        let axis = axis.normalized()?;
        let (sin, cos) = (angle / 2.0).sin_cos();
        Ok(Self::new(cos, axis.x * sin, axis.y * sin, axis.z * sin))
    }

    /// Vector part as a [`Vector3`]
    #[must_use]
    pub const fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Conjugate (the inverse for unit quaternions)
    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Four-dimensional dot product
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean norm
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit quaternion representing the same rotation
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteSample`] for NaN/infinite components and
    /// [`Error::DegenerateQuaternion`] when the norm is zero.
    pub fn normalized(&self) -> Result<Self> {
        if !self.is_finite() {
            return Err(Error::NonFiniteSample);
        }
        let largest = self.w.abs().max(self.x.abs()).max(self.y.abs()).max(self.z.abs());
        if largest < EPSILON {
            return Err(Error::DegenerateQuaternion);
        }
        // Scale down first so squaring large components cannot overflow
        let scaled = Self::new(self.w / largest, self.x / largest, self.y / largest, self.z / largest);
        let norm = scaled.norm();
        Ok(Self::new(scaled.w / norm, scaled.x / norm, scaled.y / norm, scaled.z / norm))
    }

    /// Same rotation with the opposite sign
    #[must_use]
    pub fn negated(&self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    /// True when all components are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate `v` by this quaternion, assumed to be unit length
    #[must_use]
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        // v' = v + w * t + u × t, with t = 2 (u × v)
        let u = self.vector();
        let t = u.cross(&v).scaled(2.0);
        v + t.scaled(self.w) + u.cross(&t)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    /// Hamilton product `self ⊗ rhs`
    fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

/// Decoded orientation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation about the vertical axis, positive to the left
    pub yaw: f64,
    /// Rotation about the lateral axis, positive nose-down
    pub pitch: f64,
    /// Rotation about the forward axis
    pub roll: f64,
}

impl EulerAngles {
    /// Yaw in degrees
    #[must_use]
    pub fn yaw_degrees(&self) -> f64 {
        rad_to_deg(self.yaw)
    }

    /// Pitch in degrees
    #[must_use]
    pub fn pitch_degrees(&self) -> f64 {
        rad_to_deg(self.pitch)
    }

    /// Roll in degrees
    #[must_use]
    pub fn roll_degrees(&self) -> f64 {
        rad_to_deg(self.roll)
    }

    /// True when all three angles are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

/// Remap a device-frame quaternion into the reference frame.
///
/// The reference axes expressed in device axes are forward = -z,
/// left = -x and up = +y. That change of basis is a proper rotation, so the
/// vector part of the quaternion is permuted the same way.
#[must_use]
pub fn to_reference_frame(q: Quaternion) -> Quaternion {
    Quaternion::new(q.w, -q.z, -q.x, q.y)
}

/// Decompose a reference-frame quaternion into intrinsic Z-Y'-X'' angles.
///
/// Non-unit input is normalized first. A zero or non-finite quaternion is
/// passed through unnormalized and yields angles the caller must validate.
#[must_use]
pub fn to_euler_angles(q: Quaternion) -> EulerAngles {
    let q = q.normalized().unwrap_or(q);

    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    let pitch = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0).asin();
    let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));

    EulerAngles { yaw, pitch, roll }
}

/// Radians to degrees
#[must_use]
pub fn rad_to_deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Degrees to radians
#[must_use]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}
