//! Three-component vector math used by orientation and calibration code.

use crate::{constants::EPSILON, Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// A 3-D vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Unit vector along X
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit vector along Y
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit vector along Z
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);
    /// The zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from its components
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Cross product `self × other`
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Dot product
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateVector`] when the magnitude is zero (or
    /// too small to divide by) and [`Error::NonFiniteSample`] when a
    /// component is not finite.
    pub fn normalized(&self) -> Result<Self> {
        if !self.is_finite() {
            return Err(Error::NonFiniteSample);
        }
        let largest = self.x.abs().max(self.y.abs()).max(self.z.abs());
        if largest < EPSILON {
            return Err(Error::DegenerateVector);
        }
        // Scale down first so squaring large components cannot overflow
        let scaled = self.scaled(1.0 / largest);
        Ok(scaled.scaled(1.0 / scaled.magnitude()))
    }

    /// Multiply every component by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// True when all components are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_product_of_basis_vectors() {
        assert_eq!(Vector3::X.cross(&Vector3::Y), Vector3::Z);
        assert_eq!(Vector3::Y.cross(&Vector3::Z), Vector3::X);
        assert_eq!(Vector3::Z.cross(&Vector3::X), Vector3::Y);
        assert_eq!(Vector3::Y.cross(&Vector3::X), -Vector3::Z);
    }

    #[test]
    fn test_cross_product_is_orthogonal() {
        let a = Vector3::new(1.5, -2.0, 0.25);
        let b = Vector3::new(-0.5, 3.0, 4.0);
        let c = a.cross(&b);

        assert!(c.dot(&a).abs() < 1e-12);
        assert!(c.dot(&b).abs() < 1e-12);
    }

    #[test]
    fn test_dot_and_magnitude() {
        let v = Vector3::new(3.0, 4.0, 12.0);
        assert_eq!(v.dot(&Vector3::X), 3.0);
        assert_eq!(v.magnitude(), 13.0);
    }

    #[test]
    fn test_normalized() {
        let v = Vector3::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert!((v.magnitude() - 1.0).abs() < 1e-12);
        assert!((v.y - 0.6).abs() < 1e-12);
        assert!((v.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_large_components() {
        let v = Vector3::new(3e300, 4e300, 0.0).normalized().unwrap();
        assert!((v.magnitude() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_zero_vector_is_degenerate() {
        assert!(matches!(Vector3::ZERO.normalized(), Err(Error::DegenerateVector)));
    }

    #[test]
    fn test_normalized_rejects_nan() {
        let v = Vector3::new(f64::NAN, 1.0, 0.0);
        assert!(matches!(v.normalized(), Err(Error::NonFiniteSample)));
    }

    #[test]
    fn test_scaled() {
        let v = Vector3::new(1.0, -2.0, 0.5).scaled(2.0);
        assert_eq!(v, Vector3::new(2.0, -4.0, 1.0));
    }
}
