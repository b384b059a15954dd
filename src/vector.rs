//! Vector normalisation and principal-axis rotation.

use libm::{cosf, sinf, sqrtf};
use nalgebra::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum MathError {
    /// Zero-magnitude (or non-finite) vector cannot be normalised
    DegenerateVector,
}

/// Principal axes the tilt compensation rotates about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
}

/// Vector of unit length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitVector3(Vector3<f32>);

impl core::ops::Deref for UnitVector3 {
    type Target = Vector3<f32>;

    fn deref(&self) -> &Vector3<f32> {
        &self.0
    }
}

pub fn magnitude(v: &Vector3<f32>) -> f32 {
    sqrtf(v.dot(v))
}

pub fn normalize(v: &Vector3<f32>) -> Result<UnitVector3, MathError> {
    let norm = magnitude(v);
    if !norm.is_finite() || norm <= 0.0 {
        return Err(MathError::DegenerateVector);
    }
    Ok(UnitVector3(v / norm))
}

/// Right-handed rotation of `angle` radians about `axis`
pub fn rotation_matrix(axis: Axis, angle: f32) -> Matrix3<f32> {
    let (s, c) = (sinf(angle), cosf(angle));
    match axis {
        #[rustfmt::skip]
        Axis::X => Matrix3::new(
            1.0, 0.0, 0.0,
            0.0,   c,  -s,
            0.0,   s,   c,
        ),
        #[rustfmt::skip]
        Axis::Y => Matrix3::new(
              c, 0.0,   s,
            0.0, 1.0, 0.0,
             -s, 0.0,   c,
        ),
    }
}

pub fn rotate(matrix: &Matrix3<f32>, v: &Vector3<f32>) -> Vector3<f32> {
    matrix * v
}
