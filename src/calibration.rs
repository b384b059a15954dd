//! Fixed per-axis offset and gain correction.
//!
//! The profile is compiled in and never changes at runtime.

use nalgebra::Vector3;

use crate::lsm303::RawSample3;

/// Offset (raw LSB) and gain for the three axes of one device
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AxisCalibration {
    pub offset: [i32; 3],
    pub gain: [f32; 3],
}

impl AxisCalibration {
    /// Zero offsets, unit gains
    pub const IDENTITY: Self = Self {
        offset: [0; 3],
        gain: [1.0; 3],
    };

    /// `(raw - offset) * gain` per axis
    pub fn apply(&self, raw: &RawSample3) -> Vector3<f32> {
        let axis = |i: usize| (i32::from(raw[i]) - self.offset[i]) as f32 * self.gain[i];
        Vector3::new(axis(0), axis(1), axis(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct CalibrationProfile {
    pub accel: AxisCalibration,
    pub mag: AxisCalibration,
}

impl CalibrationProfile {
    pub const IDENTITY: Self = Self {
        accel: AxisCalibration::IDENTITY,
        mag: AxisCalibration::IDENTITY,
    };
}

impl Default for CalibrationProfile {
    /// Values measured on the reference board
    fn default() -> Self {
        Self {
            accel: AxisCalibration {
                offset: [-19, -30, 44],
                gain: [0.9671, 0.9804, 0.9671],
            },
            mag: AxisCalibration {
                offset: [-146, 8, 6],
                gain: [2.8248, 2.8777, 3.3956],
            },
        }
    }
}

pub fn calibrate(raw: &RawSample3, calibration: &AxisCalibration) -> Vector3<f32> {
    calibration.apply(raw)
}
