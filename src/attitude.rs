//! Pitch, roll and tilt-compensated heading from one accelerometer and one
//! magnetometer sample.
//!
//! Each cycle:
//! 1. read raw accel + mag samples
//! 2. apply the calibration profile
//! 3. normalise both vectors
//! 4. pitch = asin(a.x), roll = asin(a.y)
//! 5. level the magnetic vector: rotate by -roll about X, then by pitch about Y
//! 6. heading = -atan(v.y / v.x), folded into (-π, π]
//!
//! The estimate is recomputed from scratch every cycle; nothing is filtered
//! or carried over.

use core::f32::consts::PI;

use libm::{asinf, atanf};
use nalgebra::Vector3;

use crate::bus::RegisterBus;
use crate::calibration::CalibrationProfile;
use crate::lsm303::{Lsm303, Lsm303Error};
use crate::reg_data::accel::FullScale;
use crate::vector::{normalize, rotate, rotation_matrix, Axis, MathError};

/// 180 / PI, for conversion to degrees
pub const RAD_TO_DEG: f32 = 180.0 / PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum FusionError {
    /// Accelerometer or magnetometer vector has zero magnitude
    DegenerateVector,

    /// Leveled magnetic vector has no horizontal component
    UndefinedHeading,
}

impl From<MathError> for FusionError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DegenerateVector => Self::DegenerateVector,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AttitudeError<E> {
    Sensor(Lsm303Error<E>),
    Fusion(FusionError),
}

impl<E> From<Lsm303Error<E>> for AttitudeError<E> {
    fn from(err: Lsm303Error<E>) -> Self {
        Self::Sensor(err)
    }
}

impl<E> From<FusionError> for AttitudeError<E> {
    fn from(err: FusionError) -> Self {
        Self::Fusion(err)
    }
}

/// Angle in radians with its whole-degree value, truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Angle {
    pub radians: f32,
    pub degrees: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AttitudeEstimate {
    /// Nose up/down, -π/2 to π/2
    pub pitch: Angle,
    /// Side-to-side tilt, -π/2 to π/2
    pub roll: Angle,
    /// `radians` is counter-clockwise from magnetic north in (-π, π];
    /// `degrees` is the compass bearing, clockwise positive
    pub heading: Angle,
}

impl AttitudeEstimate {
    pub fn from_radians(pitch: f32, roll: f32, heading: f32) -> Self {
        Self {
            pitch: Angle {
                radians: pitch,
                degrees: (pitch * RAD_TO_DEG) as i32,
            },
            roll: Angle {
                radians: roll,
                degrees: (roll * RAD_TO_DEG) as i32,
            },
            heading: Angle {
                radians: heading,
                degrees: (-heading * RAD_TO_DEG) as i32,
            },
        }
    }
}

/// Heading of a gravity-leveled magnetic vector, in (-π, π].
///
/// `x == 0` with `y != 0` resolves to the ±π/2 limit of the arctangent.
pub fn tilt_compensated_heading(leveled: &Vector3<f32>) -> Result<f32, FusionError> {
    if leveled.x == 0.0 && leveled.y == 0.0 {
        return Err(FusionError::UndefinedHeading);
    }
    let heading = -atanf(leveled.y / leveled.x);
    Ok(correct_quadrant(heading, leveled))
}

fn correct_quadrant(heading: f32, v: &Vector3<f32>) -> f32 {
    if v.y < 0.0 {
        if heading < 0.0 {
            PI + heading
        } else {
            heading
        }
    } else if heading > 0.0 {
        heading - PI
    } else if heading == 0.0 && v.x < 0.0 {
        // due south: atan gives 0, neither branch above folds it
        PI
    } else {
        heading
    }
}

/// Fuse calibrated accelerometer and magnetometer vectors.
pub fn fuse(accel: &Vector3<f32>, mag: &Vector3<f32>) -> Result<AttitudeEstimate, FusionError> {
    let ua = normalize(accel)?;
    let uh = normalize(mag)?;

    // rounding can push a unit component just past 1
    let pitch = asinf(ua.x.clamp(-1.0, 1.0));
    let roll = asinf(ua.y.clamp(-1.0, 1.0));

    let v = rotate(&rotation_matrix(Axis::X, -roll), &uh);
    let v = rotate(&rotation_matrix(Axis::Y, pitch), &v);

    let heading = tilt_compensated_heading(&v)?;
    Ok(AttitudeEstimate::from_radians(pitch, roll, heading))
}

/// Owns the sensor, the calibration profile and the latest estimate.
#[derive(Debug)]
pub struct TiltCompass<B> {
    sensor: Lsm303<B>,
    profile: CalibrationProfile,
    estimate: AttitudeEstimate,
}

impl<B, E> TiltCompass<B>
where
    B: RegisterBus<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(sensor: Lsm303<B>, profile: CalibrationProfile) -> Self {
        Self {
            sensor,
            profile,
            estimate: AttitudeEstimate::default(),
        }
    }

    /// Compass with the compiled-in calibration profile
    pub fn with_default_profile(bus: B) -> Self {
        Self::new(Lsm303::new(bus), CalibrationProfile::default())
    }

    /// Apply the default sensor configuration
    pub async fn init(&mut self) -> Result<(), AttitudeError<E>> {
        self.sensor.init().await?;
        Ok(())
    }

    pub fn sensor(&mut self) -> &mut Lsm303<B> {
        &mut self.sensor
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Returns the sensor, consuming the compass.
    pub fn release(self) -> Lsm303<B> {
        self.sensor
    }

    /// Run one acquire-fuse cycle and store the result.
    ///
    /// On error the previous estimate is kept.
    pub async fn compute_attitude(&mut self) -> Result<AttitudeEstimate, AttitudeError<E>> {
        let (accel_raw, ctrl4) = self.sensor.read_accel_raw().await?;
        // offsets are in unshifted LSB, the scale only needs to be valid
        FullScale::try_from(ctrl4).map_err(Lsm303Error::<E>::UnsupportedScale)?;
        let mag_raw = self.sensor.read_mag_raw().await?;

        let accel = self.profile.accel.apply(&accel_raw);
        let mag = self.profile.mag.apply(&mag_raw);

        let estimate = fuse(&accel, &mag).map_err(|err| {
            warn!("attitude fusion failed: {}", err);
            err
        })?;

        trace!(
            "pitch {} roll {} heading {}",
            estimate.pitch.degrees,
            estimate.roll.degrees,
            estimate.heading.degrees
        );
        self.estimate = estimate;
        Ok(estimate)
    }

    /// Entry point for a periodic tick callback
    pub async fn tick(&mut self) -> Result<(), AttitudeError<E>> {
        self.compute_attitude().await.map(|_| ())
    }

    pub fn estimate(&self) -> &AttitudeEstimate {
        &self.estimate
    }

    /// Pitch in whole degrees
    pub fn pitch(&self) -> i32 {
        self.estimate.pitch.degrees
    }

    /// Roll in whole degrees
    pub fn roll(&self) -> i32 {
        self.estimate.roll.degrees
    }

    /// Compass heading in whole degrees
    pub fn heading(&self) -> i32 {
        self.estimate.heading.degrees
    }
}
