#![cfg_attr(not(test), no_std)]

//! Tilt-compensated compass on an LSM303 accelerometer/magnetometer.
//!
//! Layers, leaf to root: [`transport`] (two-wire bus state machine),
//! [`bus`] (register access seam), [`lsm303`] (register model and sample
//! decode), [`calibration`], [`vector`] and [`attitude`].

// must come first so the macros are visible to the other modules
#[macro_use]
mod fmt;

mod bits;

pub mod attitude;
pub mod bus;
pub mod calibration;
pub mod lsm303;
pub mod reg_data;
pub mod transport;
pub mod vector;

#[cfg(test)]
mod mock;

pub use attitude::{Angle, AttitudeError, AttitudeEstimate, FusionError, TiltCompass};
pub use bus::{BusAddress, HalBus, RegisterBus};
pub use calibration::{calibrate, AxisCalibration, CalibrationProfile};
pub use lsm303::{Lsm303, Lsm303Error, RawSample3};
pub use reg_data::accel::{AccelConfig, AccelFilterConfig};
pub use reg_data::mag::MagConfig;
pub use transport::{BusController, BusEvent, Direction, Transport, TransportConfig, TransportError};
pub use vector::{normalize, rotate, rotation_matrix, Axis, MathError, UnitVector3};
