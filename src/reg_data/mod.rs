pub mod accel;
pub mod mag;
