//! Magnetic field device registers.

use crate::bits::get_field;

pub const CRA_REG_M: u8 = 0x00;
pub const CRB_REG_M: u8 = 0x01;
pub const MR_REG_M: u8 = 0x02;
/// First of six output bytes, X/Y/Z high byte first
pub const OUT_X_H_M: u8 = 0x03;

pub const GAIN_FIELD: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum MagDataRate {
    Hz0_75 = 0x00,
    Hz1_5 = 0x04,
    Hz3_0 = 0x08,
    Hz7_5 = 0x0C,
    Hz15 = 0x10,
    Hz30 = 0x14,
    Hz75 = 0x18,
}

/// Bias applied to the sensing elements during measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum MeasurementConfig {
    Normal = 0x00,
    PositiveBias = 0x01,
    NegativeBias = 0x02,
}

/// Field range, which also selects the sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    Ga1_3 = 0x20,
    Ga1_9 = 0x40,
    Ga2_5 = 0x60,
    Ga4_0 = 0x80,
    Ga4_7 = 0xA0,
    Ga5_6 = 0xC0,
    Ga8_1 = 0xE0,
}

impl Gain {
    /// (X/Y, Z) sensitivity in LSB per gauss. The Z element is less sensitive.
    pub const fn sensitivity(self) -> (f32, f32) {
        match self {
            Self::Ga1_3 => (1055.0, 950.0),
            Self::Ga1_9 => (795.0, 710.0),
            Self::Ga2_5 => (635.0, 570.0),
            Self::Ga4_0 => (430.0, 385.0),
            Self::Ga4_7 => (375.0, 335.0),
            Self::Ga5_6 => (320.0, 285.0),
            Self::Ga8_1 => (230.0, 205.0),
        }
    }

    /// (X/Y, Z) scale in milligauss per LSB
    pub fn milligauss_per_lsb(self) -> (f32, f32) {
        let (xy, z) = self.sensitivity();
        (1000.0 / xy, 1000.0 / z)
    }
}

impl TryFrom<u8> for Gain {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match get_field(byte, GAIN_FIELD) {
            0x20 => Ok(Self::Ga1_3),
            0x40 => Ok(Self::Ga1_9),
            0x60 => Ok(Self::Ga2_5),
            0x80 => Ok(Self::Ga4_0),
            0xA0 => Ok(Self::Ga4_7),
            0xC0 => Ok(Self::Ga5_6),
            0xE0 => Ok(Self::Ga8_1),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum MagMode {
    Continuous = 0x00,
    Single = 0x01,
    Sleep = 0x03,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct MagConfig {
    pub data_rate: MagDataRate,
    pub measurement: MeasurementConfig,
    pub gain: Gain,
    pub mode: MagMode,
}

impl MagConfig {
    pub const fn cra(&self) -> u8 {
        self.data_rate as u8 | self.measurement as u8
    }

    pub const fn crb(&self) -> u8 {
        self.gain as u8
    }

    pub const fn mr(&self) -> u8 {
        self.mode as u8
    }
}

impl Default for MagConfig {
    fn default() -> Self {
        Self {
            data_rate: MagDataRate::Hz30,
            measurement: MeasurementConfig::Normal,
            gain: Gain::Ga1_3,
            mode: MagMode::Continuous,
        }
    }
}
