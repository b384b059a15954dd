//! Linear acceleration device registers.
//!
//! Enum discriminants are the field bits in place, so a control byte is the
//! OR of its option values.

use crate::bits::get_field;

pub const CTRL_REG1_A: u8 = 0x20;
pub const CTRL_REG2_A: u8 = 0x21;
pub const CTRL_REG4_A: u8 = 0x23;
pub const REFERENCE_A: u8 = 0x26;
pub const OUT_X_L_A: u8 = 0x28;

/// Sub-address MSB, enables register auto-increment on multi-byte reads
pub const AUTO_INCREMENT: u8 = 0x80;

// CTRL_REG1_A
pub const POWER_MODE_FIELD: u8 = 0xE0;
pub const DATA_RATE_FIELD: u8 = 0x18;

// CTRL_REG2_A
pub const BOOT: u8 = 0x80;
pub const HPF_ENABLE: u8 = 0x10;

// CTRL_REG4_A
pub const BDU: u8 = 0x80;
pub const BLE: u8 = 0x40;
pub const FULL_SCALE_FIELD: u8 = 0x30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerMode {
    PowerDown = 0x00,
    Normal = 0x20,
    LowPower0_5Hz = 0x40,
    LowPower1Hz = 0x60,
    LowPower2Hz = 0x80,
    LowPower5Hz = 0xA0,
    LowPower10Hz = 0xC0,
}

impl TryFrom<u8> for PowerMode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match get_field(byte, POWER_MODE_FIELD) {
            0x00 => Ok(Self::PowerDown),
            0x20 => Ok(Self::Normal),
            0x40 => Ok(Self::LowPower0_5Hz),
            0x60 => Ok(Self::LowPower1Hz),
            0x80 => Ok(Self::LowPower2Hz),
            0xA0 => Ok(Self::LowPower5Hz),
            0xC0 => Ok(Self::LowPower10Hz),
            other => Err(other),
        }
    }
}

/// Output data rate in normal power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    Hz50 = 0x00,
    Hz100 = 0x08,
    Hz400 = 0x10,
    Hz1000 = 0x18,
}

impl From<u8> for DataRate {
    fn from(byte: u8) -> Self {
        match get_field(byte, DATA_RATE_FIELD) {
            0x00 => Self::Hz50,
            0x08 => Self::Hz100,
            0x10 => Self::Hz400,
            _ => Self::Hz1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AxesEnable {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxesEnable {
    pub const XYZ: Self = Self {
        x: true,
        y: true,
        z: true,
    };

    pub const fn bits(self) -> u8 {
        (self.z as u8) << 2 | (self.y as u8) << 1 | self.x as u8
    }
}

/// Measurement range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum FullScale {
    G2 = 0x00,
    G4 = 0x10,
    G8 = 0x30,
}

impl FullScale {
    /// Left shift that brings a decoded sample to the ±2 g resolution
    pub const fn sensitivity_shift(self) -> u32 {
        match self {
            Self::G2 => 0,
            Self::G4 => 1,
            Self::G8 => 2,
        }
    }
}

impl TryFrom<u8> for FullScale {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match get_field(byte, FULL_SCALE_FIELD) {
            0x00 => Ok(Self::G2),
            0x10 => Ok(Self::G4),
            0x30 => Ok(Self::G8),
            other => Err(other),
        }
    }
}

/// Output register update policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum DataUpdate {
    Continuous = 0x00,
    /// Latch until both bytes of a sample have been read
    Blocking = BDU,
}

/// Byte order of the output registers.
///
/// `Little` yields right-aligned 12-bit samples; `Big` is decoded as a
/// left-aligned word without shifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Endianness {
    Little = 0x00,
    Big = BLE,
}

impl From<u8> for Endianness {
    fn from(ctrl4: u8) -> Self {
        if get_field(ctrl4, BLE) != 0 {
            Self::Big
        } else {
            Self::Little
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AccelConfig {
    pub power_mode: PowerMode,
    pub data_rate: DataRate,
    pub axes: AxesEnable,
    pub full_scale: FullScale,
    pub data_update: DataUpdate,
    pub endianness: Endianness,
}

impl AccelConfig {
    pub const fn ctrl_reg1(&self) -> u8 {
        self.power_mode as u8 | self.data_rate as u8 | self.axes.bits()
    }

    pub const fn ctrl_reg4(&self) -> u8 {
        self.full_scale as u8 | self.data_update as u8 | self.endianness as u8
    }
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            power_mode: PowerMode::Normal,
            data_rate: DataRate::Hz50,
            axes: AxesEnable::XYZ,
            full_scale: FullScale::G2,
            data_update: DataUpdate::Continuous,
            // left-aligned, the unit the compiled-in calibration offsets use
            endianness: Endianness::Big,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum HpfMode {
    Normal = 0x00,
    Reference = 0x20,
}

/// High-pass cut-off, as a divider of the output data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum HpfCutoff {
    Hpc8 = 0x00,
    Hpc16 = 0x01,
    Hpc32 = 0x02,
    Hpc64 = 0x03,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AccelFilterConfig {
    pub enabled: bool,
    pub mode: HpfMode,
    pub cutoff: HpfCutoff,
    /// Reference value used in `HpfMode::Reference`
    pub reference: u8,
}

impl AccelFilterConfig {
    pub const fn ctrl_reg2(&self) -> u8 {
        let enable = if self.enabled { HPF_ENABLE } else { 0 };
        enable | self.mode as u8 | self.cutoff as u8
    }
}

impl Default for AccelFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: HpfMode::Normal,
            cutoff: HpfCutoff::Hpc8,
            reference: 0x00,
        }
    }
}
