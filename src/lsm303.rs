//! LSM303 accelerometer + magnetometer driver.
//!
//! Both logical devices share one [`RegisterBus`]. Configuration writes are
//! independent single-byte writes: a failure part way through leaves the
//! device partially configured and is reported to the caller without
//! rollback.

use nalgebra::Vector3;

use crate::bits;
use crate::bus::{BusAddress, RegisterBus};
use crate::reg_data::accel::*;
use crate::reg_data::mag::*;

/// Signed X/Y/Z sample as produced by the device.
pub type RawSample3 = Vector3<i16>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Lsm303Error<E> {
    /// Bus transaction failed
    Bus(E),

    /// Accelerometer full-scale bits hold the reserved encoding
    UnsupportedScale(u8),

    /// Magnetometer gain bits hold no valid setting
    UnsupportedGain(u8),

    /// A read-back register holds a reserved bit pattern
    InvalidRegister { register: u8, value: u8 },
}

/// Handles all operations on/with the LSM303
#[derive(Debug)]
pub struct Lsm303<B> {
    bus: B,
}

impl<B, E> Lsm303<B>
where
    B: RegisterBus<Error = E>,
    E: core::fmt::Debug,
{
    /// Side effect free constructor
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Returns the underlying bus, consuming the driver.
    pub fn release(self) -> B {
        self.bus
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Apply the default accelerometer, filter and magnetometer settings
    pub async fn init(&mut self) -> Result<(), Lsm303Error<E>> {
        self.configure_accel(AccelConfig::default()).await?;
        self.configure_accel_filter(AccelFilterConfig::default())
            .await?;
        self.configure_mag(MagConfig::default()).await?;
        info!("lsm303 configured");
        Ok(())
    }

    pub async fn configure_accel(&mut self, config: AccelConfig) -> Result<(), Lsm303Error<E>> {
        let ctrl1 = config.ctrl_reg1();
        let ctrl4 = config.ctrl_reg4();
        debug!("accel config: ctrl1 {=u8:#x} ctrl4 {=u8:#x}", ctrl1, ctrl4);

        self.write_reg(BusAddress::Accelerometer, CTRL_REG1_A, ctrl1)
            .await?;
        self.write_reg(BusAddress::Accelerometer, CTRL_REG4_A, ctrl4)
            .await
    }

    /// Configure the internal high-pass filter of the accelerometer
    pub async fn configure_accel_filter(
        &mut self,
        filter: AccelFilterConfig,
    ) -> Result<(), Lsm303Error<E>> {
        let ctrl2 = filter.ctrl_reg2();
        debug!("accel filter: ctrl2 {=u8:#x} ref {=u8}", ctrl2, filter.reference);

        self.write_reg(BusAddress::Accelerometer, CTRL_REG2_A, ctrl2)
            .await?;
        self.write_reg(BusAddress::Accelerometer, REFERENCE_A, filter.reference)
            .await
    }

    pub async fn configure_mag(&mut self, config: MagConfig) -> Result<(), Lsm303Error<E>> {
        debug!(
            "mag config: cra {=u8:#x} crb {=u8:#x} mr {=u8:#x}",
            config.cra(),
            config.crb(),
            config.mr()
        );

        self.write_reg(BusAddress::Magnetometer, CRA_REG_M, config.cra())
            .await?;
        self.write_reg(BusAddress::Magnetometer, CRB_REG_M, config.crb())
            .await?;
        self.write_reg(BusAddress::Magnetometer, MR_REG_M, config.mr())
            .await
    }

    /// Change the power mode, keeping data rate and axis enables
    pub async fn set_accel_power_mode(&mut self, mode: PowerMode) -> Result<(), Lsm303Error<E>> {
        self.modify_reg(
            BusAddress::Accelerometer,
            CTRL_REG1_A,
            POWER_MODE_FIELD,
            mode as u8,
        )
        .await
    }

    pub async fn accel_power_mode(&mut self) -> Result<PowerMode, Lsm303Error<E>> {
        let ctrl1 = self.read_reg(BusAddress::Accelerometer, CTRL_REG1_A).await?;
        PowerMode::try_from(ctrl1).map_err(|_| Lsm303Error::InvalidRegister {
            register: CTRL_REG1_A,
            value: ctrl1,
        })
    }

    /// Change the output data rate, keeping power mode and axis enables
    pub async fn set_accel_data_rate(&mut self, rate: DataRate) -> Result<(), Lsm303Error<E>> {
        self.modify_reg(
            BusAddress::Accelerometer,
            CTRL_REG1_A,
            DATA_RATE_FIELD,
            rate as u8,
        )
        .await
    }

    pub async fn set_accel_full_scale(&mut self, scale: FullScale) -> Result<(), Lsm303Error<E>> {
        self.modify_reg(
            BusAddress::Accelerometer,
            CTRL_REG4_A,
            FULL_SCALE_FIELD,
            scale as u8,
        )
        .await
    }

    /// get current accel full scale
    pub async fn accel_full_scale(&mut self) -> Result<FullScale, Lsm303Error<E>> {
        let ctrl4 = self.read_reg(BusAddress::Accelerometer, CTRL_REG4_A).await?;
        FullScale::try_from(ctrl4).map_err(Lsm303Error::UnsupportedScale)
    }

    /// Reload the trimming parameters from internal memory
    pub async fn reboot_accel(&mut self) -> Result<(), Lsm303Error<E>> {
        let ctrl2 = self.read_reg(BusAddress::Accelerometer, CTRL_REG2_A).await?;
        debug!("accel reboot");
        self.write_reg(
            BusAddress::Accelerometer,
            CTRL_REG2_A,
            bits::set_bits(ctrl2, BOOT),
        )
        .await
    }

    /// get current mag gain
    pub async fn mag_gain(&mut self) -> Result<Gain, Lsm303Error<E>> {
        let crb = self.read_reg(BusAddress::Magnetometer, CRB_REG_M).await?;
        Gain::try_from(crb).map_err(Lsm303Error::UnsupportedGain)
    }

    /// The six accelerometer output bytes, X low byte first
    pub async fn read_accel_output_registers(&mut self) -> Result<[u8; 6], Lsm303Error<E>> {
        let mut buf = [0u8; 6];
        self.read_block(
            BusAddress::Accelerometer,
            OUT_X_L_A | AUTO_INCREMENT,
            &mut buf,
        )
        .await?;
        Ok(buf)
    }

    /// Raw acceleration sample together with the CTRL_REG4_A value used to
    /// decode it, so the caller can derive the full scale without another
    /// transaction.
    pub async fn read_accel_raw(&mut self) -> Result<(RawSample3, u8), Lsm303Error<E>> {
        let ctrl4 = self.read_reg(BusAddress::Accelerometer, CTRL_REG4_A).await?;
        let buf = self.read_accel_output_registers().await?;
        Ok((decode_accel(&buf, ctrl4), ctrl4))
    }

    /// Acceleration normalised to the ±2 g resolution (1 g = 16384 at ±2 g).
    pub async fn read_acceleration(&mut self) -> Result<RawSample3, Lsm303Error<E>> {
        let (raw, ctrl4) = self.read_accel_raw().await?;
        let scale = FullScale::try_from(ctrl4).map_err(Lsm303Error::UnsupportedScale)?;
        let shift = scale.sensitivity_shift();
        Ok(raw.map(|v| v << shift))
    }

    pub async fn read_mag_raw(&mut self) -> Result<RawSample3, Lsm303Error<E>> {
        let mut buf = [0u8; 6];
        self.read_block(BusAddress::Magnetometer, OUT_X_H_M, &mut buf)
            .await?;
        Ok(decode_mag(&buf))
    }

    /// Magnetic field in milligauss, scaled by the active gain
    pub async fn read_magnetic_field(&mut self) -> Result<Vector3<f32>, Lsm303Error<E>> {
        let gain = self.mag_gain().await?;
        let raw = self.read_mag_raw().await?;
        let (xy, z) = gain.milligauss_per_lsb();

        Ok(Vector3::new(
            raw.x as f32 * xy,
            raw.y as f32 * xy,
            raw.z as f32 * z,
        ))
    }

    async fn write_reg(
        &mut self,
        address: BusAddress,
        reg: u8,
        val: u8,
    ) -> Result<(), Lsm303Error<E>> {
        self.bus
            .write_register(address, reg, val)
            .await
            .map_err(Lsm303Error::Bus)
    }

    async fn read_block(
        &mut self,
        address: BusAddress,
        reg: u8,
        recv_buf: &mut [u8],
    ) -> Result<(), Lsm303Error<E>> {
        self.bus
            .read_registers(address, reg, recv_buf)
            .await
            .map_err(Lsm303Error::Bus)
    }

    async fn read_reg(&mut self, address: BusAddress, reg: u8) -> Result<u8, Lsm303Error<E>> {
        let mut buf = [0u8; 1];
        self.read_block(address, reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Read-modify-write of one bit field, other bits preserved
    async fn modify_reg(
        &mut self,
        address: BusAddress,
        reg: u8,
        field: u8,
        value: u8,
    ) -> Result<(), Lsm303Error<E>> {
        let current = self.read_reg(address, reg).await?;
        let updated = bits::replace_field(current, field, value);
        debug!("modify reg {=u8:#x}: {=u8:#x} -> {=u8:#x}", reg, current, updated);
        self.write_reg(address, reg, updated).await
    }
}

/// Decode the accelerometer output bytes according to the BLE bit of
/// CTRL_REG4_A.
///
/// Little endian: `(b0 << 8 | b1)` holds a 12-bit sample in the upper bits
/// and is arithmetically shifted right by 4. Big endian: `(b1 << 8 | b0)` is
/// taken as-is.
pub fn decode_accel(buf: &[u8; 6], ctrl4: u8) -> RawSample3 {
    let word = |idx: usize| match Endianness::from(ctrl4) {
        Endianness::Big => i16::from_le_bytes([buf[idx], buf[idx + 1]]),
        Endianness::Little => i16::from_be_bytes([buf[idx], buf[idx + 1]]) >> 4,
    };
    Vector3::new(word(0), word(2), word(4))
}

/// Combine high and low bytes of each mag axis
pub fn decode_mag(buf: &[u8; 6]) -> RawSample3 {
    let word = |idx: usize| i16::from_be_bytes([buf[idx], buf[idx + 1]]);
    Vector3::new(word(0), word(2), word(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BusFault, RegisterFile};

    #[test]
    fn big_endian_decode_takes_words_unshifted() {
        let buf = [0x10, 0x00, 0x20, 0x00, 0x30, 0x00];
        assert_eq!(decode_accel(&buf, BLE), Vector3::new(0x0010, 0x0020, 0x0030));
    }

    #[test]
    fn little_endian_decode_shifts_out_padding() {
        let buf = [0x10, 0x00, 0x20, 0x00, 0x30, 0x00];
        assert_eq!(decode_accel(&buf, 0x00), Vector3::new(0x0100, 0x0200, 0x0300));
    }

    #[test]
    fn right_aligned_shift_keeps_sign() {
        let buf = [0xFF, 0xF0, 0x80, 0x00, 0x7F, 0xF0];
        assert_eq!(decode_accel(&buf, 0x00), Vector3::new(-1, -2048, 2047));
    }

    #[test]
    fn mag_decode_is_high_byte_first() {
        let buf = [0x01, 0x02, 0xFF, 0xFE, 0x00, 0x10];
        assert_eq!(decode_mag(&buf), Vector3::new(0x0102, -2, 0x0010));
    }

    #[tokio::test]
    async fn init_writes_bring_up_configuration() {
        let mut sensor = Lsm303::new(RegisterFile::default());
        sensor.init().await.unwrap();

        let bus = sensor.release();
        assert_eq!(
            bus.writes,
            vec![
                (BusAddress::Accelerometer, CTRL_REG1_A, 0x27),
                (BusAddress::Accelerometer, CTRL_REG4_A, 0x40),
                (BusAddress::Accelerometer, CTRL_REG2_A, 0x00),
                (BusAddress::Accelerometer, REFERENCE_A, 0x00),
                (BusAddress::Magnetometer, CRA_REG_M, 0x14),
                (BusAddress::Magnetometer, CRB_REG_M, 0x20),
                (BusAddress::Magnetometer, MR_REG_M, 0x00),
            ]
        );
    }

    #[tokio::test]
    async fn failed_write_leaves_partial_configuration() {
        let mut sensor = Lsm303::new(RegisterFile::failing_after(1));

        let err = sensor.configure_mag(MagConfig::default()).await.unwrap_err();
        assert_eq!(err, Lsm303Error::Bus(BusFault));

        let bus = sensor.release();
        assert_eq!(bus.writes, vec![(BusAddress::Magnetometer, CRA_REG_M, 0x14)]);
    }

    #[tokio::test]
    async fn power_mode_change_preserves_rate_and_axes() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG1_A as usize] = 0x3F;
        let mut sensor = Lsm303::new(bus);

        sensor.set_accel_power_mode(PowerMode::LowPower5Hz).await.unwrap();
        assert_eq!(sensor.accel_power_mode().await.unwrap(), PowerMode::LowPower5Hz);
        assert_eq!(sensor.release().accel[CTRL_REG1_A as usize], 0xBF);
    }

    #[tokio::test]
    async fn data_rate_change_preserves_power_and_axes() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG1_A as usize] = 0x27;
        let mut sensor = Lsm303::new(bus);

        sensor.set_accel_data_rate(DataRate::Hz1000).await.unwrap();
        assert_eq!(sensor.release().accel[CTRL_REG1_A as usize], 0x3F);
    }

    #[tokio::test]
    async fn full_scale_change_preserves_bdu_and_endianness() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG4_A as usize] = 0xC0;
        let mut sensor = Lsm303::new(bus);

        sensor.set_accel_full_scale(FullScale::G8).await.unwrap();
        assert_eq!(sensor.accel_full_scale().await.unwrap(), FullScale::G8);
        assert_eq!(sensor.release().accel[CTRL_REG4_A as usize], 0xF0);
    }

    #[tokio::test]
    async fn reboot_sets_boot_bit_only() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG2_A as usize] = 0x13;
        let mut sensor = Lsm303::new(bus);

        sensor.reboot_accel().await.unwrap();
        assert_eq!(sensor.release().accel[CTRL_REG2_A as usize], 0x93);
    }

    #[tokio::test]
    async fn reserved_power_mode_reads_back_as_invalid() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG1_A as usize] = 0xE7;
        let mut sensor = Lsm303::new(bus);

        assert_eq!(
            sensor.accel_power_mode().await,
            Err(Lsm303Error::InvalidRegister {
                register: CTRL_REG1_A,
                value: 0xE7
            })
        );
    }

    #[tokio::test]
    async fn raw_read_reports_control_register() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG4_A as usize] = BLE | 0x10;
        bus.accel[OUT_X_L_A as usize..OUT_X_L_A as usize + 6]
            .copy_from_slice(&[0x00, 0x40, 0x00, 0x00, 0x00, 0xC0]);
        let mut sensor = Lsm303::new(bus);

        let (raw, ctrl4) = sensor.read_accel_raw().await.unwrap();
        assert_eq!(raw, Vector3::new(0x4000, 0, -0x4000));
        assert_eq!(ctrl4, BLE | 0x10);
    }

    #[tokio::test]
    async fn acceleration_is_shifted_by_full_scale() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG4_A as usize] = BLE | FullScale::G8 as u8;
        bus.accel[OUT_X_L_A as usize..OUT_X_L_A as usize + 6]
            .copy_from_slice(&[0x00, 0x01, 0xFF, 0xFF, 0x10, 0x00]);
        let mut sensor = Lsm303::new(bus);

        let acc = sensor.read_acceleration().await.unwrap();
        assert_eq!(acc, Vector3::new(0x0400, -4, 0x0040));
    }

    #[tokio::test]
    async fn reserved_full_scale_is_reported() {
        let mut bus = RegisterFile::default();
        bus.accel[CTRL_REG4_A as usize] = 0x20;
        let mut sensor = Lsm303::new(bus);

        assert_eq!(
            sensor.read_acceleration().await,
            Err(Lsm303Error::UnsupportedScale(0x20))
        );
    }

    #[tokio::test]
    async fn magnetic_field_uses_separate_z_sensitivity() {
        let mut bus = RegisterFile::default();
        bus.mag[CRB_REG_M as usize] = Gain::Ga1_3 as u8;
        bus.mag[OUT_X_H_M as usize..OUT_X_H_M as usize + 6]
            .copy_from_slice(&[0x04, 0x1F, 0xFB, 0xE1, 0x03, 0xB6]);
        let mut sensor = Lsm303::new(bus);

        let field = sensor.read_magnetic_field().await.unwrap();
        assert!((field.x - 1000.0).abs() < 0.01);
        assert!((field.y + 1000.0).abs() < 0.01);
        assert!((field.z - 1000.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn cleared_gain_is_reported() {
        let mut sensor = Lsm303::new(RegisterFile::default());
        assert_eq!(
            sensor.read_magnetic_field().await,
            Err(Lsm303Error::UnsupportedGain(0x00))
        );
    }
}
