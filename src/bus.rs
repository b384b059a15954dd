use embedded_hal_async::i2c::I2c;

/// 7-bit bus addresses of the two logical devices inside the LSM303 package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum BusAddress {
    Accelerometer = 0x18,
    Magnetometer = 0x1E,
}

impl BusAddress {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Register-level access to the sensor bus.
///
/// Implemented by the hand-rolled [`Transport`](crate::transport::Transport)
/// and by [`HalBus`] for any `embedded-hal-async` I2C peripheral. Callers
/// must not interleave transactions; one owner drives the bus.
#[allow(async_fn_in_trait)]
pub trait RegisterBus {
    type Error: core::fmt::Debug;

    /// Write a single byte to `register` on the device at `address`.
    async fn write_register(
        &mut self,
        address: BusAddress,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error>;

    /// Read `buf.len()` consecutive bytes starting at `register`.
    async fn read_registers(
        &mut self,
        address: BusAddress,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// [`RegisterBus`] over an `embedded-hal-async` I2C peripheral.
#[derive(Debug)]
pub struct HalBus<I> {
    i2c: I,
}

impl<I> HalBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I, CommE> RegisterBus for HalBus<I>
where
    I: I2c<Error = CommE>,
    CommE: core::fmt::Debug,
{
    type Error = CommE;

    async fn write_register(
        &mut self,
        address: BusAddress,
        register: u8,
        value: u8,
    ) -> Result<(), CommE> {
        let write_buf = [register, value];
        self.i2c.write(address.addr(), &write_buf).await
    }

    async fn read_registers(
        &mut self,
        address: BusAddress,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), CommE> {
        let cmd_buf = [register];
        self.i2c.write_read(address.addr(), &cmd_buf, buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Debug, Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
        reply: Vec<u8>,
    }

    impl ErrorType for RecordingI2c {
        type Error = ErrorKind;
    }

    impl I2c for RecordingI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), ErrorKind> {
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        let n = buf.len().min(self.reply.len());
                        buf[..n].copy_from_slice(&self.reply[..n]);
                    }
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_register_sends_register_then_value() {
        let mut bus = HalBus::new(RecordingI2c::default());
        bus.write_register(BusAddress::Magnetometer, 0x01, 0x20)
            .await
            .unwrap();

        let i2c = bus.release();
        assert_eq!(i2c.writes, vec![(0x1E, vec![0x01, 0x20])]);
    }

    #[tokio::test]
    async fn read_registers_addresses_device_and_fills_buffer() {
        let mut bus = HalBus::new(RecordingI2c {
            reply: vec![0xAA, 0xBB],
            ..Default::default()
        });
        let mut buf = [0u8; 2];
        bus.read_registers(BusAddress::Accelerometer, 0xA8, &mut buf)
            .await
            .unwrap();

        assert_eq!(buf, [0xAA, 0xBB]);
        assert_eq!(bus.release().writes, vec![(0x18, vec![0xA8])]);
    }
}
