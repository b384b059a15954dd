//! In-memory register file standing in for the sensor bus in tests.

use crate::bus::{BusAddress, RegisterBus};
use crate::reg_data::accel::AUTO_INCREMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

#[derive(Debug)]
pub struct RegisterFile {
    pub accel: [u8; 0x40],
    pub mag: [u8; 0x40],
    pub writes: Vec<(BusAddress, u8, u8)>,
    /// Fail every transaction once this many have succeeded
    pub fail_after: Option<usize>,
    transactions: usize,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            accel: [0; 0x40],
            mag: [0; 0x40],
            writes: Vec::new(),
            fail_after: None,
            transactions: 0,
        }
    }
}

impl RegisterFile {
    /// Register file whose transactions fail once `n` have succeeded
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }

    fn bank(&mut self, address: BusAddress) -> &mut [u8; 0x40] {
        match address {
            BusAddress::Accelerometer => &mut self.accel,
            BusAddress::Magnetometer => &mut self.mag,
        }
    }

    fn tick(&mut self) -> Result<(), BusFault> {
        if self.fail_after.is_some_and(|n| self.transactions >= n) {
            return Err(BusFault);
        }
        self.transactions += 1;
        Ok(())
    }
}

impl RegisterBus for RegisterFile {
    type Error = BusFault;

    async fn write_register(
        &mut self,
        address: BusAddress,
        register: u8,
        value: u8,
    ) -> Result<(), BusFault> {
        self.tick()?;
        self.writes.push((address, register, value));
        self.bank(address)[register as usize] = value;
        Ok(())
    }

    async fn read_registers(
        &mut self,
        address: BusAddress,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), BusFault> {
        self.tick()?;
        let start = (register & !AUTO_INCREMENT) as usize;
        let bank = self.bank(address);
        buf.copy_from_slice(&bank[start..start + buf.len()]);
        Ok(())
    }
}
