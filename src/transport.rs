//! Two-wire bus transport.
//!
//! Drives a single bus controller through the START / ADDRESS / DATA / STOP
//! sequence, polling the controller's status flags between each step. Every
//! wait is bounded by [`TransportConfig::max_polls`] and surfaces as
//! [`TransportError::Timeout`] instead of hanging.
//!
//! Write:  START, ADDR(w), REG, DATA, STOP
//! Read:   START, ADDR(w), REG, START, ADDR(r), DATA.., STOP
//!
//! On multi-byte reads acknowledgment is disabled and STOP is requested
//! before the final byte is clocked in. Acknowledgment is re-enabled once the
//! read completes.

use crate::bus::{BusAddress, RegisterBus};

/// Transfer direction encoded in the address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Direction {
    Transmitter,
    Receiver,
}

/// Status conditions the transport waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum BusEvent {
    /// Bus-busy flag cleared
    BusFree,
    /// START (or repeated START) generated, controller owns the bus
    ModeSelect,
    /// Address acknowledged for a write
    TransmitterSelected,
    /// Address acknowledged for a read
    ReceiverSelected,
    /// Data byte shifted out and acknowledged
    ByteTransmitted,
    /// Data byte available in the receive register
    ByteReceived,
}

/// Primitive operations of a single two-wire bus controller.
///
/// This is the hardware boundary: implementations poke peripheral registers
/// and never block.
pub trait BusController {
    fn generate_start(&mut self);
    fn generate_stop(&mut self);
    fn send_address(&mut self, address: u8, direction: Direction);
    fn send_byte(&mut self, byte: u8);
    fn receive_byte(&mut self) -> u8;
    fn set_acknowledge(&mut self, enable: bool);
    fn is_busy(&mut self) -> bool;
    /// True once `event` has been observed. Reading the event clears it.
    fn check_event(&mut self, event: BusEvent) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum TransportError {
    /// The expected status condition never arrived
    Timeout(BusEvent),
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TransportConfig {
    /// Number of status polls before a wait is abandoned
    pub max_polls: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { max_polls: 100_000 }
    }
}

/// Blocking, non-reentrant transport over one [`BusController`].
#[derive(Debug)]
pub struct Transport<C> {
    controller: C,
    config: TransportConfig,
}

impl<C> Transport<C>
where
    C: BusController,
{
    pub fn new(controller: C) -> Self {
        Self::with_config(controller, TransportConfig::default())
    }

    pub fn with_config(controller: C, config: TransportConfig) -> Self {
        Self { controller, config }
    }

    /// Returns the underlying controller, consuming the transport.
    pub fn release(self) -> C {
        self.controller
    }

    /// Write one byte to a device register.
    pub fn write_register(
        &mut self,
        address: BusAddress,
        register: u8,
        value: u8,
    ) -> Result<(), TransportError> {
        let result = self.write_sequence(address.addr(), register, value);
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Read `buf.len()` bytes starting at `register`.
    pub fn read_registers(
        &mut self,
        address: BusAddress,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        if buf.is_empty() {
            return Ok(());
        }
        // nothing to release until START goes out
        self.wait_for(BusEvent::BusFree)?;

        let result = self.read_sequence(address.addr(), register, buf);
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn write_sequence(&mut self, addr: u8, register: u8, value: u8) -> Result<(), TransportError> {
        self.controller.generate_start();
        self.wait_for(BusEvent::ModeSelect)?;

        self.controller.send_address(addr, Direction::Transmitter);
        self.wait_for(BusEvent::TransmitterSelected)?;

        self.controller.send_byte(register);
        self.wait_for(BusEvent::ByteTransmitted)?;

        self.controller.send_byte(value);
        self.wait_for(BusEvent::ByteTransmitted)?;

        self.controller.generate_stop();
        Ok(())
    }

    fn read_sequence(
        &mut self,
        addr: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        self.controller.generate_start();
        self.wait_for(BusEvent::ModeSelect)?;

        self.controller.send_address(addr, Direction::Transmitter);
        self.wait_for(BusEvent::TransmitterSelected)?;

        self.controller.send_byte(register);
        self.wait_for(BusEvent::ByteTransmitted)?;

        // repeated start, switch to receive
        self.controller.generate_start();
        self.wait_for(BusEvent::ModeSelect)?;

        self.controller.send_address(addr, Direction::Receiver);
        self.wait_for(BusEvent::ReceiverSelected)?;

        let last = buf.len() - 1;
        for (idx, slot) in buf.iter_mut().enumerate() {
            if idx == last {
                // NACK + STOP must be armed before the final byte arrives
                self.controller.set_acknowledge(false);
                self.controller.generate_stop();
            }
            self.wait_for(BusEvent::ByteReceived)?;
            *slot = self.controller.receive_byte();
        }

        self.controller.set_acknowledge(true);
        Ok(())
    }

    fn wait_for(&mut self, event: BusEvent) -> Result<(), TransportError> {
        for _ in 0..self.config.max_polls {
            let reached = match event {
                BusEvent::BusFree => !self.controller.is_busy(),
                other => self.controller.check_event(other),
            };
            if reached {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        warn!("bus timeout waiting for {}", event);
        Err(TransportError::Timeout(event))
    }

    /// Release the bus after a failed transaction.
    fn abort(&mut self) {
        self.controller.generate_stop();
        self.controller.set_acknowledge(true);
    }
}

impl<C> RegisterBus for Transport<C>
where
    C: BusController,
{
    type Error = TransportError;

    async fn write_register(
        &mut self,
        address: BusAddress,
        register: u8,
        value: u8,
    ) -> Result<(), TransportError> {
        Transport::write_register(self, address, register, value)
    }

    async fn read_registers(
        &mut self,
        address: BusAddress,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        Transport::read_registers(self, address, register, buf)
    }
}
