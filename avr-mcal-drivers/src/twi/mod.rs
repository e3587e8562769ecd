//! TWI (I2C) master driver
//!
//! The primitives ([`Twi::start`], [`Twi::write`], [`Twi::read_with_ack`], ...)
//! mirror the hardware operations one to one and leave checking the status to
//! the caller. The `*_checked` variants pair each primitive with the
//! [`Phase`] it should have reached and return a [`BusError`] otherwise.
//!
//! There are no retries and no timeouts. A stop is never waited for.

mod hal;
mod status;

pub use status::{BusError, Phase, Status};

use avr_mcal_hal::register::bit;
use avr_mcal_hal::twi::STATUS_MASK;
use avr_mcal_hal::{wait_until_set, RegisterFile, TwiLayout};

/// SCL frequency tier
///
/// The bit-rate settings are calibrated for an 8 MHz CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    Low10k,
    Standard100k,
    Fast400k,
}

impl BusSpeed {
    /// (TWBR, TWPS) pair for this tier
    pub const fn bit_rate(self) -> (u8, u8) {
        match self {
            BusSpeed::Low10k => (98, 1),
            BusSpeed::Standard100k => (8, 1),
            BusSpeed::Fast400k => (2, 0),
        }
    }

    pub const fn hz(self) -> u32 {
        match self {
            BusSpeed::Low10k => 10_000,
            BusSpeed::Standard100k => 100_000,
            BusSpeed::Fast400k => 400_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiConfig {
    pub speed: BusSpeed,
    /// 7-bit address this node answers to as a slave
    pub own_address: u8,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self {
            speed: BusSpeed::Standard100k,
            own_address: 0x01,
        }
    }
}

/// TWI master
pub struct Twi<R> {
    regs: R,
    layout: TwiLayout,
    config: TwiConfig,
}

impl<R: RegisterFile> Twi<R> {
    /// Enable the TWI, program the bit rate and own address
    ///
    /// General-call recognition is switched on along with the own address.
    pub fn new(mut regs: R, layout: TwiLayout, config: TwiConfig) -> Self {
        let b = layout.bits;
        let (twbr, twps) = config.speed.bit_rate();

        regs.write(layout.twcr, bit(b.twen));
        regs.write(layout.twbr, twbr);
        regs.write(layout.twsr, twps);
        debug_assert!(config.own_address <= 0x7F, "own address is 7 bits");
        regs.write(layout.twar, ((config.own_address & 0x7F) << 1) | bit(b.twgce));

        debug!(
            "twi: {=u32} Hz, twbr {=u8}, twps {=u8}",
            config.speed.hz(),
            twbr,
            twps
        );

        Self {
            regs,
            layout,
            config,
        }
    }

    /// Start the operation selected by `flags` and wait for TWINT
    fn operate(&mut self, flags: u8) {
        let b = self.layout.bits;
        self.regs.write(self.layout.twcr, bit(b.twint) | bit(b.twen) | flags);
        wait_until_set(&mut self.regs, self.layout.twcr, b.twint);
    }

    /// Send a start (or repeated start) condition
    pub fn start(&mut self) {
        self.operate(bit(self.layout.bits.twsta));
    }

    /// Send a stop condition without waiting for it to complete
    pub fn stop(&mut self) {
        let b = self.layout.bits;
        self.regs.write(self.layout.twcr, bit(b.twint) | bit(b.twen) | bit(b.twsto));
    }

    /// Clock out one byte (address or data)
    pub fn write(&mut self, byte: u8) {
        self.regs.write(self.layout.twdr, byte);
        self.operate(0);
    }

    /// Clock in one byte and acknowledge it
    pub fn read_with_ack(&mut self) -> u8 {
        self.operate(bit(self.layout.bits.twea));
        self.regs.read(self.layout.twdr)
    }

    /// Clock in one byte without acknowledging it (last byte of a read)
    pub fn read_with_nack(&mut self) -> u8 {
        self.operate(0);
        self.regs.read(self.layout.twdr)
    }

    /// Status code of the last operation (prescaler bits masked off)
    pub fn status(&self) -> u8 {
        self.regs.read(self.layout.twsr) & STATUS_MASK
    }

    /// Compare the live status against what `phase` expects
    pub fn expect(&self, phase: Phase) -> Result<(), BusError> {
        let result = phase.check(self.status());
        if let Err(e) = result {
            warn!(
                "twi: {} expected {=u8:#x}, got {=u8:#x}",
                phase,
                phase.expected().code(),
                e.status
            );
        }
        result
    }

    /// Start, then check for START or REPEATED START
    pub fn start_checked(&mut self, repeated: bool) -> Result<(), BusError> {
        self.start();
        self.expect(if repeated {
            Phase::RepeatedStart
        } else {
            Phase::Start
        })
    }

    /// Send SLA+R or SLA+W for a 7-bit address and check the ACK
    ///
    /// Bit 7 of `address` is not part of a 7-bit address and is ignored.
    pub fn address(&mut self, address: u8, read: bool) -> Result<(), BusError> {
        debug_assert!(address <= 0x7F, "TWI address is 7 bits");
        self.write_checked(
            sla(address, read),
            if read {
                Phase::AddressRead
            } else {
                Phase::AddressWrite
            },
        )
    }

    /// Write a byte and check the status `phase` calls for
    pub fn write_checked(&mut self, byte: u8, phase: Phase) -> Result<(), BusError> {
        self.write(byte);
        self.expect(phase)
    }

    /// Read a byte with or without ACK and check the matching status
    pub fn read_checked(&mut self, ack: bool) -> Result<u8, BusError> {
        if ack {
            let byte = self.read_with_ack();
            self.expect(Phase::DataReadAck).map(|_| byte)
        } else {
            let byte = self.read_with_nack();
            self.expect(Phase::DataReadNack).map(|_| byte)
        }
    }

    pub fn config(&self) -> &TwiConfig {
        &self.config
    }

    /// Give the register file back
    pub fn release(self) -> R {
        self.regs
    }
}

/// SLA+R/W byte for a 7-bit address
const fn sla(address: u8, read: bool) -> u8 {
    ((address & 0x7F) << 1) | read as u8
}
