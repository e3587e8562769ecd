//! TWI (I2C) register layout

use crate::register::Register;

/// Registers and bit positions of the two-wire interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiLayout {
    /// Bit rate register
    pub twbr: Register,
    /// Control register
    pub twcr: Register,
    /// Status register (status code in bits 7:3, prescaler in bits 1:0)
    pub twsr: Register,
    /// Data register
    pub twdr: Register,
    /// Own slave address register
    pub twar: Register,
    pub bits: TwiBits,
}

/// Bit positions inside TWCR and TWAR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiBits {
    /// Operation complete flag (written 1 to start the next operation)
    pub twint: u8,
    /// Enable acknowledge
    pub twea: u8,
    /// Start condition
    pub twsta: u8,
    /// Stop condition
    pub twsto: u8,
    /// TWI enable
    pub twen: u8,
    /// Interrupt enable
    pub twie: u8,
    /// General call recognition enable (TWAR)
    pub twgce: u8,
}

/// Mask selecting the status code out of TWSR
pub const STATUS_MASK: u8 = 0xF8;
