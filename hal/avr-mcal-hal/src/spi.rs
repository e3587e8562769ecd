//! SPI register layout

use crate::register::Register;

/// Registers, bit positions and pins of one SPI block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiLayout {
    /// Control register
    pub spcr: Register,
    /// Status register
    pub spsr: Register,
    /// Data register
    pub spdr: Register,
    /// Data direction register of the port carrying the SPI pins
    pub ddr: Register,
    pub pins: SpiPins,
    pub bits: SpiBits,
}

/// Port bit of each SPI line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiPins {
    pub ss: u8,
    pub mosi: u8,
    pub miso: u8,
    pub sck: u8,
}

/// Bit positions inside SPCR and SPSR
///
/// The clock-rate select bits SPR1:SPR0 are always the two lowest bits of
/// SPCR on AVR parts, so they are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiBits {
    /// Interrupt enable
    pub spie: u8,
    /// SPI enable
    pub spe: u8,
    /// Data order (1 = LSB first)
    pub dord: u8,
    /// Master select
    pub mstr: u8,
    /// Clock polarity
    pub cpol: u8,
    /// Transfer complete flag (SPSR)
    pub spif: u8,
    /// Double speed (SPSR)
    pub spi2x: u8,
}

/// Mask of the SPR1:SPR0 clock-rate bits in SPCR
pub const SPR_MASK: u8 = 0x03;
