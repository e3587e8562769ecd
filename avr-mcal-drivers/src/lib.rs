//! Communication peripheral drivers for AVR microcontrollers
//!
//! Every driver is generic over a [`RegisterFile`](avr_mcal_hal::RegisterFile)
//! and a register layout, so the same code runs on the chip (through
//! `avr_mcal_atmega32::Mmio`) and against simulated hardware in tests:
//!
//! - [`uart::Uart`] - USART, polling or interrupt driven
//! - [`spi::Spi`] - SPI master/slave, polling or interrupt driven
//! - [`twi::Twi`] - TWI (I2C) master with per-step status checking
//! - [`eeprom::Eeprom`] - 24C16 serial EEPROM on top of the TWI master
//!
//! Transfers block by busy-waiting on hardware flags; none of them time out.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the macros are visible to the other modules
#[macro_use]
mod fmt;

pub mod counted;
pub mod eeprom;
pub mod spi;
pub mod twi;
pub mod uart;

#[cfg(test)]
mod sim;

pub use counted::StringError;
pub use eeprom::{Eeprom, EepromError};
pub use spi::{Spi, SpiConfig};
pub use twi::{BusError, Twi, TwiConfig};
pub use uart::{LineError, Uart, UartConfig};
