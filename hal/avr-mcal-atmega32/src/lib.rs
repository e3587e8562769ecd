//! ATmega32 support for the AVR MCAL drivers
//!
//! This crate supplies the chip-specific half of `avr-mcal-hal`:
//!
//! - register maps for the USART, SPI and TWI blocks ([`uart::USART`],
//!   [`spi::SPI`], [`twi::TWI`])
//! - [`Mmio`], the volatile [`RegisterFile`](avr_mcal_hal::RegisterFile)
//!   over the real register space
//! - the process-wide interrupt callback slots and their dispatcher
//!
//! The same register maps fit the ATmega16, which shares the peripheral set.

#![no_std]

pub mod interrupt;
pub mod mmio;
pub mod spi;
pub mod twi;
pub mod uart;

pub use mmio::Mmio;

/// CPU clock the TWI speed tiers are calibrated for
pub const DEFAULT_CPU_HZ: u32 = 8_000_000;
