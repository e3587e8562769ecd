//! AVR MCAL hardware abstraction layer
//!
//! This crate defines what every driver in the workspace is built on and what
//! a chip-support crate must supply:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  avr-mcal-drivers (UART, SPI, TWI, ...) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  avr-mcal-hal (this crate)              │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  avr-mcal-atmega32 (addresses, MMIO)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! - [`register::RegisterFile`] - bit-level register access and busy-waits
//! - [`callback::CallbackSlot`] - one interrupt callback per event
//! - [`uart::UsartLayout`], [`spi::SpiLayout`], [`twi::TwiLayout`] - where a
//!   peripheral's registers and bits are on a given chip

#![no_std]
#![deny(unsafe_code)]

pub mod callback;
pub mod register;
pub mod spi;
pub mod twi;
pub mod uart;

pub use callback::{Callback, CallbackSlot};
pub use register::{wait_until_clear, wait_until_set, Register, RegisterFile};
pub use spi::SpiLayout;
pub use twi::TwiLayout;
pub use uart::{UsartEvent, UsartInterrupts, UsartLayout};
