//! Volatile access to the memory-mapped register space

use avr_mcal_hal::{Register, RegisterFile};

/// The real register space of the running chip
///
/// Zero-sized; every access is a volatile load or store at the register's
/// data-space address. Only meaningful when running on the ATmega32 itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mmio;

impl RegisterFile for Mmio {
    #[inline(always)]
    fn read(&self, reg: Register) -> u8 {
        // SAFETY: every `Register` handed out by this crate is a valid,
        // byte-wide I/O register address on the ATmega32.
        unsafe { core::ptr::read_volatile(reg.address() as usize as *const u8) }
    }

    #[inline(always)]
    fn write(&mut self, reg: Register, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(reg.address() as usize as *mut u8, value) }
    }
}
