//! Register access abstractions
//!
//! Every peripheral block on the AVR is a handful of 8-bit registers in the
//! data address space. Drivers only ever need to read, write and flip single
//! bits of those registers, so that is all [`RegisterFile`] asks for.
//! Chip crates implement it with volatile memory accesses; host tests
//! implement it with simulated hardware.

/// Data-space address of a single 8-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Register(pub u16);

impl Register {
    /// Register at the given data-space address
    pub const fn at(address: u16) -> Self {
        Self(address)
    }

    /// Register at the given I/O-space address (data-space address minus 0x20)
    pub const fn io(address: u8) -> Self {
        Self(address as u16 + 0x20)
    }

    /// Data-space address of this register
    pub const fn address(self) -> u16 {
        self.0
    }
}

/// Mask with only `bit` set
#[inline(always)]
pub const fn bit(bit: u8) -> u8 {
    1 << bit
}

/// Read/modify/write surface over a block of 8-bit registers
///
/// Only [`read`](Self::read) and [`write`](Self::write) must be provided;
/// the bit helpers are built on top of them.
pub trait RegisterFile {
    /// Read the current register value
    fn read(&self, reg: Register) -> u8;

    /// Overwrite the register value
    fn write(&mut self, reg: Register, value: u8);

    /// Read, transform and write back
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set a single bit, leaving the others untouched
    fn set_bit(&mut self, reg: Register, n: u8) {
        self.modify(reg, |v| v | bit(n));
    }

    /// Clear a single bit, leaving the others untouched
    fn clear_bit(&mut self, reg: Register, n: u8) {
        self.modify(reg, |v| v & !bit(n));
    }

    /// Invert a single bit
    fn toggle_bit(&mut self, reg: Register, n: u8) {
        self.modify(reg, |v| v ^ bit(n));
    }

    /// Check whether a bit reads as 1
    fn is_set(&self, reg: Register, n: u8) -> bool {
        self.read(reg) & bit(n) != 0
    }

    /// Check whether a bit reads as 0
    fn is_clear(&self, reg: Register, n: u8) -> bool {
        !self.is_set(reg, n)
    }

    /// Called once per iteration of every busy-wait loop
    ///
    /// Real hardware just spins. Simulations override this to advance the
    /// simulated peripheral, which makes it the injection point for the
    /// "is the hardware ready yet" predicate.
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}

/// Spin until `bit` of `reg` reads as 1
///
/// There is no timeout: a flag that never sets hangs the caller.
pub fn wait_until_set<R: RegisterFile + ?Sized>(regs: &mut R, reg: Register, n: u8) {
    while regs.is_clear(reg, n) {
        regs.relax();
    }
}

/// Spin until `bit` of `reg` reads as 0
pub fn wait_until_clear<R: RegisterFile + ?Sized>(regs: &mut R, reg: Register, n: u8) {
    while regs.is_set(reg, n) {
        regs.relax();
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &mut T {
    fn read(&self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }

    fn relax(&mut self) {
        (**self).relax()
    }
}
