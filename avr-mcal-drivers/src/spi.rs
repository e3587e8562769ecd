//! SPI driver
//!
//! Master or slave operation of the AVR SPI block. Whether the
//! transfer-complete interrupt is used is part of the driver's type:
//!
//! - [`Spi<R, Polling>`] receives by busy-waiting and implements
//!   `embedded_hal::spi::SpiBus`.
//! - [`Spi<R, Interrupt>`] has no receive operations; completion is delivered
//!   to the callback registered with [`Spi::register_callback`].

use core::convert::Infallible;

use avr_mcal_hal::register::bit;
use avr_mcal_hal::spi::SPR_MASK;
use avr_mcal_hal::{wait_until_set, Callback, CallbackSlot, RegisterFile, SpiLayout};

use crate::counted::{self, StringError, TERMINATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// SCK level while idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPolarity {
    /// Leading edge rising
    IdleLow,
    /// Leading edge falling
    IdleHigh,
}

/// SCK divisor relative to the CPU clock (halved when double speed is on)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockRate {
    Div4 = 0,
    Div16 = 1,
    Div64 = 2,
    Div128 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    pub bit_order: BitOrder,
    pub polarity: ClockPolarity,
    pub clock_rate: ClockRate,
    /// SPI2X
    pub double_speed: bool,
}

impl SpiConfig {
    /// MSB first, idle-low clock, CPU/4
    pub const FAST: Self = Self {
        bit_order: BitOrder::MsbFirst,
        polarity: ClockPolarity::IdleLow,
        clock_rate: ClockRate::Div4,
        double_speed: false,
    };

    /// MSB first, idle-low clock, CPU/128
    pub const SLOW: Self = Self {
        clock_rate: ClockRate::Div128,
        ..Self::FAST
    };
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::FAST
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Transfer-complete handling, fixed at construction
pub trait Mode: sealed::Sealed {
    /// Whether SPIE is set
    const INTERRUPT: bool;
}

/// Busy-wait on the transfer-complete flag
#[derive(Debug, Clone, Copy)]
pub struct Polling;

/// Transfer-complete interrupt enabled
///
/// Blocking sends spin on SPIF, which the SPI_STC vector clears on entry,
/// so they must run with global interrupts masked.
pub struct Interrupt<'a> {
    on_complete: &'a CallbackSlot,
}

impl sealed::Sealed for Polling {}
impl sealed::Sealed for Interrupt<'_> {}

impl Mode for Polling {
    const INTERRUPT: bool = false;
}

impl Mode for Interrupt<'_> {
    const INTERRUPT: bool = true;
}

/// SPI driver
pub struct Spi<R, M> {
    regs: R,
    layout: SpiLayout,
    role: Role,
    config: SpiConfig,
    mode: M,
}

fn configure<R: RegisterFile>(
    regs: &mut R,
    layout: &SpiLayout,
    config: &SpiConfig,
    role: Role,
    interrupt: bool,
) {
    let p = layout.pins;
    let b = layout.bits;

    let (outputs, inputs) = match role {
        Role::Master => (bit(p.ss) | bit(p.mosi) | bit(p.sck), bit(p.miso)),
        Role::Slave => (bit(p.miso), bit(p.ss) | bit(p.mosi) | bit(p.sck)),
    };
    regs.modify(layout.ddr, |v| (v | outputs) & !inputs);

    let mut control = bit(b.spe) | (config.clock_rate as u8 & SPR_MASK);
    if role == Role::Master {
        control |= bit(b.mstr);
    }
    if interrupt {
        control |= bit(b.spie);
    }
    if config.bit_order == BitOrder::LsbFirst {
        control |= bit(b.dord);
    }
    if config.polarity == ClockPolarity::IdleHigh {
        control |= bit(b.cpol);
    }
    regs.write(layout.spcr, control);

    if config.double_speed {
        regs.set_bit(layout.spsr, b.spi2x);
    } else {
        regs.clear_bit(layout.spsr, b.spi2x);
    }

    debug!("spi: {} enabled, spcr {=u8:#x}", role, control);
}

impl<R: RegisterFile> Spi<R, Polling> {
    /// Drive SS, MOSI and SCK and enable the block as master
    pub fn init_master(regs: R, layout: SpiLayout, config: SpiConfig) -> Self {
        Self::init(regs, layout, config, Role::Master, Polling)
    }

    /// Drive MISO only and enable the block as slave
    pub fn init_slave(regs: R, layout: SpiLayout, config: SpiConfig) -> Self {
        Self::init(regs, layout, config, Role::Slave, Polling)
    }

    /// Wait for a transfer to finish and return the byte shifted in
    pub fn receive_byte(&mut self) -> u8 {
        wait_until_set(&mut self.regs, self.layout.spsr, self.layout.bits.spif);
        self.regs.read(self.layout.spdr)
    }

    /// Receive a length-prefixed string into `buf` and terminate it
    pub fn receive_string(&mut self, buf: &mut [u8]) -> Result<usize, StringError> {
        let result = counted::receive_into(buf, || self.receive_byte());
        if let Err(e) = result {
            warn!("spi: string receive failed: {}", e);
        }
        result
    }

    /// Shift `byte` out and return the byte shifted in at the same time
    pub fn transfer(&mut self, byte: u8) -> u8 {
        self.send_byte(byte);
        self.regs.read(self.layout.spdr)
    }
}

/// Interrupt-driven operation
///
/// [`Spi::send_byte`] and the string senders still spin on SPIF. The flag is
/// cleared by hardware when the SPI_STC vector is entered, so call them with
/// global interrupts masked; otherwise the wait can miss the flag and never
/// return. With interrupts enabled, write one byte per completion from the
/// callback instead.
impl<'a, R: RegisterFile> Spi<R, Interrupt<'a>> {
    /// Master with the transfer-complete interrupt firing `on_complete`
    pub fn init_master_interrupt(
        regs: R,
        layout: SpiLayout,
        config: SpiConfig,
        on_complete: &'a CallbackSlot,
    ) -> Self {
        Self::init(regs, layout, config, Role::Master, Interrupt { on_complete })
    }

    /// Slave with the transfer-complete interrupt firing `on_complete`
    pub fn init_slave_interrupt(
        regs: R,
        layout: SpiLayout,
        config: SpiConfig,
        on_complete: &'a CallbackSlot,
    ) -> Self {
        Self::init(regs, layout, config, Role::Slave, Interrupt { on_complete })
    }

    /// Set the transfer-complete callback, replacing any earlier one
    pub fn register_callback(&self, callback: Callback) {
        self.mode.on_complete.register(callback);
    }

    /// Fire the transfer-complete callback; returns `false` if none is set
    pub fn on_interrupt(&self) -> bool {
        self.mode.on_complete.invoke()
    }
}

impl<R: RegisterFile, M: Mode> Spi<R, M> {
    fn init(mut regs: R, layout: SpiLayout, config: SpiConfig, role: Role, mode: M) -> Self {
        configure(&mut regs, &layout, &config, role, M::INTERRUPT);
        Self {
            regs,
            layout,
            role,
            config,
            mode,
        }
    }

    /// Load `byte` into the shift register and wait for the transfer to finish
    ///
    /// In [`Interrupt`] mode this needs global interrupts masked.
    pub fn send_byte(&mut self, byte: u8) {
        self.regs.write(self.layout.spdr, byte);
        wait_until_set(&mut self.regs, self.layout.spsr, self.layout.bits.spif);
    }

    /// Send the bytes of `s` up to and including its terminator
    ///
    /// A slice without a terminator is sent whole, followed by one.
    pub fn send_string(&mut self, s: &[u8]) {
        for &byte in counted::until_terminator(s) {
            self.send_byte(byte);
        }
        self.send_byte(TERMINATOR);
    }

    /// Send a length byte followed by the bytes of `s` before its terminator
    pub fn send_counted(&mut self, s: &[u8]) -> Result<(), StringError> {
        let payload = counted::until_terminator(s);
        let len = counted::length_prefix(payload)?;
        self.send_byte(len);
        for &byte in payload {
            self.send_byte(byte);
        }
        Ok(())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Give the register file back
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: RegisterFile> embedded_hal::spi::ErrorType for Spi<R, Polling> {
    type Error = Infallible;
}

impl<R: RegisterFile> embedded_hal::spi::SpiBus<u8> for Spi<R, Polling> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.transfer(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.send_byte(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let received = Spi::transfer(self, write.get(i).copied().unwrap_or(0x00));
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = Spi::transfer(self, *word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Every transfer above already waited for completion
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SpiSim;
    use avr_mcal_atmega32::spi::SPI;
    use core::sync::atomic::{AtomicU32, Ordering};
    use embedded_hal::spi::SpiBus;
    use proptest::prelude::*;

    #[test]
    fn test_master_pin_directions() {
        let mut sim = SpiSim::new();
        sim.ddrb = bit(6) | bit(0);

        drop(Spi::init_master(&mut sim, SPI, SpiConfig::default()));

        // SS, MOSI, SCK out; MISO in; unrelated PB0 untouched
        assert_eq!(sim.ddrb, bit(4) | bit(5) | bit(7) | bit(0));
        assert_eq!(sim.spcr, bit(6) | bit(4));
    }

    #[test]
    fn test_slave_pin_directions() {
        let mut sim = SpiSim::new();
        sim.ddrb = 0xFF;

        drop(Spi::init_slave(&mut sim, SPI, SpiConfig::default()));

        assert_eq!(sim.ddrb, bit(6) | 0x0F);
        assert_eq!(sim.spcr, bit(6));
    }

    #[test]
    fn test_control_bits_from_config() {
        let mut sim = SpiSim::new();
        let config = SpiConfig {
            bit_order: BitOrder::LsbFirst,
            polarity: ClockPolarity::IdleHigh,
            clock_rate: ClockRate::Div64,
            double_speed: true,
        };

        drop(Spi::init_master(&mut sim, SPI, config));

        assert_eq!(sim.spcr, bit(6) | bit(5) | bit(4) | bit(3) | 0b10);
        assert!(sim.spi2x);
    }

    #[test]
    fn test_interrupt_mode_sets_spie() {
        static SLOT: CallbackSlot = CallbackSlot::new();
        let mut sim = SpiSim::new();

        drop(Spi::init_slave_interrupt(&mut sim, SPI, SpiConfig::SLOW, &SLOT));

        assert_eq!(sim.spcr, bit(7) | bit(6) | 0b11);
        assert!(!sim.spi2x);
    }

    #[test]
    fn test_send_string_includes_terminator() {
        let mut sim = SpiSim::loopback();
        let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

        spi.send_string(b"ABC\0tail");
        spi.send_string(b"D");
        drop(spi);

        assert_eq!(&sim.sent[..], b"ABC\0D\0");
    }

    #[test]
    fn test_counted_string_to_slave() {
        let mut sim = SpiSim::new();
        sim.inject_all(&[3, b'A', b'B', b'C']);
        let mut spi = Spi::init_slave(&mut sim, SPI, SpiConfig::default());

        let mut buf = [0xEE; 8];
        let n = spi.receive_string(&mut buf).unwrap();

        assert_eq!(n, 3);
        assert_eq!(&buf[..4], b"ABC\0");
    }

    #[test]
    fn test_counted_send_format() {
        let mut sim = SpiSim::loopback();
        let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

        spi.send_counted(b"ABC").unwrap();
        drop(spi);

        assert_eq!(&sim.sent[..], &[3, b'A', b'B', b'C']);
    }

    #[test]
    fn test_transfer_returns_remote_byte() {
        let mut sim = SpiSim::new();
        sim.inject_all(&[0x5A, 0xA5]);
        let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

        assert_eq!(spi.transfer(0x01), 0x5A);
        assert_eq!(spi.transfer(0x02), 0xA5);
        drop(spi);

        assert_eq!(&sim.sent[..], &[0x01, 0x02]);
        assert!(!sim.transfer_complete());
    }

    #[test]
    fn test_interrupt_mode_send_leaves_flag_for_handler() {
        static SLOT: CallbackSlot = CallbackSlot::new();
        let mut sim = SpiSim::loopback();
        let mut spi = Spi::init_master_interrupt(&mut sim, SPI, SpiConfig::default(), &SLOT);

        // Interrupts masked: the wait sees SPIF and does not consume it
        spi.send_byte(0x42);
        drop(spi);

        assert!(sim.transfer_complete());
        assert_eq!(&sim.sent[..], &[0x42]);
    }

    #[test]
    fn test_interrupt_callback_overwrite() {
        static SLOT: CallbackSlot = CallbackSlot::new();
        static FIRST: AtomicU32 = AtomicU32::new(0);
        static SECOND: AtomicU32 = AtomicU32::new(0);
        fn first() {
            FIRST.fetch_add(1, Ordering::SeqCst);
        }
        fn second() {
            SECOND.fetch_add(1, Ordering::SeqCst);
        }

        let mut sim = SpiSim::loopback();
        let mut spi = Spi::init_master_interrupt(&mut sim, SPI, SpiConfig::default(), &SLOT);
        assert!(!spi.on_interrupt());

        spi.register_callback(first);
        spi.register_callback(second);
        spi.send_byte(0x42);
        assert!(spi.on_interrupt());

        assert_eq!(FIRST.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_spi_bus_transfer_uneven_lengths() {
        let mut sim = SpiSim::new();
        sim.inject_all(&[10, 20, 30]);
        let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

        let mut read = [0u8; 3];
        SpiBus::transfer(&mut spi, &mut read, &[1]).unwrap();
        drop(spi);

        assert_eq!(read, [10, 20, 30]);
        // Missing write bytes are filled with zero
        assert_eq!(&sim.sent[..], &[1, 0, 0]);
    }

    #[test]
    fn test_spi_bus_transfer_in_place() {
        let mut sim = SpiSim::loopback();
        let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

        let mut words = [0xDE, 0xAD];
        spi.transfer_in_place(&mut words).unwrap();
        spi.flush().unwrap();

        assert_eq!(words, [0xDE, 0xAD]);
    }

    proptest! {
        #[test]
        fn prop_loopback_preserves_bytes(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut sim = SpiSim::loopback();
            let mut spi = Spi::init_master(&mut sim, SPI, SpiConfig::default());

            for &byte in &data {
                spi.send_byte(byte);
                prop_assert_eq!(spi.receive_byte(), byte);
            }
        }
    }
}
