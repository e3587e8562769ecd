//! SPI block of the ATmega32
//!
//! The SPI lines sit on port B: SS on PB4, MOSI on PB5, MISO on PB6 and SCK
//! on PB7.

use avr_mcal_hal::spi::{SpiBits, SpiLayout, SpiPins};
use avr_mcal_hal::Register;

pub const SPCR: Register = Register::io(0x0D);
pub const SPSR: Register = Register::io(0x0E);
pub const SPDR: Register = Register::io(0x0F);
pub const DDRB: Register = Register::io(0x17);

/// SPI register map
pub const SPI: SpiLayout = SpiLayout {
    spcr: SPCR,
    spsr: SPSR,
    spdr: SPDR,
    ddr: DDRB,
    pins: SpiPins {
        ss: 4,
        mosi: 5,
        miso: 6,
        sck: 7,
    },
    bits: SpiBits {
        spie: 7,
        spe: 6,
        dord: 5,
        mstr: 4,
        cpol: 3,
        spif: 7,
        spi2x: 0,
    },
};
