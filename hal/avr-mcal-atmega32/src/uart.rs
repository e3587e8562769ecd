//! USART block of the ATmega32
//!
//! UBRRH and UCSRC live at the same address; writes go to UCSRC when URSEL
//! (bit 7) is set and to UBRRH when it is clear.

use avr_mcal_hal::uart::{UsartBits, UsartLayout};
use avr_mcal_hal::Register;

pub const UDR: Register = Register::io(0x0C);
pub const UCSRA: Register = Register::io(0x0B);
pub const UCSRB: Register = Register::io(0x0A);
pub const UBRRL: Register = Register::io(0x09);
pub const UBRRH: Register = Register::io(0x20);
pub const UCSRC: Register = Register::io(0x20);

/// USART register map
pub const USART: UsartLayout = UsartLayout {
    ucsra: UCSRA,
    ucsrb: UCSRB,
    ucsrc: UCSRC,
    ubrrh: UBRRH,
    ubrrl: UBRRL,
    udr: UDR,
    bits: UsartBits {
        rxc: 7,
        udre: 5,
        fe: 4,
        pe: 2,
        u2x: 1,
        rxcie: 7,
        udrie: 5,
        rxen: 4,
        txen: 3,
        ursel: Some(7),
        upm1: 5,
        upm0: 4,
        ucsz0: 1,
    },
};
