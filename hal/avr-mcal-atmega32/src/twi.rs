//! TWI block of the ATmega32
//!
//! The bit-rate settings used by the driver's speed tiers assume the part is
//! clocked at [`DEFAULT_CPU_HZ`](crate::DEFAULT_CPU_HZ).

use avr_mcal_hal::twi::{TwiBits, TwiLayout};
use avr_mcal_hal::Register;

pub const TWBR: Register = Register::io(0x00);
pub const TWSR: Register = Register::io(0x01);
pub const TWAR: Register = Register::io(0x02);
pub const TWDR: Register = Register::io(0x03);
pub const TWCR: Register = Register::io(0x36);

/// TWI register map
pub const TWI: TwiLayout = TwiLayout {
    twbr: TWBR,
    twcr: TWCR,
    twsr: TWSR,
    twdr: TWDR,
    twar: TWAR,
    bits: TwiBits {
        twint: 7,
        twea: 6,
        twsta: 5,
        twsto: 4,
        twen: 2,
        twie: 0,
        twgce: 0,
    },
};

/// SCL frequency produced by a bit-rate divisor and prescaler exponent
///
/// `SCL = cpu / (16 + 2 * TWBR * 4^TWPS)`
pub const fn scl_hz(cpu_hz: u32, twbr: u8, twps: u8) -> u32 {
    cpu_hz / (16 + 2 * twbr as u32 * (1 << (2 * twps as u32)))
}
