//! Process-wide interrupt callback slots
//!
//! The application's interrupt service routines forward to [`dispatch`]; the
//! drivers register callbacks into the same statics.
//!
//! ```ignore
//! #[avr_device::interrupt(atmega32)]
//! fn USART_RXC() {
//!     avr_mcal_atmega32::interrupt::dispatch(Vector::UsartRxc);
//! }
//! ```

use avr_mcal_hal::{CallbackSlot, UsartEvent, UsartInterrupts};

/// Interrupt vectors served by the communication drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    /// Serial transfer complete (vector 13)
    SpiStc,
    /// USART receive complete (vector 14)
    UsartRxc,
    /// USART data register empty (vector 15)
    UsartUdre,
}

impl Vector {
    /// Vector number in the interrupt table
    pub const fn number(self) -> u8 {
        match self {
            Vector::SpiStc => 13,
            Vector::UsartRxc => 14,
            Vector::UsartUdre => 15,
        }
    }
}

/// USART receive/transmit callbacks
pub static USART: UsartInterrupts = UsartInterrupts::new();

/// SPI transfer-complete callback
pub static SPI_STC: CallbackSlot = CallbackSlot::new();

/// Fire whatever callback is registered for `vector`
///
/// Returns `false` when nothing was registered.
pub fn dispatch(vector: Vector) -> bool {
    match vector {
        Vector::SpiStc => SPI_STC.invoke(),
        Vector::UsartRxc => USART.fire(UsartEvent::RxComplete),
        Vector::UsartUdre => USART.fire(UsartEvent::DataRegisterEmpty),
    }
}
