//! USART register layout
//!
//! Describes where the USART registers live and which bit does what, so the
//! UART driver never hard-codes a particular chip.

use crate::callback::CallbackSlot;
use crate::register::Register;

/// Registers and bit positions of one USART block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsartLayout {
    /// Control and status register A (flags, U2X)
    pub ucsra: Register,
    /// Control and status register B (enables, interrupt enables)
    pub ucsrb: Register,
    /// Control and status register C (frame format)
    pub ucsrc: Register,
    /// Baud rate register, high byte
    pub ubrrh: Register,
    /// Baud rate register, low byte
    pub ubrrl: Register,
    /// Data register
    pub udr: Register,
    pub bits: UsartBits,
}

/// Bit positions inside the USART registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsartBits {
    // UCSRA
    /// Receive complete
    pub rxc: u8,
    /// Data register empty
    pub udre: u8,
    /// Framing error
    pub fe: u8,
    /// Parity error
    pub pe: u8,
    /// Double transmission speed
    pub u2x: u8,
    // UCSRB
    /// Receive complete interrupt enable
    pub rxcie: u8,
    /// Data register empty interrupt enable
    pub udrie: u8,
    /// Receiver enable
    pub rxen: u8,
    /// Transmitter enable
    pub txen: u8,
    // UCSRC
    /// Register select for chips where UCSRC and UBRRH share an address
    pub ursel: Option<u8>,
    /// Parity mode bit 0
    pub upm0: u8,
    /// Parity mode bit 1
    pub upm1: u8,
    /// Character size bit 0 (bit 1 follows it)
    pub ucsz0: u8,
}

/// USART interrupt sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartEvent {
    /// A byte has been received (USART_RXC)
    RxComplete,
    /// The transmit data register can take another byte (USART_UDRE)
    DataRegisterEmpty,
}

/// Callback slots of one USART block
pub struct UsartInterrupts {
    pub rx_complete: CallbackSlot,
    pub data_register_empty: CallbackSlot,
}

impl Default for UsartInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl UsartInterrupts {
    pub const fn new() -> Self {
        Self {
            rx_complete: CallbackSlot::new(),
            data_register_empty: CallbackSlot::new(),
        }
    }

    /// Slot serving `event`
    pub fn slot(&self, event: UsartEvent) -> &CallbackSlot {
        match event {
            UsartEvent::RxComplete => &self.rx_complete,
            UsartEvent::DataRegisterEmpty => &self.data_register_empty,
        }
    }

    /// Fire the callback registered for `event`; call from the ISR
    pub fn fire(&self, event: UsartEvent) -> bool {
        self.slot(event).invoke()
    }
}
