//! USART driver
//!
//! Blocking byte and string transfers over the AVR USART, with optional
//! receive-complete and data-register-empty interrupts.
//!
//! # Line errors
//!
//! [`Uart::receive_byte`] never fails: when the received character carries a
//! framing error, or a parity error while parity checking is enabled, it hands
//! back the configured safe byte instead. The error itself is kept in
//! [`Uart::last_error`]. Callers that want to see it directly use
//! [`Uart::receive_byte_checked`] or the `embedded_io::Read` implementation.
//!
//! # Strings
//!
//! [`Uart::send_string`] sends the bytes before the terminator and nothing
//! else. [`Uart::receive_string`] expects a length byte first, so the sending
//! side of a string exchange uses [`Uart::send_counted`].

use avr_mcal_hal::register::bit;
use avr_mcal_hal::{
    wait_until_set, Callback, RegisterFile, UsartEvent, UsartInterrupts, UsartLayout,
};

use crate::counted::{self, StringError};

/// Transmission rate multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Normal,
    /// U2X set
    Double,
}

/// How one direction of the USART is serviced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    Polling,
    /// The matching USART interrupt is enabled at init
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    /// UPM1:UPM0 field value
    fn bits(self) -> u8 {
        match self {
            Parity::None => 0b00,
            Parity::Even => 0b10,
            Parity::Odd => 0b11,
        }
    }
}

/// Data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    Five,
    Six,
    Seven,
    Eight,
}

impl WordLength {
    /// UCSZ1:UCSZ0 field value
    fn bits(self) -> u8 {
        match self {
            WordLength::Five => 0b00,
            WordLength::Six => 0b01,
            WordLength::Seven => 0b10,
            WordLength::Eight => 0b11,
        }
    }
}

/// Which callback slot a registration targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Data register empty
    Tx,
    /// Receive complete
    Rx,
}

impl From<Direction> for UsartEvent {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Tx => UsartEvent::DataRegisterEmpty,
            Direction::Rx => UsartEvent::RxComplete,
        }
    }
}

/// USART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    pub speed: Speed,
    pub tx_mode: TransferMode,
    pub rx_mode: TransferMode,
    pub parity: Parity,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Returned by `receive_byte` in place of a corrupted character
    pub safe_byte: u8,
    pub word_length: WordLength,
}

impl UartConfig {
    /// 9600 baud, 8 data bits, no parity, polling both ways
    pub const POLLING_9600_8N1: Self = Self {
        speed: Speed::Double,
        tx_mode: TransferMode::Polling,
        rx_mode: TransferMode::Polling,
        parity: Parity::None,
        baudrate: 9600,
        safe_byte: b'?',
        word_length: WordLength::Eight,
    };

    /// 9600 baud, 8 data bits, even parity, receive interrupt enabled
    pub const RX_INTERRUPT_9600_8E1: Self = Self {
        rx_mode: TransferMode::Interrupt,
        parity: Parity::Even,
        ..Self::POLLING_9600_8N1
    };
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::POLLING_9600_8N1
    }
}

/// Rejected USART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidConfig {
    /// The baud rate cannot be produced from the CPU clock with a 12-bit
    /// divisor
    BaudRate(u32),
}

/// Error flagged by the receiver for one character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    Parity,
    Framing,
}

impl embedded_io::Error for LineError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::InvalidData
    }
}

/// Largest value UBRRH:UBRRL can hold
pub const MAX_DIVISOR: u16 = 0x0FFF;

/// Baud divisor `round(cpu_hz / (baud * 8)) - 1`
///
/// Returns `None` when the result does not fit the 12-bit UBRR register.
pub fn baud_divisor(cpu_hz: u32, baudrate: u32) -> Option<u16> {
    if baudrate == 0 {
        return None;
    }
    let step = baudrate as u64 * 8;
    let rounded = (cpu_hz as u64 + step / 2) / step;
    let divisor = rounded.checked_sub(1)?;
    u16::try_from(divisor).ok().filter(|&d| d <= MAX_DIVISOR)
}

/// USART driver
///
/// Owns the register file for the lifetime of the driver; the callback slots
/// are borrowed so the interrupt handlers can reach them too.
pub struct Uart<'a, R> {
    regs: R,
    layout: UsartLayout,
    config: UartConfig,
    interrupts: &'a UsartInterrupts,
    last_error: Option<LineError>,
    /// Line error held back by `embedded_io::Read` until the next call
    pending_error: Option<LineError>,
}

impl<'a, R: RegisterFile> Uart<'a, R> {
    /// Configure the USART and enable receiver and transmitter
    pub fn new(
        mut regs: R,
        layout: UsartLayout,
        interrupts: &'a UsartInterrupts,
        config: UartConfig,
        cpu_hz: u32,
    ) -> Result<Self, InvalidConfig> {
        let divisor = baud_divisor(cpu_hz, config.baudrate)
            .ok_or(InvalidConfig::BaudRate(config.baudrate))?;
        let b = layout.bits;

        match config.speed {
            Speed::Double => regs.set_bit(layout.ucsra, b.u2x),
            Speed::Normal => regs.clear_bit(layout.ucsra, b.u2x),
        }

        let select = b.ursel.map_or(0, bit);
        let frame =
            select | (config.parity.bits() << b.upm0) | (config.word_length.bits() << b.ucsz0);
        regs.write(layout.ucsrc, frame);

        // URSEL stays clear here so a shared address lands in UBRRH
        regs.write(layout.ubrrh, (divisor >> 8) as u8 & 0x0F);
        regs.write(layout.ubrrl, (divisor & 0xFF) as u8);

        let mut control = bit(b.rxen) | bit(b.txen);
        if config.tx_mode == TransferMode::Interrupt {
            control |= bit(b.udrie);
        }
        if config.rx_mode == TransferMode::Interrupt {
            control |= bit(b.rxcie);
        }
        regs.modify(layout.ucsrb, |v| v | control);

        debug!(
            "uart: {=u32} baud, divisor {=u16}, ucsrc {=u8:#x}",
            config.baudrate,
            divisor,
            frame
        );

        Ok(Self {
            regs,
            layout,
            config,
            interrupts,
            last_error: None,
            pending_error: None,
        })
    }

    /// Wait for room in the transmit buffer and queue `byte`
    pub fn send_byte(&mut self, byte: u8) {
        wait_until_set(&mut self.regs, self.layout.ucsra, self.layout.bits.udre);
        self.regs.write(self.layout.udr, byte);
    }

    /// Wait for a character and return it, or the line error it carried
    ///
    /// The data register is read either way, which clears the receive flag.
    pub fn receive_byte_checked(&mut self) -> Result<u8, LineError> {
        let b = self.layout.bits;
        wait_until_set(&mut self.regs, self.layout.ucsra, b.rxc);

        // Error flags belong to the character in UDR, so read them first
        let status = self.regs.read(self.layout.ucsra);
        let data = self.regs.read(self.layout.udr);

        let error = if status & bit(b.fe) != 0 {
            Some(LineError::Framing)
        } else if self.config.parity != Parity::None && status & bit(b.pe) != 0 {
            Some(LineError::Parity)
        } else {
            None
        };
        self.last_error = error;

        match error {
            Some(e) => Err(e),
            None => Ok(data),
        }
    }

    /// Wait for a character, substituting the safe byte on a line error
    pub fn receive_byte(&mut self) -> u8 {
        match self.receive_byte_checked() {
            Ok(byte) => byte,
            Err(e) => {
                warn!("uart: {} error, substituting {=u8:#x}", e, self.config.safe_byte);
                self.config.safe_byte
            }
        }
    }

    /// Line error of the most recent receive, if it had one
    pub fn last_error(&self) -> Option<LineError> {
        self.last_error
    }

    /// Send the bytes of `s` before its terminator
    pub fn send_string(&mut self, s: &[u8]) {
        for &byte in counted::until_terminator(s) {
            self.send_byte(byte);
        }
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

    /// Receive a length-prefixed string into `buf` and terminate it
    ///
    /// Returns the payload length. Corrupted characters are stored as the
    /// safe byte.
    pub fn receive_string(&mut self, buf: &mut [u8]) -> Result<usize, StringError> {
        let result = counted::receive_into(buf, || self.receive_byte());
        if let Err(e) = result {
            warn!("uart: string receive failed: {}", e);
        }
        result
    }

    /// Register the callback fired by the interrupt serving `direction`
    ///
    /// Replaces any callback registered earlier for that direction.
    pub fn register_callback(&self, callback: Callback, direction: Direction) {
        self.interrupts.slot(direction.into()).register(callback);
    }

    /// Fire the callback for `event`; returns `false` if none is registered
    pub fn on_interrupt(&self, event: UsartEvent) -> bool {
        self.interrupts.fire(event)
    }

    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Give the register file back
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: RegisterFile> embedded_io::ErrorType for Uart<'_, R> {
    type Error = LineError;
}

impl<R: RegisterFile> embedded_io::Read for Uart<'_, R> {
    /// Block for the first byte, then take whatever else is already waiting
    ///
    /// A line error behind good bytes ends the read early; the bytes are
    /// returned and the error is reported by the next call.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }

        buf[0] = self.receive_byte_checked()?;
        let mut n = 1;
        while n < buf.len() && self.regs.is_set(self.layout.ucsra, self.layout.bits.rxc) {
            match self.receive_byte_checked() {
                Ok(byte) => buf[n] = byte,
                Err(e) => {
                    self.pending_error = Some(e);
                    break;
                }
            }
            n += 1;
        }
        Ok(n)
    }
}

impl<R: RegisterFile> embedded_io::ReadReady for Uart<'_, R> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.is_set(self.layout.ucsra, self.layout.bits.rxc))
    }
}

impl<R: RegisterFile> embedded_io::Write for Uart<'_, R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.send_byte(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        wait_until_set(&mut self.regs, self.layout.ucsra, self.layout.bits.udre);
        Ok(())
    }
}

impl<R: RegisterFile> embedded_io::WriteReady for Uart<'_, R> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.regs.is_set(self.layout.ucsra, self.layout.bits.udre))
    }
}
