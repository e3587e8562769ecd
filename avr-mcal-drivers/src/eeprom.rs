//! 24C16 serial EEPROM over TWI
//!
//! The 24C16 holds 2 KiB behind one bus address. The top three bits of the
//! 11-bit memory address travel in the device-select byte, so the part
//! answers to 0xA0..=0xAE (write) and 0xA1..=0xAF (read):
//!
//! ```text
//! select = 0xA0 | (address[10:8] << 1) | rw
//! ```
//!
//! Every operation ends with a stop condition, including the ones that fail
//! part way, so the bus is always released.

use avr_mcal_hal::{RegisterFile, TwiLayout};

use crate::twi::{BusError, BusSpeed, Phase, Twi, TwiConfig};

/// Device-select byte with all block bits clear
pub const DEVICE_BASE: u8 = 0xA0;

/// Size of the memory in bytes
pub const CAPACITY: u16 = 2048;

/// Slave address the master itself is given on the bus
pub const OWN_ADDRESS: u8 = 0x0A;

/// TWI setup used by [`Eeprom::new`]
pub const BUS_CONFIG: TwiConfig = TwiConfig {
    speed: BusSpeed::Standard100k,
    own_address: OWN_ADDRESS,
};

/// Device-select byte for `address`
pub const fn device_select(address: u16, read: bool) -> u8 {
    DEVICE_BASE | (((address >> 8) & 0x07) as u8) << 1 | read as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Address past the end of the memory; nothing was put on the bus
    AddressOutOfRange(u16),
    Bus(BusError),
}

impl From<BusError> for EepromError {
    fn from(e: BusError) -> Self {
        EepromError::Bus(e)
    }
}

/// 24C16 EEPROM on a dedicated TWI master
pub struct Eeprom<R> {
    twi: Twi<R>,
}

impl<R: RegisterFile> Eeprom<R> {
    /// Bring the TWI up at 100 kHz with own address 0x0A
    pub fn new(regs: R, layout: TwiLayout) -> Self {
        Self::from_bus(Twi::new(regs, layout, BUS_CONFIG))
    }

    /// Use an already configured TWI master
    pub fn from_bus(twi: Twi<R>) -> Self {
        Self { twi }
    }

    /// Store one byte
    pub fn write_byte(&mut self, address: u16, data: u8) -> Result<(), EepromError> {
        check_range(address, 1)?;

        let result = self
            .select(address)
            .and_then(|_| self.twi.write_checked(data, Phase::DataWrite));
        self.finish(result)?;

        trace!("eeprom: wrote {=u8:#x} at {=u16:#x}", data, address);
        Ok(())
    }

    /// Fetch one byte
    pub fn read_byte(&mut self, address: u16) -> Result<u8, EepromError> {
        check_range(address, 1)?;

        let result = self
            .select(address)
            .and_then(|_| self.begin_read(address))
            .and_then(|_| self.twi.read_checked(false));
        let data = self.finish(result)?;

        trace!("eeprom: read {=u8:#x} at {=u16:#x}", data, address);
        Ok(data)
    }

    /// Fill `buf` from consecutive addresses starting at `address`
    ///
    /// Every byte but the last is acknowledged so the part keeps sending.
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), EepromError> {
        check_range(address, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }

        let result = self
            .select(address)
            .and_then(|_| self.begin_read(address))
            .and_then(|_| {
                let last = buf.len() - 1;
                for (i, slot) in buf.iter_mut().enumerate() {
                    *slot = self.twi.read_checked(i != last)?;
                }
                Ok(())
            });
        self.finish(result)
    }

    /// Start, device select for writing, low address byte
    fn select(&mut self, address: u16) -> Result<(), BusError> {
        self.twi.start_checked(false)?;
        self.twi.write_checked(device_select(address, false), Phase::AddressWrite)?;
        self.twi.write_checked(address as u8, Phase::DataWrite)
    }

    /// Repeated start and device select for reading
    fn begin_read(&mut self, address: u16) -> Result<(), BusError> {
        self.twi.start_checked(true)?;
        self.twi.write_checked(device_select(address, true), Phase::AddressRead)
    }

    /// Release the bus and convert the outcome
    fn finish<T>(&mut self, result: Result<T, BusError>) -> Result<T, EepromError> {
        self.twi.stop();
        result.map_err(|e| {
            warn!("eeprom: bus error in {}, status {=u8:#x}", e.phase, e.status);
            EepromError::Bus(e)
        })
    }

    /// Hand the TWI master back
    pub fn release(self) -> Twi<R> {
        self.twi
    }
}

fn check_range(address: u16, len: usize) -> Result<(), EepromError> {
    let end = address as usize + len.max(1);
    if end > CAPACITY as usize {
        let offending = if address >= CAPACITY {
            address
        } else {
            CAPACITY
        };
        warn!("eeprom: address {=u16:#x} out of range", offending);
        return Err(EepromError::AddressOutOfRange(offending));
    }
    Ok(())
}
