//! TWI status codes and the expected-status state machine

/// Master-mode status codes (TWSR & 0xF8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Illegal start or stop on the bus
    BusError = 0x00,
    Start = 0x08,
    RepeatedStart = 0x10,
    AddressWriteAck = 0x18,
    AddressWriteNack = 0x20,
    DataWriteAck = 0x28,
    DataWriteNack = 0x30,
    ArbitrationLost = 0x38,
    AddressReadAck = 0x40,
    AddressReadNack = 0x48,
    /// Byte received, ACK returned
    DataReadAck = 0x50,
    /// Byte received, NACK returned
    DataReadNack = 0x58,
    /// No relevant state; TWINT is clear
    NoInfo = 0xF8,
}

impl Status {
    /// Decode a masked status code; slave-mode codes yield `None`
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::BusError),
            0x08 => Some(Self::Start),
            0x10 => Some(Self::RepeatedStart),
            0x18 => Some(Self::AddressWriteAck),
            0x20 => Some(Self::AddressWriteNack),
            0x28 => Some(Self::DataWriteAck),
            0x30 => Some(Self::DataWriteNack),
            0x38 => Some(Self::ArbitrationLost),
            0x40 => Some(Self::AddressReadAck),
            0x48 => Some(Self::AddressReadNack),
            0x50 => Some(Self::DataReadAck),
            0x58 => Some(Self::DataReadNack),
            0xF8 => Some(Self::NoInfo),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Step of a master transaction, each with exactly one good outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Start,
    RepeatedStart,
    /// SLA+W sent
    AddressWrite,
    /// SLA+R sent
    AddressRead,
    DataWrite,
    DataReadAck,
    DataReadNack,
}

impl Phase {
    /// Status the hardware reports when this step succeeded
    pub const fn expected(self) -> Status {
        match self {
            Phase::Start => Status::Start,
            Phase::RepeatedStart => Status::RepeatedStart,
            Phase::AddressWrite => Status::AddressWriteAck,
            Phase::AddressRead => Status::AddressReadAck,
            Phase::DataWrite => Status::DataWriteAck,
            Phase::DataReadAck => Status::DataReadAck,
            Phase::DataReadNack => Status::DataReadNack,
        }
    }

    /// Check an observed status code against this phase
    pub fn check(self, status: u8) -> Result<(), BusError> {
        if status == self.expected().code() {
            Ok(())
        } else {
            Err(BusError { phase: self, status })
        }
    }
}

/// The bus reported something other than what `phase` expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusError {
    pub phase: Phase,
    /// Masked status code actually read
    pub status: u8,
}

impl BusError {
    /// Decoded form of the observed status, if it is a master-mode code
    pub fn observed(&self) -> Option<Status> {
        Status::from_code(self.status)
    }
}
