//! `embedded-hal` I2C implementation

use avr_mcal_hal::RegisterFile;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::{BusError, Phase, Status, Twi};

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self.observed() {
            Some(Status::AddressWriteNack | Status::AddressReadNack) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Some(Status::DataWriteNack) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Some(Status::ArbitrationLost) => ErrorKind::ArbitrationLoss,
            Some(Status::BusError) => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

impl<R: RegisterFile> embedded_hal::i2c::ErrorType for Twi<R> {
    type Error = BusError;
}

impl<R: RegisterFile> Twi<R> {
    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), BusError> {
        let mut previous: Option<bool> = None;

        for i in 0..operations.len() {
            // SLA+R must be followed by at least one NACKed read before a stop
            if matches!(&operations[i], Operation::Read(buf) if buf.is_empty()) {
                continue;
            }
            let is_read = matches!(operations[i], Operation::Read(_));
            let read_follows = operations[i + 1..]
                .iter()
                .find(|op| !matches!(op, Operation::Read(buf) if buf.is_empty()))
                .is_some_and(|op| matches!(op, Operation::Read(_)));

            // Adjacent operations of the same kind share one address frame
            if previous != Some(is_read) {
                self.start_checked(previous.is_some())?;
                self.address(address, is_read)?;
            }

            match &mut operations[i] {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        self.write_checked(byte, Phase::DataWrite)?;
                    }
                }
                Operation::Read(buf) => {
                    let len = buf.len();
                    for (j, slot) in buf.iter_mut().enumerate() {
                        let last = j + 1 == len && !read_follows;
                        *slot = self.read_checked(!last)?;
                    }
                }
            }

            previous = Some(is_read);
        }

        Ok(())
    }
}

impl<R: RegisterFile> embedded_hal::i2c::I2c<SevenBitAddress> for Twi<R> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let result = self.run(address, operations);
        // Release the bus whether or not every step succeeded
        self.stop();
        result
    }
}
