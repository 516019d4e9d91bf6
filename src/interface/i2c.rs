//! I2C interface implementation built on top of `embedded-hal` [`I2c`].

use embedded_hal::i2c::I2c;

use super::L3gd20Interface;
use crate::error::{Access, Error, Result};

/// Fixed 7-bit target address of the device (SDO pin tied low).
pub const I2C_ADDRESS: u8 = 0x6D;

// Bit 7 of the register-address byte requests address auto-increment for
// multi-byte reads.
const MULTI_BYTE: u8 = 0x80;

/// I2C-based interface implementation for the L3GD20 driver.
pub struct I2cInterface<I2C> {
    i2c: I2C,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new interface from the provided I2C bus abstraction.
    pub const fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Provides mutable access to the wrapped I2C bus.
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consumes the interface and returns the owned I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> L3gd20Interface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        // Register address is sent without a stop condition; the read phase
        // follows a repeated start.
        let mut value = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDRESS, &[register], &mut value)
            .map_err(|e| Error::bus(Access::Read, register, e))?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c
            .write(I2C_ADDRESS, &[register, value])
            .map_err(|e| Error::bus(Access::Write, register, e))
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.i2c
            .write_read(I2C_ADDRESS, &[register | MULTI_BYTE], buf)
            .map_err(|e| Error::bus(Access::BurstRead, register, e))
    }
}

#[cfg(test)]
mod tests {
    use super::{I2C_ADDRESS, I2cInterface};
    use crate::error::{Access, Error};
    use crate::interface::L3gd20Interface;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use std::vec;

    #[test]
    fn read_uses_repeated_start() {
        let expectations = [I2cTransaction::write_read(
            I2C_ADDRESS,
            vec![0x0F],
            vec![0xD4],
        )];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        let value = interface.read_register(0x0F).unwrap();
        assert_eq!(value, 0xD4);

        interface.release().done();
    }

    #[test]
    fn write_sends_address_and_value_in_one_transaction() {
        let expectations = [I2cTransaction::write(I2C_ADDRESS, vec![0x20, 0x0F])];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        interface.write_register(0x20, 0x0F).unwrap();

        interface.release().done();
    }

    #[test]
    fn burst_sets_multi_byte_flag() {
        let expectations = [I2cTransaction::write_read(
            I2C_ADDRESS,
            vec![0xA8],
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
        )];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        let mut buf = [0u8; 6];
        interface.read_many(0x28, &mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        interface.release().done();
    }

    #[test]
    fn read_register_masked_clears_unselected_bits() {
        let expectations = [I2cTransaction::write_read(
            I2C_ADDRESS,
            vec![0x20],
            vec![0b1100_0111],
        )];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        let value = interface.read_register_masked(0x20, 0xC0).unwrap();
        assert_eq!(value, 0b1100_0000);

        interface.release().done();
    }

    #[test]
    fn update_register_touches_only_masked_bits() {
        let expectations = [
            I2cTransaction::write_read(I2C_ADDRESS, vec![0x20], vec![0b0000_0111]),
            I2cTransaction::write(I2C_ADDRESS, vec![0x20, 0b0100_0111]),
        ];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        interface.update_register(0x20, 0x40, 0xC0).unwrap();

        interface.release().done();
    }

    #[test]
    fn bus_failure_carries_register_and_access_kind() {
        let expectations =
            [I2cTransaction::write(I2C_ADDRESS, vec![0x2E, 0x1F]).with_error(ErrorKind::Other)];
        let mut interface = I2cInterface::new(I2cMock::new(&expectations));

        let err = interface.write_register(0x2E, 0x1F).unwrap_err();
        assert_eq!(
            err,
            Error::Bus {
                access: Access::Write,
                register: 0x2E,
                source: ErrorKind::Other,
            }
        );

        interface.release().done();
    }
}
