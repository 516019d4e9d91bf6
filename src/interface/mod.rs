//! Bus interface abstraction for the L3GD20 driver.

pub mod i2c;
pub mod spi;

use crate::error::Result;

/// Abstraction over the register-level bus access required by the driver.
///
/// Implementations own the protocol framing: command-byte layout and
/// chip-select timing for SPI, target addressing and repeated-start reads
/// for I2C. The associated [`Error`](Self::Error) is the raw error of the
/// underlying bus; every operation wraps it with the attempted register
/// address and access kind.
///
/// All operations are synchronous and block until the bus transaction
/// completes. The driver performs no locking: when an instance is reachable
/// from both thread and interrupt context, the caller must serialize
/// access.
pub trait L3gd20Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;

    /// Reads consecutive registers into `buf` in one bus transaction.
    ///
    /// Must not be invoked from an interrupt context if the underlying bus
    /// disallows blocking calls there; the transaction holds the bus (and,
    /// for SPI, the chip-select line) for the whole burst.
    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Reads a single register and masks the result.
    ///
    /// Bits corresponding to zero bits in `mask` are cleared.
    fn read_register_masked(&mut self, register: u8, mask: u8) -> Result<u8, Self::Error> {
        Ok(self.read_register(register)? & mask)
    }

    /// Read-modify-writes a single register.
    ///
    /// Only bits selected by `mask` are updated; the rest keep their
    /// current value. The read and the write are two separate bus
    /// transactions and the window between them is not protected; the
    /// caller must ensure no concurrent mutation of the same register.
    fn update_register(&mut self, register: u8, value: u8, mask: u8) -> Result<(), Self::Error> {
        let current = self.read_register(register)?;
        let updated = (current & !mask) | (value & mask);
        self.write_register(register, updated)
    }
}
