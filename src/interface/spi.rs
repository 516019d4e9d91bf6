//! SPI interface implementations built on top of `embedded-hal`.
//!
//! Two flavors are provided. [`SpiInterface`] wraps an [`SpiDevice`] and
//! leaves chip-select framing to the HAL. [`SpiBusInterface`] wraps a raw
//! [`SpiBus`] together with a chip-select [`OutputPin`] it owns and toggles
//! around every framed transfer.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{MODE_3, Mode, Operation, SpiBus, SpiDevice};

use super::L3gd20Interface;
use crate::error::{Access, Error, Result};

/// SPI mode the device requires: clock idle high, data sampled on the
/// rising edge, 8-bit words.
pub const SPI_MODE: Mode = MODE_3;

/// Maximum SPI clock rate supported by the device, in hertz.
pub const SPI_MAX_CLOCK_HZ: u32 = 10_000_000;

// Address byte layout: bit 7 read/write, bit 6 multi-byte, bits 5:0 address.
const READ: u8 = 0x80;
const MULTI_BYTE: u8 = 0x40;
const ADDRESS_MASK: u8 = 0x3F;

/// Builds the command byte for a single-register read.
const fn read_command(register: u8) -> u8 {
    (register & ADDRESS_MASK) | READ
}

/// Builds the command byte for a multi-register burst read.
const fn burst_command(register: u8) -> u8 {
    (register & ADDRESS_MASK) | READ | MULTI_BYTE
}

/// Builds the command byte for a single-register write.
const fn write_command(register: u8) -> u8 {
    register & ADDRESS_MASK
}

/// SPI interface whose chip-select line is managed by the HAL.
///
/// Use this when the bus HAL hands out [`SpiDevice`] handles, or when the
/// caller frames transactions externally.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Creates a new interface from the provided SPI device abstraction.
    ///
    /// The device must be configured for [`SPI_MODE`] at no more than
    /// [`SPI_MAX_CLOCK_HZ`].
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Provides mutable access to the wrapped SPI device.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the owned SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> L3gd20Interface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        let command = [read_command(register)];
        let mut value = [0u8; 1];
        let mut operations = [Operation::Write(&command), Operation::Read(&mut value)];
        self.spi
            .transaction(&mut operations)
            .map_err(|e| Error::bus(Access::Read, register, e))?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        let command = [write_command(register)];
        let payload = [value];
        let mut operations = [Operation::Write(&command), Operation::Write(&payload)];
        self.spi
            .transaction(&mut operations)
            .map_err(|e| Error::bus(Access::Write, register, e))
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        let command = [burst_command(register)];
        let mut operations = [Operation::Write(&command), Operation::Read(buf)];
        self.spi
            .transaction(&mut operations)
            .map_err(|e| Error::bus(Access::BurstRead, register, e))
    }
}

/// Error produced by [`SpiBusInterface`], distinguishing bus faults from
/// chip-select pin faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiBusError<SpiE, PinE> {
    /// The SPI bus reported an error.
    Spi(SpiE),
    /// The chip-select line could not be driven.
    ChipSelect(PinE),
}

/// SPI interface over a raw bus with a driver-owned chip-select line.
///
/// The chip-select output is asserted low for the duration of each framed
/// transfer and deasserted afterwards, including when the bus errors
/// mid-transfer.
pub struct SpiBusInterface<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiBusInterface<SPI, CS> {
    /// Creates a new interface from a raw SPI bus and a chip-select output.
    ///
    /// The bus must be configured for [`SPI_MODE`] at no more than
    /// [`SPI_MAX_CLOCK_HZ`]; the chip-select line should idle high.
    pub const fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Provides mutable access to the wrapped SPI bus.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the owned bus and chip-select.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> SpiBusInterface<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Runs one chip-select-framed transfer: transmit `tx`, then clock in
    /// `rx` if non-empty.
    fn framed_transfer(
        &mut self,
        access: Access,
        register: u8,
        tx: &[u8],
        rx: &mut [u8],
    ) -> Result<(), SpiBusError<SPI::Error, CS::Error>> {
        self.cs
            .set_low()
            .map_err(|e| Error::bus(access, register, SpiBusError::ChipSelect(e)))?;

        let transfer = self.exchange(tx, rx);
        // Deassert even when the transfer failed; the bus error wins.
        let deselect = self.cs.set_high();

        transfer.map_err(|e| Error::bus(access, register, SpiBusError::Spi(e)))?;
        deselect.map_err(|e| Error::bus(access, register, SpiBusError::ChipSelect(e)))?;
        Ok(())
    }

    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> core::result::Result<(), SPI::Error> {
        self.spi.write(tx)?;
        if !rx.is_empty() {
            self.spi.read(rx)?;
        }
        self.spi.flush()
    }
}

impl<SPI, CS> L3gd20Interface for SpiBusInterface<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    type Error = SpiBusError<SPI::Error, CS::Error>;

    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.framed_transfer(Access::Read, register, &[read_command(register)], &mut value)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.framed_transfer(
            Access::Write,
            register,
            &[write_command(register), value],
            &mut [],
        )
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        if buf.is_empty() {
            return Ok(());
        }

        self.framed_transfer(Access::BurstRead, register, &[burst_command(register)], buf)
    }
}

#[cfg(test)]
mod tests {
    use super::{SpiBusInterface, SpiInterface};
    use crate::interface::L3gd20Interface;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use std::vec;

    #[test]
    fn device_read_sets_read_bit_in_command() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x8F]),
            SpiTransaction::read_vec(vec![0xD4]),
            SpiTransaction::transaction_end(),
        ];
        let mut interface = SpiInterface::new(SpiMock::new(&expectations));

        let value = interface.read_register(0x0F).unwrap();
        assert_eq!(value, 0xD4);

        interface.release().done();
    }

    #[test]
    fn device_write_keeps_read_bit_clear() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x20]),
            SpiTransaction::write_vec(vec![0x0F]),
            SpiTransaction::transaction_end(),
        ];
        let mut interface = SpiInterface::new(SpiMock::new(&expectations));

        interface.write_register(0x20, 0x0F).unwrap();

        interface.release().done();
    }

    #[test]
    fn device_burst_sets_read_and_multi_byte_bits() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xE8]),
            SpiTransaction::read_vec(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06]),
            SpiTransaction::transaction_end(),
        ];
        let mut interface = SpiInterface::new(SpiMock::new(&expectations));

        let mut buf = [0u8; 6];
        interface.read_many(0x28, &mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);

        interface.release().done();
    }

    #[test]
    fn device_burst_ignores_empty_buffer() {
        let expectations: [SpiTransaction<u8>; 0] = [];
        let mut interface = SpiInterface::new(SpiMock::new(&expectations));

        interface.read_many(0x28, &mut []).unwrap();

        interface.release().done();
    }

    #[test]
    fn update_register_is_read_then_write() {
        let expectations = [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xA0]),
            SpiTransaction::read_vec(vec![0b0000_0111]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x20]),
            SpiTransaction::write_vec(vec![0b0100_0111]),
            SpiTransaction::transaction_end(),
        ];
        let mut interface = SpiInterface::new(SpiMock::new(&expectations));

        interface.update_register(0x20, 0x40, 0xC0).unwrap();

        interface.release().done();
    }

    #[test]
    fn bus_read_frames_transfer_with_chip_select() {
        let spi_expectations = [
            SpiTransaction::write_vec(vec![0x8F]),
            SpiTransaction::read_vec(vec![0xD4]),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut interface = SpiBusInterface::new(
            SpiMock::new(&spi_expectations),
            PinMock::new(&pin_expectations),
        );

        let value = interface.read_register(0x0F).unwrap();
        assert_eq!(value, 0xD4);

        let (mut spi, mut cs) = interface.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn bus_write_sends_command_and_value_in_one_assertion() {
        let spi_expectations = [
            SpiTransaction::write_vec(vec![0x20, 0x0F]),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut interface = SpiBusInterface::new(
            SpiMock::new(&spi_expectations),
            PinMock::new(&pin_expectations),
        );

        interface.write_register(0x20, 0x0F).unwrap();

        let (mut spi, mut cs) = interface.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn bus_burst_holds_chip_select_for_whole_transfer() {
        let spi_expectations = [
            SpiTransaction::write_vec(vec![0xE8]),
            SpiTransaction::read_vec(vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60]),
            SpiTransaction::flush(),
        ];
        let pin_expectations = [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ];
        let mut interface = SpiBusInterface::new(
            SpiMock::new(&spi_expectations),
            PinMock::new(&pin_expectations),
        );

        let mut buf = [0u8; 6];
        interface.read_many(0x28, &mut buf).unwrap();
        assert_eq!(buf, [0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);

        let (mut spi, mut cs) = interface.release();
        spi.done();
        cs.done();
    }
}
