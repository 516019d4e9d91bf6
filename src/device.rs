//! High-level L3GD20 device driver implementation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::L3gd20Interface;
use crate::interface::i2c::I2cInterface;
use crate::interface::spi::{SpiBusInterface, SpiInterface};
use crate::params::{FullScale, HighPassCutoff, LowPassCutoff, OutputDataRate};
use crate::registers::{
    AXES_POWER_MASK, AXES_POWER_ON, BLOCK_UPDATE_ENDIAN_MASK, EXPECTED_DEVICE_ID, FIFO_ENABLE,
    FIFO_MODE_BYPASS, FIFO_MODE_MASK, FIFO_MODE_STREAM, FIFO_WATERMARK_MASK, FIFO_WATERMARK_MAX,
    FULL_SCALE_MASK, FULL_SCALE_SHIFT, FifoSource, HIGH_PASS_CUTOFF_MASK, HIGH_PASS_ENABLE,
    INT2_DATA_READY, INT2_SOURCE_MASK, INT2_WATERMARK, LOW_PASS_CUTOFF_MASK,
    LOW_PASS_CUTOFF_SHIFT, ODR_MASK, ODR_SHIFT, OUT_SEL_LPF2, OUT_SEL_MASK, POWER_UP,
    RATE_AND_CUTOFF_MASK, REG_CTRL1, REG_CTRL2, REG_CTRL3, REG_CTRL4, REG_CTRL5, REG_FIFO_CTRL,
    REG_FIFO_SRC, REG_OUT_TEMP, REG_OUT_X_L, REG_STATUS, REG_WHO_AM_I, Status,
};
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::{SpiBus, SpiDevice};

// Number of identity probe attempts before init gives up.
const ID_PROBE_ATTEMPTS: usize = 3;
// Number of consecutive bytes spanning X, Y, Z axis samples.
const RAW_AXIS_BYTES: usize = 6;
// The temperature counter carries no calibration; this sentinel marks the
// sensitivity as unusable for unit conversion.
const TEMPERATURE_SENSITIVITY_UNCALIBRATED: f32 = -1.0;

/// High-level synchronous driver for the L3GD20 gyroscope.
///
/// All operations block the calling context until the underlying bus
/// transaction completes. Configuration accessors consult the device
/// registers on every call; the only locally cached state is the
/// sensitivity pair refreshed by [`set_full_scale`](Self::set_full_scale).
/// The driver performs no locking. When one instance is shared between
/// thread and interrupt context the caller must serialize access, and the
/// read-modify-write sequences must not race concurrent writes to the same
/// register.
pub struct L3gd20<IFACE> {
    interface: IFACE,
    config: Config,
    // current gyroscope sensitivity, refreshed by set_full_scale
    sensitivity_dps: f32,
    sensitivity_rad: f32,
}

/// Operations of the interrupt-register state machine.
///
/// The physical interrupt source bit depends jointly on the requested
/// enable state and the current FIFO mode, so every interrupt-register
/// write funnels through one place.
enum InterruptUpdate {
    /// Clear the interrupt source nibble.
    Disable,
    /// Select the watermark source when the FIFO is enabled, the
    /// data-ready source otherwise.
    Enable,
    /// Re-apply Enable/Disable after a FIFO mode change so an active
    /// interrupt migrates to the correct source bit.
    Rederive,
    /// Report whether any interrupt source bit is set.
    Query,
}

impl<IFACE> L3gd20<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: Config) -> Self {
        Self {
            interface,
            config,
            sensitivity_dps: config.full_scale.sensitivity_dps(),
            sensitivity_rad: config.full_scale.sensitivity_rad(),
        }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, Config) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns a shared reference to the startup configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the startup configuration.
    ///
    /// Changes take effect on the next [`init`](Self::init) call.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

impl<SPI> L3gd20<SpiInterface<SPI>>
where
    SPI: SpiDevice,
{
    // ==================================================================
    // == SPI Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for SPI transports with HAL-managed
    /// chip-select.
    pub fn new_spi(spi: SPI, config: Config) -> Self {
        Self::new(SpiInterface::new(spi), config)
    }

    /// Releases the driver, returning the SPI device and configuration.
    pub fn release_spi(self) -> (SPI, Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<SPI, CS> L3gd20<SpiBusInterface<SPI, CS>>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Convenience constructor for raw SPI buses with a driver-owned
    /// chip-select line.
    pub fn new_spi_bus(spi: SPI, cs: CS, config: Config) -> Self {
        Self::new(SpiBusInterface::new(spi, cs), config)
    }

    /// Releases the driver, returning the bus, chip-select, and
    /// configuration.
    pub fn release_spi_bus(self) -> (SPI, CS, Config) {
        let (iface, config) = self.release();
        let (spi, cs) = iface.release();
        (spi, cs, config)
    }
}

impl<I2C> L3gd20<I2cInterface<I2C>>
where
    I2C: I2c,
{
    // ==================================================================
    // == I2C Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for I2C transports.
    pub fn new_i2c(i2c: I2C, config: Config) -> Self {
        Self::new(I2cInterface::new(i2c), config)
    }

    /// Releases the driver, returning the I2C bus and configuration.
    pub fn release_i2c(self) -> (I2C, Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> L3gd20<IFACE>
where
    IFACE: L3gd20Interface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Identity =====================================
    // ==================================================================
    /// Initializes the sensor: verifies its identity, then programs the
    /// stored configuration.
    ///
    /// This method is idempotent. On success the device runs with
    /// continuous data update, little-endian output, and the output
    /// routed through the second low-pass stage; `enable` selects whether
    /// sensing starts immediately. When the identity probe fails, no
    /// configuration is written.
    pub fn init(&mut self, enable: bool) -> Result<(), CommE> {
        self.config
            .validate()
            .map_err(|_| Error::InvalidWatermark(self.config.fifo_watermark))?;

        self.probe_identity()?;

        // continuous data update, little-endian output
        self.interface
            .update_register(REG_CTRL4, 0x00, BLOCK_UPDATE_ENDIAN_MASK)?;
        // route output through the second low-pass stage
        self.interface
            .update_register(REG_CTRL5, OUT_SEL_LPF2, OUT_SEL_MASK)?;

        let config = self.config;
        self.set_data_ready_interrupt(config.data_ready_interrupt)?;
        self.set_fifo_enabled(config.fifo)?;
        self.set_fifo_watermark(config.fifo_watermark)?;
        self.set_full_scale(config.full_scale)?;
        self.set_high_pass_filter(config.high_pass_filter)?;
        self.set_high_pass_cutoff(config.high_pass_cutoff)?;
        self.set_low_pass_cutoff(config.low_pass_cutoff)?;
        self.set_output_data_rate(config.odr)?;
        self.set_enabled(enable)?;

        Ok(())
    }

    /// Reads the identity register.
    pub fn device_id(&mut self) -> Result<u8, CommE> {
        self.interface.read_register(REG_WHO_AM_I)
    }

    // The device occasionally glitches and reports a wrong id on the first
    // read, so probe a few times before giving up.
    fn probe_identity(&mut self) -> Result<(), CommE> {
        let mut found = 0;
        for _ in 0..ID_PROBE_ATTEMPTS {
            found = self.interface.read_register(REG_WHO_AM_I)?;
            if found == EXPECTED_DEVICE_ID {
                return Ok(());
            }
        }
        Err(Error::DeviceIdMismatch { found })
    }

    // ==================================================================
    // == Sensing Enable & Data Rate ====================================
    // ==================================================================
    /// Enables or disables sensing.
    ///
    /// The device ties the three axes together; they are switched as one
    /// unit.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), CommE> {
        let value = if enabled { AXES_POWER_ON } else { 0x00 };
        self.interface
            .update_register(REG_CTRL1, value, AXES_POWER_MASK)
    }

    /// Reports whether sensing is enabled.
    pub fn is_enabled(&mut self) -> Result<bool, CommE> {
        Ok(self.interface.read_register_masked(REG_CTRL1, POWER_UP)? != 0)
    }

    /// Sets the output data rate.
    pub fn set_output_data_rate(&mut self, odr: OutputDataRate) -> Result<(), CommE> {
        self.interface
            .update_register(REG_CTRL1, odr.field_bits() << ODR_SHIFT, ODR_MASK)
    }

    /// Returns the current output data rate.
    pub fn output_data_rate(&mut self) -> Result<OutputDataRate, CommE> {
        let bits = self.interface.read_register_masked(REG_CTRL1, ODR_MASK)? >> ODR_SHIFT;
        Ok(OutputDataRate::from_field_bits(bits))
    }

    /// Returns the current output data rate in hertz.
    pub fn output_data_rate_hz(&mut self) -> Result<f32, CommE> {
        Ok(self.output_data_rate()?.hz())
    }

    // ==================================================================
    // == Filters =======================================================
    // ==================================================================
    /// Sets the low-pass filter cutoff mode.
    pub fn set_low_pass_cutoff(&mut self, cutoff: LowPassCutoff) -> Result<(), CommE> {
        self.interface.update_register(
            REG_CTRL1,
            cutoff.field_bits() << LOW_PASS_CUTOFF_SHIFT,
            LOW_PASS_CUTOFF_MASK,
        )
    }

    /// Returns the current low-pass filter cutoff mode.
    pub fn low_pass_cutoff(&mut self) -> Result<LowPassCutoff, CommE> {
        let bits = self
            .interface
            .read_register_masked(REG_CTRL1, LOW_PASS_CUTOFF_MASK)?
            >> LOW_PASS_CUTOFF_SHIFT;
        Ok(LowPassCutoff::from_field_bits(bits))
    }

    /// Calculates the current low-pass filter cutoff frequency in hertz.
    ///
    /// The frequency depends on both the cutoff mode and the output data
    /// rate; both fields are taken from one register read.
    pub fn low_pass_cutoff_frequency_hz(&mut self) -> Result<f32, CommE> {
        let raw = self
            .interface
            .read_register_masked(REG_CTRL1, RATE_AND_CUTOFF_MASK)?;
        let odr = OutputDataRate::from_field_bits(raw >> ODR_SHIFT);
        let cutoff =
            LowPassCutoff::from_field_bits((raw & LOW_PASS_CUTOFF_MASK) >> LOW_PASS_CUTOFF_SHIFT);
        Ok(cutoff.frequency_hz(odr))
    }

    /// Enables or disables the high-pass filter.
    pub fn set_high_pass_filter(&mut self, enabled: bool) -> Result<(), CommE> {
        let value = if enabled { HIGH_PASS_ENABLE } else { 0x00 };
        self.interface
            .update_register(REG_CTRL5, value, HIGH_PASS_ENABLE)
    }

    /// Reports whether the high-pass filter is enabled.
    pub fn high_pass_filter_enabled(&mut self) -> Result<bool, CommE> {
        Ok(self
            .interface
            .read_register_masked(REG_CTRL5, HIGH_PASS_ENABLE)?
            != 0)
    }

    /// Sets the high-pass filter cutoff mode.
    pub fn set_high_pass_cutoff(&mut self, cutoff: HighPassCutoff) -> Result<(), CommE> {
        self.interface
            .update_register(REG_CTRL2, cutoff.field_bits(), HIGH_PASS_CUTOFF_MASK)
    }

    /// Returns the current high-pass filter cutoff mode.
    ///
    /// Corrupted field values of 10 and above are reported as the highest
    /// mode.
    pub fn high_pass_cutoff(&mut self) -> Result<HighPassCutoff, CommE> {
        let bits = self
            .interface
            .read_register_masked(REG_CTRL2, HIGH_PASS_CUTOFF_MASK)?;
        Ok(HighPassCutoff::from_field_bits(bits))
    }

    /// Calculates the current high-pass filter cutoff frequency in hertz.
    pub fn high_pass_cutoff_frequency_hz(&mut self) -> Result<f32, CommE> {
        let cutoff = self.high_pass_cutoff()?;
        let odr = self.output_data_rate()?;
        Ok(cutoff.frequency_hz(odr))
    }

    // ==================================================================
    // == Full Scale & Sensitivity ======================================
    // ==================================================================
    /// Sets the full-scale range and refreshes the cached sensitivities
    /// used by the data-reading operations.
    pub fn set_full_scale(&mut self, full_scale: FullScale) -> Result<(), CommE> {
        self.interface.update_register(
            REG_CTRL4,
            full_scale.field_bits() << FULL_SCALE_SHIFT,
            FULL_SCALE_MASK,
        )?;
        self.sensitivity_dps = full_scale.sensitivity_dps();
        self.sensitivity_rad = full_scale.sensitivity_rad();
        Ok(())
    }

    /// Returns the current full-scale range.
    pub fn full_scale(&mut self) -> Result<FullScale, CommE> {
        let bits = self
            .interface
            .read_register_masked(REG_CTRL4, FULL_SCALE_MASK)?
            >> FULL_SCALE_SHIFT;
        Ok(FullScale::from_field_bits(bits))
    }

    /// Returns the sensitivity in degrees per second per count, read back
    /// from the device.
    pub fn sensitivity_dps(&mut self) -> Result<f32, CommE> {
        Ok(self.full_scale()?.sensitivity_dps())
    }

    /// Returns the sensitivity in radians per second per count, read back
    /// from the device.
    pub fn sensitivity_rad(&mut self) -> Result<f32, CommE> {
        Ok(self.full_scale()?.sensitivity_rad())
    }

    // ==================================================================
    // == FIFO ==========================================================
    // ==================================================================
    /// Enables or disables the FIFO.
    ///
    /// Enabling selects stream mode; disabling returns the FIFO to bypass.
    /// Either change re-derives the interrupt source so an active
    /// data-ready interrupt migrates between the per-sample and watermark
    /// sources.
    pub fn set_fifo_enabled(&mut self, enabled: bool) -> Result<(), CommE> {
        if enabled {
            self.interface
                .update_register(REG_FIFO_CTRL, FIFO_MODE_STREAM, FIFO_MODE_MASK)?;
            self.interface
                .update_register(REG_CTRL5, FIFO_ENABLE, FIFO_ENABLE)?;
        } else {
            self.interface
                .update_register(REG_CTRL5, 0x00, FIFO_ENABLE)?;
            self.interface
                .update_register(REG_FIFO_CTRL, FIFO_MODE_BYPASS, FIFO_MODE_MASK)?;
        }
        self.update_interrupt(InterruptUpdate::Rederive)?;
        Ok(())
    }

    /// Reports whether the FIFO is enabled.
    pub fn fifo_enabled(&mut self) -> Result<bool, CommE> {
        Ok(self
            .interface
            .read_register_masked(REG_CTRL5, FIFO_ENABLE)?
            != 0)
    }

    /// Sets the FIFO watermark level.
    ///
    /// Values above 31 do not fit the 5-bit field and fail with
    /// [`Error::InvalidWatermark`] before any bus traffic.
    pub fn set_fifo_watermark(&mut self, watermark: u8) -> Result<(), CommE> {
        if watermark > FIFO_WATERMARK_MAX {
            return Err(Error::InvalidWatermark(watermark));
        }
        self.interface
            .update_register(REG_FIFO_CTRL, watermark, FIFO_WATERMARK_MASK)
    }

    /// Returns the current FIFO watermark level.
    pub fn fifo_watermark(&mut self) -> Result<u8, CommE> {
        self.interface
            .read_register_masked(REG_FIFO_CTRL, FIFO_WATERMARK_MASK)
    }

    /// Clears the FIFO content by switching the mode field to bypass and
    /// back.
    ///
    /// A no-op when the FIFO is already in bypass mode.
    pub fn clear_fifo(&mut self) -> Result<(), CommE> {
        let mode = self
            .interface
            .read_register_masked(REG_FIFO_CTRL, FIFO_MODE_MASK)?;
        if mode != FIFO_MODE_BYPASS {
            self.interface
                .update_register(REG_FIFO_CTRL, FIFO_MODE_BYPASS, FIFO_MODE_MASK)?;
            self.interface
                .update_register(REG_FIFO_CTRL, mode, FIFO_MODE_MASK)?;
        }
        Ok(())
    }

    // ==================================================================
    // == Data-Ready Interrupt ==========================================
    // ==================================================================
    /// Enables or disables the data-ready interrupt line.
    ///
    /// While the FIFO is enabled the interrupt fires on watermark reached
    /// instead of per-sample data-ready.
    pub fn set_data_ready_interrupt(&mut self, enabled: bool) -> Result<(), CommE> {
        let update = if enabled {
            InterruptUpdate::Enable
        } else {
            InterruptUpdate::Disable
        };
        self.update_interrupt(update)?;
        Ok(())
    }

    /// Reports whether the data-ready interrupt is enabled.
    pub fn data_ready_interrupt_enabled(&mut self) -> Result<bool, CommE> {
        self.update_interrupt(InterruptUpdate::Query)
    }

    fn update_interrupt(&mut self, update: InterruptUpdate) -> Result<bool, CommE> {
        match update {
            InterruptUpdate::Disable => {
                self.interface
                    .update_register(REG_CTRL3, 0x00, INT2_SOURCE_MASK)?;
                Ok(false)
            }
            InterruptUpdate::Enable => {
                let source = if self.fifo_enabled()? {
                    INT2_WATERMARK
                } else {
                    INT2_DATA_READY
                };
                self.interface
                    .update_register(REG_CTRL3, source, INT2_SOURCE_MASK)?;
                Ok(true)
            }
            InterruptUpdate::Rederive => {
                if self.update_interrupt(InterruptUpdate::Query)? {
                    self.update_interrupt(InterruptUpdate::Enable)
                } else {
                    self.update_interrupt(InterruptUpdate::Disable)
                }
            }
            InterruptUpdate::Query => Ok(self
                .interface
                .read_register_masked(REG_CTRL3, INT2_SOURCE_MASK)?
                != 0),
        }
    }

    // ==================================================================
    // == Data Acquisition ==============================================
    // ==================================================================
    /// Reads a raw angular-rate triplet in X, Y, Z order.
    pub fn read_raw(&mut self) -> Result<[i16; 3], CommE> {
        let mut raw = [0u8; RAW_AXIS_BYTES];
        self.interface.read_many(REG_OUT_X_L, &mut raw)?;

        Ok([
            i16::from_le_bytes([raw[0], raw[1]]),
            i16::from_le_bytes([raw[2], raw[3]]),
            i16::from_le_bytes([raw[4], raw[5]]),
        ])
    }

    /// Reads angular rates in radians per second.
    ///
    /// Uses the sensitivity cached by the last
    /// [`set_full_scale`](Self::set_full_scale) call.
    pub fn read_rad_per_sec(&mut self) -> Result<[f32; 3], CommE> {
        let raw = self.read_raw()?;
        Ok(Self::scale_axes(raw, self.sensitivity_rad))
    }

    /// Reads angular rates in degrees per second.
    ///
    /// Uses the sensitivity cached by the last
    /// [`set_full_scale`](Self::set_full_scale) call.
    pub fn read_dps(&mut self) -> Result<[f32; 3], CommE> {
        let raw = self.read_raw()?;
        Ok(Self::scale_axes(raw, self.sensitivity_dps))
    }

    #[inline]
    fn scale_axes(raw: [i16; 3], sensitivity: f32) -> [f32; 3] {
        [
            raw[0] as f32 * sensitivity,
            raw[1] as f32 * sensitivity,
            raw[2] as f32 * sensitivity,
        ]
    }

    /// Reads the raw temperature counter.
    ///
    /// The zero level of the temperature sensor is not calibrated; the
    /// counter is only meaningful for relative measurements.
    pub fn read_temperature_raw(&mut self) -> Result<i8, CommE> {
        Ok(self.interface.read_register(REG_OUT_TEMP)? as i8)
    }

    /// Returns the temperature sensor sensitivity.
    ///
    /// No calibration is available for this device; the returned value is
    /// a `-1.0` sentinel, not a usable scale factor.
    pub const fn temperature_sensitivity(&self) -> f32 {
        TEMPERATURE_SENSITIVITY_UNCALIBRATED
    }

    // ==================================================================
    // == Status ========================================================
    // ==================================================================
    /// Returns a snapshot of the status register.
    pub fn status(&mut self) -> Result<Status, CommE> {
        Ok(Status::from(self.interface.read_register(REG_STATUS)?))
    }

    /// Returns a snapshot of the FIFO source register.
    pub fn fifo_source(&mut self) -> Result<FifoSource, CommE> {
        Ok(FifoSource::from(self.interface.read_register(REG_FIFO_SRC)?))
    }
}
