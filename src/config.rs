//! Configuration primitives for the L3GD20 driver.

use crate::params::{FullScale, HighPassCutoff, LowPassCutoff, OutputDataRate};
use crate::registers::FIFO_WATERMARK_MAX;

/// Startup configuration applied by [`init`](crate::device::L3gd20::init).
///
/// This describes what the device is programmed to at initialization time;
/// the runtime accessors on [`L3gd20`](crate::device::L3gd20) always consult
/// the device registers and never this struct, so the hardware stays the
/// single source of truth afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Output data rate selection.
    pub odr: OutputDataRate,
    /// Low-pass filter cutoff mode.
    pub low_pass_cutoff: LowPassCutoff,
    /// High-pass filter enable.
    pub high_pass_filter: bool,
    /// High-pass filter cutoff mode.
    pub high_pass_cutoff: HighPassCutoff,
    /// Full-scale range selection.
    pub full_scale: FullScale,
    /// FIFO enable.
    pub fifo: bool,
    /// FIFO watermark level, `0..=31`.
    pub fifo_watermark: u8,
    /// Data-ready interrupt enable.
    pub data_ready_interrupt: bool,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is valid.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.fifo_watermark > FIFO_WATERMARK_MAX {
            return Err(ConfigError::WatermarkOutOfRange(self.fifo_watermark));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odr: OutputDataRate::Od95Hz,
            low_pass_cutoff: LowPassCutoff::Cutoff0,
            high_pass_filter: false,
            high_pass_cutoff: HighPassCutoff::Cutoff0,
            full_scale: FullScale::Dps250,
            fifo: false,
            fifo_watermark: 0,
            data_ready_interrupt: false,
        }
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the output data rate.
    pub fn odr(mut self, odr: OutputDataRate) -> Self {
        self.config.odr = odr;
        self
    }

    /// Overrides the low-pass cutoff mode.
    pub fn low_pass_cutoff(mut self, cutoff: LowPassCutoff) -> Self {
        self.config.low_pass_cutoff = cutoff;
        self
    }

    /// Enables the high-pass filter with the given cutoff mode.
    pub fn high_pass_filter(mut self, cutoff: HighPassCutoff) -> Self {
        self.config.high_pass_filter = true;
        self.config.high_pass_cutoff = cutoff;
        self
    }

    /// Overrides the full-scale range.
    pub fn full_scale(mut self, full_scale: FullScale) -> Self {
        self.config.full_scale = full_scale;
        self
    }

    /// Enables the FIFO with the given watermark level.
    pub fn fifo(mut self, watermark: u8) -> Self {
        self.config.fifo = true;
        self.config.fifo_watermark = watermark;
        self
    }

    /// Enables the data-ready interrupt.
    pub fn data_ready_interrupt(mut self) -> Self {
        self.config.data_ready_interrupt = true;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The requested FIFO watermark does not fit the 5-bit register field.
    WatermarkOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn oversized_watermark_is_rejected() {
        let config = Config::new().fifo(32).build();
        assert_eq!(config.validate(), Err(ConfigError::WatermarkOutOfRange(32)));
    }

    #[test]
    fn builder_overrides_compose() {
        let config = Config::new()
            .odr(OutputDataRate::Od380Hz)
            .high_pass_filter(HighPassCutoff::Cutoff2)
            .full_scale(FullScale::Dps2000)
            .fifo(16)
            .build();

        assert_eq!(config.odr, OutputDataRate::Od380Hz);
        assert!(config.high_pass_filter);
        assert_eq!(config.high_pass_cutoff, HighPassCutoff::Cutoff2);
        assert_eq!(config.full_scale, FullScale::Dps2000);
        assert!(config.fifo);
        assert_eq!(config.fifo_watermark, 16);
        assert!(!config.data_ready_interrupt);
    }
}
