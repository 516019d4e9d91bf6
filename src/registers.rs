//! Register map definitions for the L3GD20 gyroscope.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

/// Register address of `WHO_AM_I`.
pub const REG_WHO_AM_I: u8 = 0x0F;
/// Register address of `CTRL_REG1`.
pub const REG_CTRL1: u8 = 0x20;
/// Register address of `CTRL_REG2`.
pub const REG_CTRL2: u8 = 0x21;
/// Register address of `CTRL_REG3`.
pub const REG_CTRL3: u8 = 0x22;
/// Register address of `CTRL_REG4`.
pub const REG_CTRL4: u8 = 0x23;
/// Register address of `CTRL_REG5`.
pub const REG_CTRL5: u8 = 0x24;
/// Register address of `REFERENCE`.
pub const REG_REFERENCE: u8 = 0x25;
/// Register address of `OUT_TEMP`.
pub const REG_OUT_TEMP: u8 = 0x26;
/// Register address of `STATUS_REG`.
pub const REG_STATUS: u8 = 0x27;
/// Register address of `OUT_X_L`.
pub const REG_OUT_X_L: u8 = 0x28;
/// Register address of `OUT_X_H`.
pub const REG_OUT_X_H: u8 = 0x29;
/// Register address of `OUT_Y_L`.
pub const REG_OUT_Y_L: u8 = 0x2A;
/// Register address of `OUT_Y_H`.
pub const REG_OUT_Y_H: u8 = 0x2B;
/// Register address of `OUT_Z_L`.
pub const REG_OUT_Z_L: u8 = 0x2C;
/// Register address of `OUT_Z_H`.
pub const REG_OUT_Z_H: u8 = 0x2D;
/// Register address of `FIFO_CTRL_REG`.
pub const REG_FIFO_CTRL: u8 = 0x2E;
/// Register address of `FIFO_SRC_REG`.
pub const REG_FIFO_SRC: u8 = 0x2F;
/// Register address of `INT1_CFG`.
pub const REG_INT1_CFG: u8 = 0x30;
/// Register address of `INT1_SRC`.
pub const REG_INT1_SRC: u8 = 0x31;
/// Register address of `INT1_THS_XH`.
pub const REG_INT1_THS_XH: u8 = 0x32;
/// Register address of `INT1_THS_XL`.
pub const REG_INT1_THS_XL: u8 = 0x33;
/// Register address of `INT1_THS_YH`.
pub const REG_INT1_THS_YH: u8 = 0x34;
/// Register address of `INT1_THS_YL`.
pub const REG_INT1_THS_YL: u8 = 0x35;
/// Register address of `INT1_THS_ZH`.
pub const REG_INT1_THS_ZH: u8 = 0x36;
/// Register address of `INT1_THS_ZL`.
pub const REG_INT1_THS_ZL: u8 = 0x37;
/// Register address of `INT1_DURATION`.
pub const REG_INT1_DURATION: u8 = 0x38;

/// Value the `WHO_AM_I` register reports for this device.
pub const EXPECTED_DEVICE_ID: u8 = 0xD4;

// CTRL_REG1 fields.

/// Power-up and per-axis enable bits (PD, Zen, Xen, Yen).
pub const AXES_POWER_MASK: u8 = 0x0F;
/// Value enabling the sensor with all three axes active.
pub const AXES_POWER_ON: u8 = 0x0F;
/// Power-up bit; cleared in power-down mode.
pub const POWER_UP: u8 = 0x08;
/// Output data rate selection (bits 7:6).
pub const ODR_MASK: u8 = 0xC0;
/// Shift of the output data rate field.
pub const ODR_SHIFT: u8 = 6;
/// Low-pass cutoff mode selection (bits 5:4).
pub const LOW_PASS_CUTOFF_MASK: u8 = 0x30;
/// Shift of the low-pass cutoff mode field.
pub const LOW_PASS_CUTOFF_SHIFT: u8 = 4;
/// Combined data rate and low-pass cutoff fields (bits 7:4).
pub const RATE_AND_CUTOFF_MASK: u8 = 0xF0;

// CTRL_REG2 fields.

/// High-pass cutoff mode selection (bits 3:0).
pub const HIGH_PASS_CUTOFF_MASK: u8 = 0x0F;

// CTRL_REG3 fields.

/// Interrupt source selection nibble on the INT2/DRDY line.
pub const INT2_SOURCE_MASK: u8 = 0x0F;
/// Data-ready interrupt source bit.
pub const INT2_DATA_READY: u8 = 0x08;
/// FIFO watermark interrupt source bit.
pub const INT2_WATERMARK: u8 = 0x04;

// CTRL_REG4 fields.

/// Block-data-update and byte-order bits; zero selects continuous update
/// with little-endian output.
pub const BLOCK_UPDATE_ENDIAN_MASK: u8 = 0xC0;
/// Full-scale selection (bits 5:4).
pub const FULL_SCALE_MASK: u8 = 0x30;
/// Shift of the full-scale field.
pub const FULL_SCALE_SHIFT: u8 = 4;

// CTRL_REG5 fields.

/// Output selection field routing data through the filter stages.
pub const OUT_SEL_MASK: u8 = 0x03;
/// Output selection value routing data through the second low-pass stage.
pub const OUT_SEL_LPF2: u8 = 0x03;
/// High-pass filter enable bit.
pub const HIGH_PASS_ENABLE: u8 = 0x10;
/// FIFO enable bit.
pub const FIFO_ENABLE: u8 = 0x40;

// FIFO_CTRL_REG fields.

/// FIFO mode selection (bits 7:5).
pub const FIFO_MODE_MASK: u8 = 0xE0;
/// FIFO mode value selecting stream mode.
pub const FIFO_MODE_STREAM: u8 = 0x40;
/// FIFO mode value selecting bypass mode.
pub const FIFO_MODE_BYPASS: u8 = 0x00;
/// FIFO watermark threshold (bits 4:0).
pub const FIFO_WATERMARK_MASK: u8 = 0x1F;
/// Largest representable FIFO watermark.
pub const FIFO_WATERMARK_MAX: u8 = 31;

/// Bitfield representation of the `STATUS_REG` register (address `0x27`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // X-axis data available (bit 0).
    pub x_data_available: bool,
    // Y-axis data available (bit 1).
    pub y_data_available: bool,
    // Z-axis data available (bit 2).
    pub z_data_available: bool,
    // New data available on all axes (bit 3).
    pub data_available: bool,
    // X-axis overrun (bit 4).
    pub x_overrun: bool,
    // Y-axis overrun (bit 5).
    pub y_overrun: bool,
    // Z-axis overrun (bit 6).
    pub z_overrun: bool,
    // Overrun on all axes (bit 7).
    pub overrun: bool,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value.into_bytes()[0]
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status {{ ZYXOR: {}, ZOR: {}, YOR: {}, XOR: {}, ZYXDA: {}, ZDA: {}, YDA: {}, XDA: {} }}",
            self.overrun(),
            self.z_overrun(),
            self.y_overrun(),
            self.x_overrun(),
            self.data_available(),
            self.z_data_available(),
            self.y_data_available(),
            self.x_data_available()
        );
    }
}

/// Bitfield representation of the `FIFO_SRC_REG` register (address `0x2F`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoSource {
    // Current FIFO fill level (bits 4:0).
    pub level: B5,
    // FIFO empty flag (bit 5).
    pub empty: bool,
    // FIFO overrun flag (bit 6).
    pub overrun: bool,
    // Watermark reached flag (bit 7).
    pub watermark: bool,
}

impl From<u8> for FifoSource {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<FifoSource> for u8 {
    fn from(value: FifoSource) -> Self {
        value.into_bytes()[0]
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FifoSource {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "FifoSource {{ WTM: {}, OVRN: {}, EMPTY: {}, FSS: {} }}",
            self.watermark(),
            self.overrun(),
            self.empty(),
            self.level()
        );
    }
}
