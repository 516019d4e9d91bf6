#![no_std]

mod error;

pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;

pub use crate::config::Config;
pub use crate::device::L3gd20;
pub use crate::error::{Access, Error, Result};

#[cfg(test)]
extern crate std;
