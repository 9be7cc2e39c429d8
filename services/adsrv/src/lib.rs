//! TwinCAT ADS device service
//!
//! Exposes PLC variables as attributes of a hosted device. A manifest of
//! `ads_name, label, access[, type]` lines is resolved against the PLC symbol
//! table at startup; each scalar symbol becomes a typed attribute whose reads
//! and writes go straight to the PLC. The device also provides the
//! `read_float_array` command for bulk `REAL` reads.
//!
//! Layers:
//! - [`plc`]: PLC types, codec and connections (ADS over TCP, virtual)
//! - [`device`]: device trait, attributes, commands and the device host
//! - [`adapter`]: the TwinCAT ADS device
//! - [`api`]: HTTP interface

pub mod adapter;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod device;
pub mod error;
pub mod manifest;
pub mod plc;

pub use adapter::{AdapterState, TwincatAds, READ_FLOAT_ARRAY};
pub use config::{AppConfig, DeviceProperties, PlcProtocol};
pub use device::{DevState, Device, DeviceServer};
pub use error::{AdsError, Result};
