//! PLC connection abstraction
//!
//! The adapter talks to the PLC only through [`PlcConnection`]. All calls are
//! blocking; implementations serialize access to the underlying transport.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{AdsError, Result};
use crate::plc::codec;
use crate::plc::types::{PlcType, PlcValue};

/// ADS state and device state reported by the PLC runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlcState {
    /// ADS state name, e.g. `Run`, `Stop`, `Config`
    pub ads_state: String,
    /// Vendor-specific device state word
    pub device_state: u16,
}

impl fmt::Display for PlcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ads: {}, machine: {}", self.ads_state, self.device_state)
    }
}

/// Symbol table entry resolved on the PLC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub index_group: u32,
    pub index_offset: u32,
    /// Total size in bytes
    pub size: usize,
    /// Declared type name as reported by the PLC
    pub type_name: String,
    pub plc_type: PlcType,
}

impl SymbolInfo {
    pub fn array_size(&self) -> usize {
        self.plc_type.array_size()
    }
}

/// Blocking PLC connection
pub trait PlcConnection: Send + Sync {
    /// Human-readable endpoint, e.g. `5.12.82.20.1.1:851`
    fn endpoint(&self) -> String;

    fn open(&self) -> Result<()>;

    fn close(&self) -> Result<()>;

    fn is_open(&self) -> bool;

    fn read_state(&self) -> Result<PlcState>;

    /// Resolve a symbol by its dotted name
    fn get_symbol(&self, name: &str) -> Result<SymbolInfo>;

    /// Read `buf.len()` bytes at the symbol's location
    fn read_raw(&self, symbol: &SymbolInfo, buf: &mut [u8]) -> Result<()>;

    /// Write `data` at the symbol's location
    fn write_raw(&self, symbol: &SymbolInfo, data: &[u8]) -> Result<()>;

    /// Read `buf.len()` bytes of a symbol addressed by name, without a symbol lookup
    fn read_by_name(&self, name: &str, buf: &mut [u8]) -> Result<()>;
}

/// Resolved symbol bound to the connection it was resolved on
pub struct PlcSymbol {
    info: SymbolInfo,
    conn: Arc<dyn PlcConnection>,
}

impl PlcSymbol {
    /// Look `name` up on the PLC and bind the result to `conn`
    pub fn resolve(conn: Arc<dyn PlcConnection>, name: &str) -> Result<Self> {
        let info = conn.get_symbol(name)?;
        Ok(Self { info, conn })
    }

    pub fn info(&self) -> &SymbolInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn plc_type(&self) -> &PlcType {
        &self.info.plc_type
    }

    pub fn array_size(&self) -> usize {
        self.info.array_size()
    }

    /// Live read of the current value
    pub fn read(&self) -> Result<PlcValue> {
        let size = self.value_size()?;
        let mut buf = vec![0u8; size];
        self.conn.read_raw(&self.info, &mut buf)?;
        codec::decode(&self.info.plc_type, &buf)
    }

    /// Convert `value` to the symbol's PLC type and write it
    pub fn write(&self, value: &PlcValue) -> Result<()> {
        let data = codec::encode(&self.info.plc_type, value)?;
        self.conn.write_raw(&self.info, &data)
    }

    fn value_size(&self) -> Result<usize> {
        self.info.plc_type.size().ok_or_else(|| {
            AdsError::data(format!(
                "{} has unsupported type {}",
                self.info.name, self.info.type_name
            ))
        })
    }
}

impl fmt::Debug for PlcSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlcSymbol")
            .field("info", &self.info)
            .field("endpoint", &self.conn.endpoint())
            .finish()
    }
}
