//! Virtual PLC Implementation
//!
//! In-memory PLC with a declared symbol table, for testing and for running the
//! service without hardware.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::error::{AdsError, Result};
use crate::plc::codec;
use crate::plc::connection::{PlcConnection, PlcState, SymbolInfo};
use crate::plc::types::{PlcType, PlcValue};

/// Index group of PLC memory (`%M` area)
const VIRTUAL_INDEX_GROUP: u32 = 0x4020;

struct VirtualSymbol {
    info: SymbolInfo,
    data: Vec<u8>,
}

/// Virtual PLC for testing
pub struct VirtualPlc {
    endpoint: String,
    reachable: bool,
    symbols: RwLock<HashMap<String, VirtualSymbol>>,
    next_offset: AtomicUsize,
    open: AtomicBool,
    open_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

// TwinCAT resolves symbol names case-insensitively
fn key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl VirtualPlc {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reachable: true,
            symbols: RwLock::new(HashMap::new()),
            next_offset: AtomicUsize::new(0),
            open: AtomicBool::new(false),
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// A PLC that refuses every connection attempt
    pub fn unreachable(endpoint: impl Into<String>) -> Self {
        Self {
            reachable: false,
            ..Self::new(endpoint)
        }
    }

    /// Declare a zero-initialised symbol
    pub fn with_symbol(self, name: &str, declared_type: &str) -> Result<Self> {
        self.add_symbol(name, declared_type)?;
        Ok(self)
    }

    /// Declare a symbol with an initial scalar value
    pub fn with_value(self, name: &str, declared_type: &str, value: PlcValue) -> Result<Self> {
        self.add_symbol(name, declared_type)?;
        self.poke(name, &value)?;
        Ok(self)
    }

    pub fn add_symbol(&self, name: &str, declared_type: &str) -> Result<()> {
        let plc_type = PlcType::parse(declared_type)?;
        let size = plc_type.size().ok_or_else(|| {
            AdsError::config(format!(
                "virtual symbol {} has no known layout ({})",
                name, declared_type
            ))
        })?;

        let offset = self.next_offset.fetch_add(size, Ordering::SeqCst);
        let info = SymbolInfo {
            name: name.trim().to_string(),
            index_group: VIRTUAL_INDEX_GROUP,
            index_offset: offset as u32,
            size,
            type_name: declared_type.trim().to_string(),
            plc_type,
        };
        debug!("Virtual symbol {} ({}, {} bytes)", info.name, info.type_name, size);

        self.symbols.write().insert(
            key(name),
            VirtualSymbol {
                info,
                data: vec![0u8; size],
            },
        );
        Ok(())
    }

    /// Set a scalar symbol's value directly, bypassing the connection state
    pub fn poke(&self, name: &str, value: &PlcValue) -> Result<()> {
        let mut symbols = self.symbols.write();
        let symbol = symbols
            .get_mut(&key(name))
            .ok_or_else(|| AdsError::symbol_not_found(name))?;
        let bytes = codec::encode(&symbol.info.plc_type, value)?;
        symbol.data[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// Fill an array symbol element by element
    pub fn poke_elements(&self, name: &str, values: &[PlcValue]) -> Result<()> {
        let mut symbols = self.symbols.write();
        let symbol = symbols
            .get_mut(&key(name))
            .ok_or_else(|| AdsError::symbol_not_found(name))?;
        let PlcType::Array { element, len } = &symbol.info.plc_type else {
            return Err(AdsError::data(format!("{} is not an array", name)));
        };
        if values.len() > *len {
            return Err(AdsError::data(format!(
                "{} values for {} elements of {}",
                values.len(),
                len,
                name
            )));
        }
        let mut at = 0;
        for value in values {
            let bytes = codec::encode(element, value)?;
            symbol.data[at..at + bytes.len()].copy_from_slice(&bytes);
            at += bytes.len();
        }
        Ok(())
    }

    /// Current value of a scalar symbol
    pub fn peek(&self, name: &str) -> Result<PlcValue> {
        let symbols = self.symbols.read();
        let symbol = symbols
            .get(&key(name))
            .ok_or_else(|| AdsError::symbol_not_found(name))?;
        codec::decode(&symbol.info.plc_type, &symbol.data)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AdsError::not_connected())
        }
    }

    fn copy_out(&self, name: &str, buf: &mut [u8]) -> Result<()> {
        let symbols = self.symbols.read();
        let symbol = symbols
            .get(&key(name))
            .ok_or_else(|| AdsError::protocol(format!("{}: symbol not found (0x710)", name)))?;
        if buf.len() > symbol.data.len() {
            return Err(AdsError::protocol(format!(
                "{}: invalid size (0x705), {} > {} bytes",
                name,
                buf.len(),
                symbol.data.len()
            )));
        }
        buf.copy_from_slice(&symbol.data[..buf.len()]);
        Ok(())
    }
}

impl std::fmt::Debug for VirtualPlc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualPlc")
            .field("endpoint", &self.endpoint)
            .field("symbols", &self.symbols.read().len())
            .field("open", &self.open)
            .finish()
    }
}

impl PlcConnection for VirtualPlc {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn open(&self) -> Result<()> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(AdsError::connection(format!(
                "open {}: target port not found (0x6)",
                self.endpoint
            )));
        }
        self.open.store(true, Ordering::SeqCst);
        info!("Virtual PLC connection opened: {}", self.endpoint);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        info!("Virtual PLC connection closed: {}", self.endpoint);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn read_state(&self) -> Result<PlcState> {
        self.ensure_open()?;
        Ok(PlcState {
            ads_state: "Run".to_string(),
            device_state: 0,
        })
    }

    fn get_symbol(&self, name: &str) -> Result<SymbolInfo> {
        self.ensure_open()?;
        self.symbols
            .read()
            .get(&key(name))
            .map(|s| s.info.clone())
            .ok_or_else(|| AdsError::symbol_not_found(name))
    }

    fn read_raw(&self, symbol: &SymbolInfo, buf: &mut [u8]) -> Result<()> {
        self.ensure_open()?;
        self.copy_out(&symbol.name, buf)
    }

    fn write_raw(&self, symbol: &SymbolInfo, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let mut symbols = self.symbols.write();
        let target = symbols.get_mut(&key(&symbol.name)).ok_or_else(|| {
            AdsError::protocol(format!("{}: symbol not found (0x710)", symbol.name))
        })?;
        if data.len() > target.data.len() {
            return Err(AdsError::protocol(format!(
                "{}: invalid size (0x705), {} > {} bytes",
                symbol.name,
                data.len(),
                target.data.len()
            )));
        }
        target.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_by_name(&self, name: &str, buf: &mut [u8]) -> Result<()> {
        self.ensure_open()?;
        self.copy_out(name, buf)
    }
}
