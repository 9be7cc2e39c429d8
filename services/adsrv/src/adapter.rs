//! TwinCAT ADS device
//!
//! Opens one PLC connection, turns the `scalar_symbols` manifest into dynamic
//! attributes bound to resolved PLC symbols, and provides the
//! `read_float_array` command.
//!
//! Lifecycle (one-directional, no reconnect):
//!
//! ```text
//! Uninitialized → Connecting → BuildingAttributes → Operational → Closed
//! ```

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, trace, warn};

use crate::config::DeviceProperties;
use crate::device::{
    AttrDataType, AttrValue, Attribute, AttributeTable, CommandInfo, CommandInput, CommandOutput,
    DevState, Device, StateCell,
};
use crate::error::{AdsError, Result};
use crate::manifest::{self, EndpointDescriptor};
use crate::plc::{self, codec, PlcConnection, PlcState, PlcSymbol, PlcType, PlcValue};

/// Name of the bulk float read command
pub const READ_FLOAT_ARRAY: &str = "read_float_array";

/// Adapter lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdapterState {
    Uninitialized,
    Connecting,
    /// Connection open, attributes not yet committed
    BuildingAttributes,
    Operational,
    Closed,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterState::Uninitialized => write!(f, "UNINITIALIZED"),
            AdapterState::Connecting => write!(f, "CONNECTING"),
            AdapterState::BuildingAttributes => write!(f, "BUILDING_ATTRIBUTES"),
            AdapterState::Operational => write!(f, "OPERATIONAL"),
            AdapterState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Label → resolved symbol, fixed once attributes are built
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Arc<PlcSymbol>>,
}

impl SymbolTable {
    pub fn get(&self, label: &str) -> Option<&Arc<PlcSymbol>> {
        self.symbols.get(label)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Attribute type for a declared PLC type
pub fn data_type_for(plc_type: &PlcType) -> Option<AttrDataType> {
    match plc_type {
        PlcType::Bool => Some(AttrDataType::Bool),
        PlcType::Real | PlcType::LReal => Some(AttrDataType::Float),
        PlcType::String(_) => Some(AttrDataType::String),
        t if t.is_integer() => Some(AttrDataType::Int),
        _ => None,
    }
}

fn to_attr_value(value: &PlcValue, data_type: AttrDataType) -> Result<AttrValue> {
    let converted = match data_type {
        AttrDataType::Bool => value.as_bool().map(AttrValue::Bool),
        AttrDataType::Int => value.as_i64().map(AttrValue::Int),
        AttrDataType::Float => value.as_f64().map(AttrValue::Float),
        AttrDataType::String => Some(AttrValue::String(value.as_string())),
    };
    converted.ok_or_else(|| {
        AdsError::data(format!(
            "cannot present {} '{}' as {}",
            value.type_name(),
            value,
            data_type
        ))
    })
}

impl From<AttrValue> for PlcValue {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Bool(b) => PlcValue::Bool(b),
            AttrValue::Int(i) => PlcValue::Int(i),
            AttrValue::Float(f) => PlcValue::Real(f),
            AttrValue::String(s) => PlcValue::String(s),
        }
    }
}

/// TwinCAT ADS device
pub struct TwincatAds {
    props: DeviceProperties,
    conn: Arc<dyn PlcConnection>,
    lifecycle: Mutex<AdapterState>,
    symbols: OnceLock<SymbolTable>,
    plc_state: RwLock<Option<PlcState>>,
    state: StateCell,
}

impl TwincatAds {
    pub fn new(props: DeviceProperties, conn: Arc<dyn PlcConnection>) -> Self {
        Self {
            props,
            conn,
            lifecycle: Mutex::new(AdapterState::Uninitialized),
            symbols: OnceLock::new(),
            plc_state: RwLock::new(None),
            state: StateCell::new(),
        }
    }

    /// Build the device with the connection selected in `props`
    pub fn from_properties(props: DeviceProperties) -> Result<Self> {
        props.validate()?;
        let conn = plc::create_connection(&props)?;
        Ok(Self::new(props, conn))
    }

    pub fn lifecycle(&self) -> AdapterState {
        *self.lifecycle.lock()
    }

    /// Symbol table, available once attributes are built
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.get()
    }

    /// ADS and device state read when the connection was opened
    pub fn plc_state(&self) -> Option<PlcState> {
        self.plc_state.read().clone()
    }

    /// Read `count` REAL values from `symbol_name`, the whole array when `count < 0`
    ///
    /// The count is checked against the symbol's size before any buffer is
    /// allocated; the values themselves come from a raw read by name, not the
    /// symbol table.
    pub fn read_float_array(&self, count: i32, symbol_name: &str) -> Result<Vec<f32>> {
        let symbol_name = symbol_name.trim();
        if symbol_name.is_empty() {
            return Err(AdsError::invalid_argument("symbol name must not be empty"));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let available = self.conn.get_symbol(symbol_name)?.size / codec::REAL_SIZE;
        let count = match usize::try_from(count) {
            Err(_) => available,
            Ok(n) if n > available => {
                return Err(AdsError::invalid_argument(format!(
                    "{} holds {} REAL value(s), {} requested",
                    symbol_name, available, n
                )));
            },
            Ok(n) => n,
        };
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; count * codec::REAL_SIZE];
        self.conn.read_by_name(symbol_name, &mut buf)?;
        let values = codec::decode_reals(&buf);
        debug!("{}: read {} REAL value(s) from {}", self.name(), values.len(), symbol_name);
        Ok(values)
    }

    fn enter(&self, expected: AdapterState, next: AdapterState) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if *lifecycle != expected {
            return Err(AdsError::state(format!(
                "{}: expected {} but adapter is {}",
                self.props.name, expected, *lifecycle
            )));
        }
        *lifecycle = next;
        Ok(())
    }

    fn build_attribute(
        &self,
        descriptor: &EndpointDescriptor,
        symbol: &Arc<PlcSymbol>,
    ) -> Result<Option<Attribute>> {
        if symbol.array_size() > 1 {
            warn!("{} is not a scalar. Ignoring.", descriptor.ads_name);
            return Ok(None);
        }

        let data_type = match descriptor.data_type {
            Some(t) => t,
            None => data_type_for(symbol.plc_type()).ok_or_else(|| {
                AdsError::data(format!(
                    "{} has unsupported type {}",
                    descriptor.ads_name,
                    symbol.info().type_name
                ))
            })?,
        };

        let initial = to_attr_value(&symbol.read()?, data_type)?;
        debug!("{} = {} ({})", descriptor.label, initial, data_type);

        let reader_symbol = symbol.clone();
        let mut attr = Attribute::new(descriptor.label.clone(), data_type, move || {
            to_attr_value(&reader_symbol.read()?, data_type)
        })
        .with_description(format!(
            "{} ({})",
            descriptor.ads_name,
            symbol.info().type_name
        ));

        if descriptor.access.is_writable() {
            let writer_symbol = symbol.clone();
            attr = attr.with_writer(move |value| writer_symbol.write(&PlcValue::from(value)));
        }
        Ok(Some(attr))
    }
}

impl Device for TwincatAds {
    fn name(&self) -> &str {
        &self.props.name
    }

    fn init_device(&self) -> Result<()> {
        self.enter(AdapterState::Uninitialized, AdapterState::Connecting)?;
        info!("{}: connecting to {}", self.props.name, self.conn.endpoint());

        self.conn.open()?;
        *self.lifecycle.lock() = AdapterState::BuildingAttributes;

        let plc_state = self.conn.read_state()?;
        debug!("states: {}", plc_state);
        *self.plc_state.write() = Some(plc_state);

        self.state.set(
            DevState::On,
            format!("Connected to {}", self.conn.endpoint()),
        );
        Ok(())
    }

    fn initialize_dynamic_attributes(&self) -> Result<AttributeTable> {
        if self.lifecycle() != AdapterState::BuildingAttributes {
            return Err(AdsError::state(format!(
                "{}: cannot build attributes while {}",
                self.props.name,
                self.lifecycle()
            )));
        }

        let descriptors = manifest::parse_manifest(&self.props.scalar_symbols)?;
        let mut table = AttributeTable::new();
        let mut symbols: HashMap<String, Arc<PlcSymbol>> = HashMap::new();

        for descriptor in &descriptors {
            debug!(
                "init: {}, {}, {}",
                descriptor.ads_name, descriptor.label, descriptor.access
            );
            let symbol = Arc::new(PlcSymbol::resolve(self.conn.clone(), &descriptor.ads_name)?);

            let Some(attr) = self.build_attribute(descriptor, &symbol)? else {
                continue;
            };

            if symbols.insert(descriptor.label.clone(), symbol).is_some() {
                warn!(
                    "Duplicate label {}: {} replaces the earlier entry",
                    descriptor.label, descriptor.ads_name
                );
            }
            table.insert(attr);
        }

        self.symbols
            .set(SymbolTable { symbols })
            .map_err(|_| AdsError::internal("symbol table already built"))?;
        self.enter(AdapterState::BuildingAttributes, AdapterState::Operational)?;
        Ok(table)
    }

    fn always_executed_hook(&self) {
        trace!("{}: always_executed_hook", self.props.name);
    }

    fn delete_device(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        let previous = *lifecycle;
        *lifecycle = AdapterState::Closed;

        match previous {
            AdapterState::BuildingAttributes | AdapterState::Operational => {
                self.state.set(DevState::Off, "Connection closed");
                self.conn.close()
            },
            AdapterState::Uninitialized | AdapterState::Connecting => {
                debug!("{}: connection never opened, nothing to close", self.props.name);
                if self.state.state() != DevState::Fault {
                    self.state.set(DevState::Off, "Device stopped");
                }
                Ok(())
            },
            AdapterState::Closed => {
                debug!("{}: already closed", self.props.name);
                Ok(())
            },
        }
    }

    fn state(&self) -> DevState {
        self.state.state()
    }

    fn status(&self) -> String {
        self.state.status()
    }

    fn set_state(&self, state: DevState, status: String) {
        self.state.set(state, status);
    }

    fn properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("endpoint".to_string(), self.conn.endpoint());
        props.insert("ams_netid".to_string(), self.props.ams_netid.clone());
        props.insert("ams_port".to_string(), self.props.ams_port.to_string());
        props.insert("lifecycle".to_string(), self.lifecycle().to_string());
        if let Some(plc_state) = self.plc_state() {
            props.insert("ads_state".to_string(), plc_state.ads_state);
            props.insert(
                "device_state".to_string(),
                plc_state.device_state.to_string(),
            );
        }
        props
    }

    fn command_list(&self) -> Vec<CommandInfo> {
        vec![CommandInfo {
            name: READ_FLOAT_ARRAY.to_string(),
            in_type: "DevVarLongStringArray".to_string(),
            in_doc: "Number of array values to read and ADS symbol name.\n\
                     [<num>, ] [<name>, ]\n\
                     Example: [200, ] [MAIN.array1, ]"
                .to_string(),
            out_type: "DevVarFloatArray".to_string(),
            out_doc: "array of float values, the entire array if <num> is negative".to_string(),
        }]
    }

    fn command_inout(&self, name: &str, argin: CommandInput) -> Result<CommandOutput> {
        match (name, argin) {
            (READ_FLOAT_ARRAY, CommandInput::LongStringArray(args)) => {
                let count = args.long(0)?;
                let symbol_name = args.string(0)?;
                self.read_float_array(count, symbol_name)
                    .map(CommandOutput::FloatArray)
            },
            (READ_FLOAT_ARRAY, CommandInput::Void) => Err(AdsError::invalid_argument(
                "read_float_array expects ([count], [symbol_name])",
            )),
            (other, _) => Err(AdsError::command_not_found(other)),
        }
    }
}
