//! Device host
//!
//! Drives a [`Device`] through its lifecycle and dispatches attribute and
//! command calls to it. Attributes are committed in one step once the device
//! has built all of them.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::device::{
    AttrValue, AttrWriteType, Attribute, AttributeInfo, AttributeTable, CommandInfo, CommandInput,
    CommandOutput, DevState, Device,
};
use crate::error::{AdsError, Result};

pub struct DeviceServer {
    device: Arc<dyn Device>,
    attributes: RwLock<Arc<AttributeTable>>,
}

impl DeviceServer {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self {
            device,
            attributes: RwLock::new(Arc::new(AttributeTable::new())),
        }
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Run `init_device` then `initialize_dynamic_attributes`
    ///
    /// Any failure puts the device in `FAULT` and leaves no dynamic
    /// attributes registered.
    pub fn start(&self) -> Result<()> {
        let name = self.device.name().to_string();

        if let Err(e) = self.device.init_device() {
            error!("{}: init_device failed: {}", name, e);
            self.device.set_state(DevState::Fault, e.to_string());
            return Err(e);
        }

        match self.device.initialize_dynamic_attributes() {
            Ok(table) => {
                info!(
                    "{}: {} dynamic attribute(s) registered: {:?}",
                    name,
                    table.len(),
                    table.names()
                );
                *self.attributes.write() = Arc::new(table);
                Ok(())
            },
            Err(e) => {
                error!("{}: dynamic attribute initialization failed: {}", name, e);
                self.device.set_state(DevState::Fault, e.to_string());
                Err(e)
            },
        }
    }

    /// Run `delete_device`
    pub fn stop(&self) -> Result<()> {
        let result = self.device.delete_device();
        if let Err(e) = &result {
            warn!("{}: delete_device failed: {}", self.device.name(), e);
        }
        result
    }

    pub fn state(&self) -> DevState {
        self.device.state()
    }

    pub fn status(&self) -> String {
        self.device.status()
    }

    pub fn attribute_list(&self) -> Vec<AttributeInfo> {
        self.attributes.read().iter().map(|a| a.info()).collect()
    }

    pub fn command_list(&self) -> Vec<CommandInfo> {
        self.device.command_list()
    }

    pub fn read_attribute(&self, name: &str) -> Result<AttrValue> {
        let attr = self.prepare_attribute(name)?;
        attr.read()
    }

    /// Convert `value` to the attribute's type and write it
    ///
    /// Returns the converted value that was written.
    pub fn write_attribute(&self, name: &str, value: &serde_json::Value) -> Result<AttrValue> {
        let attr = self.prepare_attribute(name)?;
        // Access violation takes precedence over conversion errors
        if attr.write_type() == AttrWriteType::Read {
            return Err(AdsError::read_only(name));
        }
        let value = AttrValue::from_json(attr.data_type(), value)?;
        attr.write(value.clone())?;
        Ok(value)
    }

    pub fn command_inout(&self, name: &str, argin: CommandInput) -> Result<CommandOutput> {
        self.prepare()?;
        if !self.device.command_list().iter().any(|c| c.name == name) {
            return Err(AdsError::command_not_found(name));
        }
        self.device.command_inout(name, argin)
    }

    fn prepare_attribute(&self, name: &str) -> Result<Arc<Attribute>> {
        self.prepare()?;
        self.attributes
            .read()
            .get(name)
            .ok_or_else(|| AdsError::attribute_not_found(name))
    }

    fn prepare(&self) -> Result<()> {
        self.device.always_executed_hook();
        let state = self.device.state();
        if state.is_operational() {
            Ok(())
        } else {
            Err(AdsError::state(format!(
                "{} is {}: {}",
                self.device.name(),
                state,
                self.device.status()
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::device::{AttrDataType, StateCell};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory device with one read-only and one writable attribute
    struct MemoryDevice {
        state: StateCell,
        fail_attributes: bool,
        hook_calls: AtomicUsize,
        value: Arc<Mutex<i64>>,
    }

    impl MemoryDevice {
        fn new(fail_attributes: bool) -> Self {
            Self {
                state: StateCell::new(),
                fail_attributes,
                hook_calls: AtomicUsize::new(0),
                value: Arc::new(Mutex::new(7)),
            }
        }
    }

    impl Device for MemoryDevice {
        fn name(&self) -> &str {
            "test/memory/1"
        }

        fn init_device(&self) -> Result<()> {
            self.state.set(DevState::On, "ready");
            Ok(())
        }

        fn initialize_dynamic_attributes(&self) -> Result<AttributeTable> {
            if self.fail_attributes {
                return Err(AdsError::symbol_not_found("MAIN.missing"));
            }
            let mut table = AttributeTable::new();
            table.insert(Attribute::new("constant", AttrDataType::Int, || {
                Ok(AttrValue::Int(1))
            }));
            let r = self.value.clone();
            let w = self.value.clone();
            table.insert(
                Attribute::new("counter", AttrDataType::Int, move || {
                    Ok(AttrValue::Int(*r.lock()))
                })
                .with_writer(move |v| match v {
                    AttrValue::Int(i) => {
                        *w.lock() = i;
                        Ok(())
                    },
                    other => Err(AdsError::data(format!("not an int: {}", other))),
                }),
            );
            table.insert(
                Attribute::new("sink", AttrDataType::Int, || {
                    Err(AdsError::protocol("sink cannot be read back"))
                })
                .with_writer(|_| Ok(())),
            );
            Ok(table)
        }

        fn always_executed_hook(&self) {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn delete_device(&self) -> Result<()> {
            self.state.set(DevState::Off, "stopped");
            Ok(())
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
    }

    #[test]
    fn test_start_commits_attributes() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(false)));
        server.start().unwrap();
        assert_eq!(server.state(), DevState::On);
        let names: Vec<_> = server.attribute_list().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["constant", "counter", "sink"]);
    }

    #[test]
    fn test_failed_start_faults_without_attributes() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(true)));
        assert!(server.start().is_err());
        assert_eq!(server.state(), DevState::Fault);
        assert!(server.status().contains("MAIN.missing"));
        assert!(server.attribute_list().is_empty());
        assert!(matches!(
            server.read_attribute("constant"),
            Err(AdsError::StateError(_))
        ));
    }

    #[test]
    fn test_write_dispatch() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(false)));
        server.start().unwrap();

        let written = server
            .write_attribute("counter", &serde_json::json!(42))
            .unwrap();
        assert_eq!(written, AttrValue::Int(42));
        assert_eq!(server.read_attribute("counter").unwrap(), AttrValue::Int(42));

        let err = server
            .write_attribute("constant", &serde_json::json!("not even a number"))
            .unwrap_err();
        assert!(matches!(err, AdsError::AccessViolation(_)));

        let err = server
            .write_attribute("counter", &serde_json::json!(1.5))
            .unwrap_err();
        assert!(matches!(err, AdsError::InvalidArgument(_)));

        assert!(matches!(
            server.read_attribute("nope"),
            Err(AdsError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn test_write_does_not_depend_on_read_back() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(false)));
        server.start().unwrap();

        let written = server.write_attribute("sink", &serde_json::json!(5)).unwrap();
        assert_eq!(written, AttrValue::Int(5));
        assert!(server.read_attribute("sink").is_err());
    }

    #[test]
    fn test_hook_runs_before_every_call() {
        let device = Arc::new(MemoryDevice::new(false));
        let server = DeviceServer::new(device.clone());
        server.start().unwrap();

        server.read_attribute("constant").unwrap();
        server.read_attribute("counter").unwrap();
        let _ = server.command_inout("anything", CommandInput::Void);
        assert_eq!(device.hook_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unknown_command() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(false)));
        server.start().unwrap();
        assert!(matches!(
            server.command_inout("read_float_array", CommandInput::Void),
            Err(AdsError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_stop_turns_device_off() {
        let server = DeviceServer::new(Arc::new(MemoryDevice::new(false)));
        server.start().unwrap();
        server.stop().unwrap();
        assert_eq!(server.state(), DevState::Off);
        assert!(server.read_attribute("constant").is_err());
    }
}
