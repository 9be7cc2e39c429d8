//! Device hosting layer
//!
//! A [`Device`] provides lifecycle hooks, dynamic attributes and commands;
//! [`DeviceServer`] hosts one device and dispatches client calls to it.

pub mod attribute;
pub mod command;
pub mod server;
pub mod state;

use std::collections::BTreeMap;

pub use attribute::{
    AttrDataType, AttrValue, AttrWriteType, Attribute, AttributeInfo, AttributeTable,
};
pub use command::{CommandInfo, CommandInput, CommandOutput, LongStringArray};
pub use server::DeviceServer;
pub use state::{DevState, StateCell};

use crate::error::{AdsError, Result};

/// Lifecycle and dispatch hooks of a hosted device
pub trait Device: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire resources; called once before anything else
    fn init_device(&self) -> Result<()>;

    /// Build the dynamic attribute table; the host commits it as a whole
    fn initialize_dynamic_attributes(&self) -> Result<AttributeTable>;

    /// Called before every attribute access and command
    fn always_executed_hook(&self) {}

    /// Release resources acquired in `init_device`
    fn delete_device(&self) -> Result<()>;

    fn state(&self) -> DevState;

    fn status(&self) -> String;

    fn set_state(&self, state: DevState, status: String);

    /// Extra read-only facts shown in the device description
    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn command_list(&self) -> Vec<CommandInfo> {
        Vec::new()
    }

    fn command_inout(&self, name: &str, _argin: CommandInput) -> Result<CommandOutput> {
        Err(AdsError::command_not_found(name))
    }
}
