//! Device state and status

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Device state as seen by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DevState {
    /// Not initialized yet
    #[default]
    Unknown,
    /// Connected and serving
    On,
    /// Shut down
    Off,
    /// Startup failed
    Fault,
}

impl DevState {
    pub fn is_operational(&self) -> bool {
        matches!(self, DevState::On)
    }
}

impl fmt::Display for DevState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevState::Unknown => write!(f, "UNKNOWN"),
            DevState::On => write!(f, "ON"),
            DevState::Off => write!(f, "OFF"),
            DevState::Fault => write!(f, "FAULT"),
        }
    }
}

/// State plus human-readable status, shared between the device and its host
#[derive(Debug, Default)]
pub struct StateCell {
    inner: RwLock<(DevState, String)>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new((DevState::Unknown, "Device not initialized".to_string())),
        }
    }

    pub fn state(&self) -> DevState {
        self.inner.read().0
    }

    pub fn status(&self) -> String {
        self.inner.read().1.clone()
    }

    pub fn set(&self, state: DevState, status: impl Into<String>) {
        *self.inner.write() = (state, status.into());
    }
}
