//! Request and response bodies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::device::{AttrDataType, AttrValue, AttributeInfo, CommandInfo, DevState};

/// Device description returned by `GET /api/device`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub state: DevState,
    pub status: String,
    /// Connection facts such as endpoint and ADS state
    pub properties: BTreeMap<String, String>,
    pub attributes: Vec<AttributeInfo>,
    pub commands: Vec<CommandInfo>,
}

/// Live attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub data_type: AttrDataType,
    pub value: AttrValue,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteAttributeRequest {
    pub value: serde_json::Value,
}

/// Body of `POST /api/commands/read_float_array`
#[derive(Debug, Clone, Deserialize)]
pub struct ReadFloatArrayRequest {
    /// Number of values, negative for the whole array
    pub count: i32,
    pub symbol_name: String,
}
