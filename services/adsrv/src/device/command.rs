//! Device commands

use serde::{Deserialize, Serialize};

use crate::error::{AdsError, Result};

/// Argument of the form `([longs], [strings])`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongStringArray {
    pub lvalue: Vec<i32>,
    pub svalue: Vec<String>,
}

impl LongStringArray {
    pub fn new(lvalue: Vec<i32>, svalue: Vec<String>) -> Self {
        Self { lvalue, svalue }
    }

    pub fn long(&self, pos: usize) -> Result<i32> {
        self.lvalue.get(pos).copied().ok_or_else(|| {
            AdsError::invalid_argument(format!("missing integer argument #{}", pos))
        })
    }

    pub fn string(&self, pos: usize) -> Result<&str> {
        self.svalue
            .get(pos)
            .map(String::as_str)
            .ok_or_else(|| AdsError::invalid_argument(format!("missing string argument #{}", pos)))
    }
}

/// Command input
#[derive(Debug, Clone, PartialEq)]
pub enum CommandInput {
    Void,
    LongStringArray(LongStringArray),
}

/// Command output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Void,
    FloatArray(Vec<f32>),
}

/// Command metadata exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub in_type: String,
    pub in_doc: String,
    pub out_type: String,
    pub out_doc: String,
}
