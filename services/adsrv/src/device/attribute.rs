//! Device attributes
//!
//! An attribute is a named, typed value with a read closure and, when
//! writable, a write closure. The closures carry whatever backs the value
//! (for PLC endpoints: the resolved symbol).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{AdsError, Result};

/// Scalar data type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrDataType {
    Bool,
    Int,
    Float,
    String,
}

impl FromStr for AttrDataType {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" => Ok(AttrDataType::Bool),
            "int" => Ok(AttrDataType::Int),
            "float" => Ok(AttrDataType::Float),
            "string" | "str" => Ok(AttrDataType::String),
            other => Err(AdsError::invalid_argument(format!(
                "unknown attribute type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AttrDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrDataType::Bool => write!(f, "bool"),
            AttrDataType::Int => write!(f, "int"),
            AttrDataType::Float => write!(f, "float"),
            AttrDataType::String => write!(f, "string"),
        }
    }
}

/// Whether clients may write an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttrWriteType {
    Read,
    ReadWrite,
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttrValue {
    pub fn data_type(&self) -> AttrDataType {
        match self {
            AttrValue::Bool(_) => AttrDataType::Bool,
            AttrValue::Int(_) => AttrDataType::Int,
            AttrValue::Float(_) => AttrDataType::Float,
            AttrValue::String(_) => AttrDataType::String,
        }
    }

    /// Convert a client-supplied JSON value to `data_type`
    ///
    /// Floats accept any number, ints accept integral numbers only.
    pub fn from_json(data_type: AttrDataType, value: &serde_json::Value) -> Result<Self> {
        let converted = match data_type {
            AttrDataType::Bool => value.as_bool().map(AttrValue::Bool),
            AttrDataType::Int => value.as_i64().map(AttrValue::Int).or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| AttrValue::Int(f as i64))
            }),
            AttrDataType::Float => value.as_f64().map(AttrValue::Float),
            AttrDataType::String => value.as_str().map(|s| AttrValue::String(s.to_string())),
        };
        converted.ok_or_else(|| {
            AdsError::invalid_argument(format!("expected {} value, got {}", data_type, value))
        })
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::String(s) => write!(f, "{}", s),
        }
    }
}

pub type AttrReader = Box<dyn Fn() -> Result<AttrValue> + Send + Sync>;
pub type AttrWriter = Box<dyn Fn(AttrValue) -> Result<()> + Send + Sync>;

/// Attribute metadata exposed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub data_type: AttrDataType,
    pub writable: AttrWriteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Dynamic attribute
pub struct Attribute {
    name: String,
    data_type: AttrDataType,
    description: Option<String>,
    reader: AttrReader,
    writer: Option<AttrWriter>,
}

impl Attribute {
    /// Read-only attribute
    pub fn new(
        name: impl Into<String>,
        data_type: AttrDataType,
        reader: impl Fn() -> Result<AttrValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: None,
            reader: Box::new(reader),
            writer: None,
        }
    }

    /// Make the attribute writable
    pub fn with_writer(
        mut self,
        writer: impl Fn(AttrValue) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> AttrDataType {
        self.data_type
    }

    pub fn write_type(&self) -> AttrWriteType {
        if self.writer.is_some() {
            AttrWriteType::ReadWrite
        } else {
            AttrWriteType::Read
        }
    }

    pub fn read(&self) -> Result<AttrValue> {
        (self.reader)()
    }

    /// Write `value`; read-only attributes reject with an access violation
    pub fn write(&self, value: AttrValue) -> Result<()> {
        match &self.writer {
            Some(writer) => writer(value),
            None => Err(AdsError::read_only(&self.name)),
        }
    }

    pub fn info(&self) -> AttributeInfo {
        AttributeInfo {
            name: self.name.clone(),
            data_type: self.data_type,
            writable: self.write_type(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("write_type", &self.write_type())
            .finish()
    }
}

/// Ordered set of attributes keyed by name
#[derive(Debug, Default)]
pub struct AttributeTable {
    attributes: Vec<Arc<Attribute>>,
    index: HashMap<String, usize>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `attr`, replacing (in place) any attribute with the same name
    pub fn insert(&mut self, attr: Attribute) -> Option<Arc<Attribute>> {
        let attr = Arc::new(attr);
        match self.index.get(attr.name()) {
            Some(&pos) => Some(std::mem::replace(&mut self.attributes[pos], attr)),
            None => {
                self.index.insert(attr.name().to_string(), self.attributes.len());
                self.attributes.push(attr);
                None
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Attribute>> {
        self.index.get(name).map(|&pos| self.attributes[pos].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Attribute>> {
        self.attributes.iter()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn memory_attr(name: &str, initial: f64) -> Attribute {
        let cell = Arc::new(Mutex::new(initial));
        let r = cell.clone();
        Attribute::new(name, AttrDataType::Float, move || Ok(AttrValue::Float(*r.lock())))
            .with_writer(move |v| match v {
                AttrValue::Float(f) => {
                    *cell.lock() = f;
                    Ok(())
                },
                other => Err(AdsError::data(format!("not a float: {}", other))),
            })
    }

    #[test]
    fn test_read_only_rejects_write() {
        let attr = Attribute::new("output", AttrDataType::Bool, || Ok(AttrValue::Bool(true)));
        assert_eq!(attr.write_type(), AttrWriteType::Read);
        assert_eq!(attr.read().unwrap(), AttrValue::Bool(true));
        let err = attr.write(AttrValue::Bool(false)).unwrap_err();
        assert!(matches!(err, AdsError::AccessViolation(_)));
    }

    #[test]
    fn test_writable_roundtrip() {
        let attr = memory_attr("setpoint", 0.0);
        assert_eq!(attr.write_type(), AttrWriteType::ReadWrite);
        attr.write(AttrValue::Float(3.5)).unwrap();
        assert_eq!(attr.read().unwrap(), AttrValue::Float(3.5));
    }

    #[test]
    fn test_table_last_insert_wins_in_place() {
        let mut table = AttributeTable::new();
        assert!(table.insert(memory_attr("a", 1.0)).is_none());
        assert!(table.insert(memory_attr("b", 2.0)).is_none());
        assert!(table.insert(memory_attr("a", 9.0)).is_some());

        assert_eq!(table.len(), 2);
        assert_eq!(table.names(), vec!["a", "b"]);
        assert_eq!(table.get("a").unwrap().read().unwrap(), AttrValue::Float(9.0));
        assert!(table.get("c").is_none());
    }

    #[test]
    fn test_from_json_conversions() {
        assert_eq!(
            AttrValue::from_json(AttrDataType::Float, &json!(3)).unwrap(),
            AttrValue::Float(3.0)
        );
        assert_eq!(
            AttrValue::from_json(AttrDataType::Int, &json!(4.0)).unwrap(),
            AttrValue::Int(4)
        );
        assert!(AttrValue::from_json(AttrDataType::Int, &json!(4.5)).is_err());
        assert!(AttrValue::from_json(AttrDataType::Bool, &json!("yes")).is_err());
        assert_eq!(
            AttrValue::from_json(AttrDataType::String, &json!("abc")).unwrap(),
            AttrValue::String("abc".into())
        );
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!("Float".parse::<AttrDataType>().unwrap(), AttrDataType::Float);
        assert!("double".parse::<AttrDataType>().is_err());
    }

    #[test]
    fn test_info_serialization() {
        let info = memory_attr("setpoint", 0.0).info();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["data_type"], "float");
        assert_eq!(json["writable"], "READ_WRITE");
        assert!(json.get("description").is_none());
    }
}
