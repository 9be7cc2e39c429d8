//! PLC data types
//!
//! Declared IEC 61131-3 type names as reported by the ADS symbol table, and the
//! value type PLC reads decode into.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{AdsError, Result};

/// Default length of a `STRING` without explicit size
pub const DEFAULT_STRING_LEN: usize = 80;

/// Declared PLC data type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlcType {
    Bool,
    Byte,
    USInt,
    SInt,
    Word,
    UInt,
    Int,
    DWord,
    UDInt,
    DInt,
    LWord,
    ULInt,
    LInt,
    Real,
    LReal,
    /// `STRING(n)`: n characters plus the terminating NUL
    String(usize),
    /// `ARRAY [lo..hi(, lo..hi)*] OF T`, `len` is the total element count
    Array { element: Box<PlcType>, len: usize },
    /// Structures, function blocks, enums and anything else without a scalar codec
    Other(String),
}

type Pattern = LazyLock<std::result::Result<Regex, regex::Error>>;

static ARRAY_TYPE: Pattern =
    LazyLock::new(|| Regex::new(r"(?i)^ARRAY\s*\[([^\]]+)\]\s*OF\s+(.+)$"));
static STRING_TYPE: Pattern =
    LazyLock::new(|| Regex::new(r"(?i)^STRING\s*(?:[\(\[]\s*(\d+)\s*[\)\]])?$"));

fn type_regex(pattern: &'static Pattern) -> Result<&'static Regex> {
    pattern
        .as_ref()
        .map_err(|e| AdsError::internal(format!("type pattern: {e}")))
}

impl PlcType {
    /// Parse a declared type name, e.g. `LREAL`, `STRING(20)`, `ARRAY [0..99] OF REAL`
    pub fn parse(declared: &str) -> Result<Self> {
        let declared = declared.trim();
        if declared.is_empty() {
            return Err(AdsError::data("empty PLC type name"));
        }

        let array_re = type_regex(&ARRAY_TYPE)?;
        if let Some(caps) = array_re.captures(declared) {
            let mut len = 1usize;
            for dim in caps[1].split(',') {
                len = len
                    .checked_mul(parse_dimension(dim)?)
                    .ok_or_else(|| AdsError::data(format!("array too large: {}", declared)))?;
            }
            let element = Self::parse(&caps[2])?;
            return Ok(PlcType::Array {
                element: Box::new(element),
                len,
            });
        }

        let string_re = type_regex(&STRING_TYPE)?;
        if let Some(caps) = string_re.captures(declared) {
            let len = match caps.get(1) {
                Some(n) => n
                    .as_str()
                    .parse::<usize>()
                    .map_err(|e| AdsError::data(format!("bad STRING length in {declared}: {e}")))?,
                None => DEFAULT_STRING_LEN,
            };
            return Ok(PlcType::String(len));
        }

        let ty = match declared.to_ascii_uppercase().as_str() {
            "BOOL" | "BIT" => PlcType::Bool,
            "BYTE" => PlcType::Byte,
            "USINT" => PlcType::USInt,
            "SINT" => PlcType::SInt,
            "WORD" => PlcType::Word,
            "UINT" => PlcType::UInt,
            "INT" => PlcType::Int,
            "DWORD" => PlcType::DWord,
            "UDINT" => PlcType::UDInt,
            "DINT" => PlcType::DInt,
            "LWORD" => PlcType::LWord,
            "ULINT" => PlcType::ULInt,
            "LINT" => PlcType::LInt,
            "REAL" => PlcType::Real,
            "LREAL" => PlcType::LReal,
            _ => PlcType::Other(declared.to_string()),
        };
        Ok(ty)
    }

    /// Size in bytes, `None` when the layout is unknown
    pub fn size(&self) -> Option<usize> {
        let size = match self {
            PlcType::Bool | PlcType::Byte | PlcType::USInt | PlcType::SInt => 1,
            PlcType::Word | PlcType::UInt | PlcType::Int => 2,
            PlcType::DWord | PlcType::UDInt | PlcType::DInt | PlcType::Real => 4,
            PlcType::LWord | PlcType::ULInt | PlcType::LInt | PlcType::LReal => 8,
            PlcType::String(n) => return n.checked_add(1),
            PlcType::Array { element, len } => {
                return element.size().and_then(|s| s.checked_mul(*len))
            },
            PlcType::Other(_) => return None,
        };
        Some(size)
    }

    /// Number of elements: the array length, 1 for everything else
    pub fn array_size(&self) -> usize {
        match self {
            PlcType::Array { len, .. } => *len,
            _ => 1,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.integer_range().is_some()
    }

    /// Inclusive value range of integer types
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            PlcType::Byte | PlcType::USInt => (0, u8::MAX as i128),
            PlcType::SInt => (i8::MIN as i128, i8::MAX as i128),
            PlcType::Word | PlcType::UInt => (0, u16::MAX as i128),
            PlcType::Int => (i16::MIN as i128, i16::MAX as i128),
            PlcType::DWord | PlcType::UDInt => (0, u32::MAX as i128),
            PlcType::DInt => (i32::MIN as i128, i32::MAX as i128),
            PlcType::LWord | PlcType::ULInt => (0, u64::MAX as i128),
            PlcType::LInt => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }
}

fn parse_dimension(dim: &str) -> Result<usize> {
    let (lo, hi) = dim
        .split_once("..")
        .ok_or_else(|| AdsError::data(format!("bad array bounds: {}", dim.trim())))?;
    let lo: i64 = lo
        .trim()
        .parse()
        .map_err(|e| AdsError::data(format!("bad array bound {}: {e}", lo.trim())))?;
    let hi: i64 = hi
        .trim()
        .parse()
        .map_err(|e| AdsError::data(format!("bad array bound {}: {e}", hi.trim())))?;
    if hi < lo {
        return Err(AdsError::data(format!("empty array bounds: {}", dim.trim())));
    }
    hi.checked_sub(lo)
        .and_then(|span| span.checked_add(1))
        .and_then(|len| usize::try_from(len).ok())
        .ok_or_else(|| AdsError::data(format!("array bounds too wide: {}", dim.trim())))
}

impl fmt::Display for PlcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcType::Bool => write!(f, "BOOL"),
            PlcType::Byte => write!(f, "BYTE"),
            PlcType::USInt => write!(f, "USINT"),
            PlcType::SInt => write!(f, "SINT"),
            PlcType::Word => write!(f, "WORD"),
            PlcType::UInt => write!(f, "UINT"),
            PlcType::Int => write!(f, "INT"),
            PlcType::DWord => write!(f, "DWORD"),
            PlcType::UDInt => write!(f, "UDINT"),
            PlcType::DInt => write!(f, "DINT"),
            PlcType::LWord => write!(f, "LWORD"),
            PlcType::ULInt => write!(f, "ULINT"),
            PlcType::LInt => write!(f, "LINT"),
            PlcType::Real => write!(f, "REAL"),
            PlcType::LReal => write!(f, "LREAL"),
            PlcType::String(n) => write!(f, "STRING({})", n),
            PlcType::Array { element, len } => write!(f, "ARRAY [0..{}] OF {}", len - 1, element),
            PlcType::Other(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// PLC Value Type
// ============================================================================

/// Value decoded from (or encoded into) PLC memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlcValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
}

impl From<bool> for PlcValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PlcValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for PlcValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for PlcValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PlcValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl PlcValue {
    /// Try to convert to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Try to convert to i64, only integral floats convert
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Real(f) if f.fract() == 0.0 && f.is_finite() => {
                if *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            },
            Self::Real(_) => None,
            Self::Bool(b) => Some(i64::from(*b)),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Real(f) => Some(*f != 0.0),
            Self::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
        }
    }

    /// Convert to String
    pub fn as_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Real(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(PlcType::parse("BOOL").unwrap(), PlcType::Bool);
        assert_eq!(PlcType::parse(" lreal ").unwrap(), PlcType::LReal);
        assert_eq!(PlcType::parse("UDINT").unwrap(), PlcType::UDInt);
        assert_eq!(PlcType::parse("INT").unwrap().size(), Some(2));
    }

    #[test]
    fn test_parse_string_lengths() {
        assert_eq!(PlcType::parse("STRING").unwrap(), PlcType::String(80));
        assert_eq!(PlcType::parse("STRING(20)").unwrap(), PlcType::String(20));
        assert_eq!(PlcType::parse("STRING(20)").unwrap().size(), Some(21));
    }

    #[test]
    fn test_parse_arrays() {
        let ty = PlcType::parse("ARRAY [0..99] OF REAL").unwrap();
        assert_eq!(ty.array_size(), 100);
        assert_eq!(ty.size(), Some(400));

        let ty = PlcType::parse("ARRAY [1..3,1..4] OF INT").unwrap();
        assert_eq!(ty.array_size(), 12);
        assert_eq!(ty.size(), Some(24));

        let ty = PlcType::parse("ARRAY [-5..5] OF ST_Sample").unwrap();
        assert_eq!(ty.array_size(), 11);
        assert_eq!(ty.size(), None);
    }

    #[test]
    fn test_parse_rejects_inverted_bounds() {
        assert!(PlcType::parse("ARRAY [5..1] OF INT").is_err());
        assert!(PlcType::parse("").is_err());
    }

    #[test]
    fn test_extreme_array_bounds() {
        let err = PlcType::parse("ARRAY [-9223372036854775808..9223372036854775807] OF REAL")
            .unwrap_err();
        assert!(matches!(err, AdsError::DataError(_)));

        // Element count fits, byte size does not
        let ty = PlcType::parse("ARRAY [0..4611686018427387903] OF LREAL").unwrap();
        assert_eq!(ty.array_size(), 1 << 62);
        assert_eq!(ty.size(), None);
    }

    #[test]
    fn test_unknown_types_kept() {
        let ty = PlcType::parse("FB_Motor").unwrap();
        assert_eq!(ty, PlcType::Other("FB_Motor".to_string()));
        assert_eq!(ty.array_size(), 1);
        assert!(ty.size().is_none());
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(PlcType::SInt.integer_range(), Some((-128, 127)));
        assert_eq!(PlcType::Word.integer_range(), Some((0, 65535)));
        assert!(PlcType::Real.integer_range().is_none());
        assert!(!PlcType::Bool.is_integer());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(PlcValue::Real(3.0).as_i64(), Some(3));
        assert_eq!(PlcValue::Real(3.5).as_i64(), None);
        assert_eq!(PlcValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(PlcValue::from("on").as_bool(), Some(true));
        assert_eq!(PlcValue::Bool(true).as_string(), "true");
    }
}
