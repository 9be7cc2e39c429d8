//! Symbol manifest parsing
//!
//! Each `scalar_symbols` line describes one endpoint:
//!
//! ```text
//! <ads_name>, <label>, <access>[, <type>]
//! MAIN.subroutine.bOutputActive, output, rw
//! GVL.fSetpoint, setpoint, rw, float
//! ```
//!
//! `access` is `rw` for read-write; any other token means read-only. The
//! optional `type` (`bool`, `int`, `float`, `string`) overrides the type taken
//! from the PLC declaration.
//!
//! `int` attributes hold an `i64`. An `LWORD` or `ULINT` endpoint therefore reads
//! and writes values up to `i64::MAX` only; a larger value in the PLC makes the
//! read fail with a data error.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::device::AttrDataType;
use crate::error::{AdsError, Result};

/// Access mode of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    /// `rw` selects read-write, everything else is read-only
    pub fn from_token(token: &str) -> Self {
        if token == "rw" {
            Access::ReadWrite
        } else {
            Access::ReadOnly
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Access::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::ReadOnly => write!(f, "ro"),
            Access::ReadWrite => write!(f, "rw"),
        }
    }
}

/// One parsed manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Dotted PLC symbol name
    pub ads_name: String,
    /// Client-visible attribute name
    pub label: String,
    pub access: Access,
    /// Explicit attribute type, `None` to follow the PLC declaration
    pub data_type: Option<AttrDataType>,
}

/// Parse one manifest line
pub fn parse_line(line: &str) -> Result<EndpointDescriptor> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 && fields.len() != 4 {
        return Err(AdsError::manifest(format!(
            "expected '<ads_name>, <label>, <access>[, <type>]', got {} field(s) in '{}'",
            fields.len(),
            line.trim()
        )));
    }

    let (ads_name, label, access) = (fields[0], fields[1], fields[2]);
    if ads_name.is_empty() {
        return Err(AdsError::manifest(format!("empty ADS name in '{}'", line.trim())));
    }
    if label.is_empty() {
        return Err(AdsError::manifest(format!("empty label in '{}'", line.trim())));
    }

    let data_type = match fields.get(3) {
        Some(tag) => Some(AttrDataType::from_str(tag).map_err(|_| {
            AdsError::manifest(format!(
                "unknown type '{}' in '{}' (expected bool, int, float or string)",
                tag,
                line.trim()
            ))
        })?),
        None => None,
    };

    Ok(EndpointDescriptor {
        ads_name: ads_name.to_string(),
        label: label.to_string(),
        access: Access::from_token(access),
        data_type,
    })
}

/// Parse every line, failing on the first malformed one
pub fn parse_manifest<S: AsRef<str>>(lines: &[S]) -> Result<Vec<EndpointDescriptor>> {
    lines.iter().map(|l| parse_line(l.as_ref())).collect()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_line() {
        let d = parse_line("MAIN.subroutine.bOutputActive, output, ro").unwrap();
        assert_eq!(d.ads_name, "MAIN.subroutine.bOutputActive");
        assert_eq!(d.label, "output");
        assert_eq!(d.access, Access::ReadOnly);
        assert_eq!(d.data_type, None);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let d = parse_line("  MAIN.y ,setpoint ,   rw  ").unwrap();
        assert_eq!(d.ads_name, "MAIN.y");
        assert_eq!(d.label, "setpoint");
        assert_eq!(d.access, Access::ReadWrite);
    }

    #[test]
    fn test_unknown_access_is_read_only() {
        assert_eq!(parse_line("MAIN.x, a, w").unwrap().access, Access::ReadOnly);
        assert_eq!(parse_line("MAIN.x, a, RW").unwrap().access, Access::ReadOnly);
        assert_eq!(parse_line("MAIN.x, a, ").unwrap().access, Access::ReadOnly);
    }

    #[test]
    fn test_explicit_type() {
        let d = parse_line("GVL.fSetpoint, setpoint, rw, float").unwrap();
        assert_eq!(d.data_type, Some(AttrDataType::Float));
        assert!(parse_line("GVL.fSetpoint, setpoint, rw, double").is_err());
    }

    #[test]
    fn test_wrong_field_count() {
        assert!(matches!(
            parse_line("MAIN.x, output"),
            Err(AdsError::ManifestError(_))
        ));
        assert!(parse_line("MAIN.x, output, ro, int, extra").is_err());
        assert!(parse_line("").is_err());
    }

    #[test]
    fn test_empty_name_or_label() {
        assert!(parse_line(", output, ro").is_err());
        assert!(parse_line("MAIN.x, , ro").is_err());
    }

    #[test]
    fn test_parse_manifest_stops_at_first_error() {
        let lines = ["MAIN.x, output, ro", "broken", "MAIN.y, setpoint, rw"];
        assert!(parse_manifest(&lines).is_err());

        let lines = ["MAIN.x, output, ro", "MAIN.y, setpoint, rw"];
        assert_eq!(parse_manifest(&lines).unwrap().len(), 2);
    }
}
