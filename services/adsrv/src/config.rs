//! Service configuration
//!
//! Layered with figment: built-in defaults, then the YAML file, then `ADSRV_`
//! environment variables (`__` separates nested keys, e.g.
//! `ADSRV_DEVICE__AMS_PORT=801`).

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use common::{ApiConfig, LoggingConfig, DEFAULT_API_HOST};

use crate::error::{AdsError, Result};
use crate::manifest;

/// Default API port
pub const DEFAULT_PORT: u16 = 6010;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ADSRV_";

/// Manifest used when no `scalar_symbols` are configured
pub const DEFAULT_SCALAR_SYMBOL: &str = "MAIN.subroutine.bOutputActive, output, ro";

/// Backend used to reach the PLC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlcProtocol {
    /// ADS over TCP through the AMS router
    #[default]
    Ads,
    /// In-memory PLC built from `virtual_symbols`
    Virtual,
}

/// Symbol declaration for the virtual PLC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirtualSymbolConfig {
    pub name: String,
    /// Declared PLC type, e.g. `LREAL` or `ARRAY [0..199] OF REAL`
    #[serde(rename = "type")]
    pub plc_type: String,
    /// Initial value: a scalar, or a list for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Device properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceProperties {
    /// Device name used in logs and API responses
    #[serde(default = "default_device_name")]
    pub name: String,

    /// AMS NetID of an established route, e.g. `127.0.0.1.1.1` or `5.12.82.20.1.1`
    pub ams_netid: String,

    /// ADS port, typically 801 for TwinCAT2 and 851 for TwinCAT3
    pub ams_port: u16,

    /// Host of the AMS router, defaults to the first four NetID octets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Socket timeout for ADS requests in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub protocol: PlcProtocol,

    /// Symbol manifest, one `<ads_name>, <label>, <access>[, <type>]` per line
    #[serde(default = "default_scalar_symbols")]
    pub scalar_symbols: Vec<String>,

    #[serde(default)]
    pub virtual_symbols: Vec<VirtualSymbolConfig>,
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            ams_netid: "127.0.0.1.1.1".to_string(),
            ams_port: 851,
            ip_address: None,
            timeout_ms: default_timeout_ms(),
            protocol: PlcProtocol::Ads,
            scalar_symbols: default_scalar_symbols(),
            virtual_symbols: Vec::new(),
        }
    }
}

fn default_device_name() -> String {
    "twincat/ads/1".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_scalar_symbols() -> Vec<String> {
    vec![DEFAULT_SCALAR_SYMBOL.to_string()]
}

impl DeviceProperties {
    /// Parsed AMS NetID
    pub fn netid(&self) -> Result<[u8; 6]> {
        parse_netid(&self.ams_netid)
    }

    /// Host running the AMS router
    pub fn router_host(&self) -> Result<String> {
        if let Some(ip) = &self.ip_address {
            return Ok(ip.clone());
        }
        let [a, b, c, d, _, _] = self.netid()?;
        Ok(Ipv4Addr::new(a, b, c, d).to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ams_netid, self.ams_port)
    }

    /// Validate properties and the symbol manifest without touching the PLC
    pub fn validate(&self) -> Result<()> {
        self.netid()?;
        if self.ams_port == 0 {
            return Err(AdsError::config("ams_port must be greater than 0"));
        }
        if self.timeout_ms == 0 {
            return Err(AdsError::config("timeout_ms must be greater than 0"));
        }
        if let Some(ip) = &self.ip_address {
            if ip.trim().is_empty() {
                return Err(AdsError::config("ip_address must not be empty"));
            }
        }
        for line in &self.scalar_symbols {
            manifest::parse_line(line)?;
        }
        if self.protocol == PlcProtocol::Virtual {
            for symbol in &self.virtual_symbols {
                if symbol.name.trim().is_empty() {
                    return Err(AdsError::config("virtual symbol with empty name"));
                }
            }
        }
        Ok(())
    }
}

/// Parse a dotted six-octet AMS NetID
pub fn parse_netid(netid: &str) -> Result<[u8; 6]> {
    let parts: Vec<&str> = netid.trim().split('.').collect();
    if parts.len() != 6 {
        return Err(AdsError::config(format!(
            "Invalid AMS NetID '{}': expected 6 octets, got {}",
            netid,
            parts.len()
        )));
    }

    let mut octets = [0u8; 6];
    for (octet, part) in octets.iter_mut().zip(&parts) {
        *octet = part.trim().parse().map_err(|e| {
            AdsError::config(format!("Invalid AMS NetID '{}': octet '{}': {}", netid, part, e))
        })?;
    }
    Ok(octets)
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceProperties,

    #[serde(default = "default_api_config")]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_config() -> ApiConfig {
    ApiConfig {
        host: DEFAULT_API_HOST.to_string(),
        port: DEFAULT_PORT,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceProperties::default(),
            api: default_api_config(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `path` (if it exists), then environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Yaml::file(path));
        } else {
            debug!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
        }

        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AdsError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string (no environment overlay)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(|e| AdsError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.device.validate()?;
        if self.api.port == 0 {
            return Err(AdsError::config("api.port must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.port, DEFAULT_PORT);
        assert_eq!(config.device.ams_port, 851);
        assert_eq!(
            config.device.scalar_symbols,
            vec!["MAIN.subroutine.bOutputActive, output, ro".to_string()]
        );
        assert_eq!(config.device.protocol, PlcProtocol::Ads);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_netid() {
        assert_eq!(parse_netid("5.12.82.20.1.1").unwrap(), [5, 12, 82, 20, 1, 1]);
        assert!(parse_netid("127.0.0.1.1").is_err());
        assert!(parse_netid("127.0.0.1.1.256").is_err());
        assert!(parse_netid("a.b.c.d.e.f").is_err());
    }

    #[test]
    fn test_router_host() {
        let mut props = DeviceProperties {
            ams_netid: "192.168.0.10.1.1".to_string(),
            ..Default::default()
        };
        assert_eq!(props.router_host().unwrap(), "192.168.0.10");

        props.ip_address = Some("10.0.0.5".to_string());
        assert_eq!(props.router_host().unwrap(), "10.0.0.5");
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = AppConfig::from_yaml(
            r#"
device:
  ams_netid: "5.12.82.20.1.1"
  ams_port: 801
  scalar_symbols:
    - "MAIN.x, output, ro"
    - "MAIN.y, setpoint, rw"
api:
  port: 7010
"#,
        )
        .unwrap();
        assert_eq!(config.device.ams_port, 801);
        assert_eq!(config.device.scalar_symbols.len(), 2);
        assert_eq!(config.device.timeout_ms, 1000);
        assert_eq!(config.api.port, 7010);
        assert_eq!(config.api.host, DEFAULT_API_HOST);
    }

    #[test]
    fn test_from_yaml_rejects_bad_manifest() {
        let err = AppConfig::from_yaml(
            r#"
device:
  ams_netid: "5.12.82.20.1.1"
  ams_port: 851
  scalar_symbols:
    - "MAIN.x, output"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AdsError::ManifestError(_)));
    }

    #[test]
    fn test_virtual_symbols() {
        let config = AppConfig::from_yaml(
            r#"
device:
  ams_netid: "127.0.0.1.1.1"
  ams_port: 851
  protocol: virtual
  virtual_symbols:
    - name: MAIN.fTemp
      type: LREAL
      value: 21.5
    - name: MAIN.array1
      type: ARRAY [0..199] OF REAL
"#,
        )
        .unwrap();
        assert_eq!(config.device.protocol, PlcProtocol::Virtual);
        assert_eq!(config.device.virtual_symbols.len(), 2);
        assert_eq!(
            config.device.virtual_symbols[0].value,
            Some(serde_json::json!(21.5))
        );
        assert!(config.device.virtual_symbols[1].value.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "device:\n  ams_netid: \"10.1.2.3.1.1\"\n  ams_port: 851\n  name: plc/line1"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.device.name, "plc/line1");
        assert_eq!(config.device.netid().unwrap(), [10, 1, 2, 3, 1, 1]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.device.name, "twincat/ads/1");
    }
}
