//! `api` and `logging` configuration sections
//!
//! Device sections belong to the service crates.

use serde::{Deserialize, Serialize};

/// Default API bind host
pub const DEFAULT_API_HOST: &str = "0.0.0.0";

/// `api:` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_host")]
    pub host: String,
    /// No shared default; each service picks its own port
    pub port: u16,
}

impl ApiConfig {
    fn default_host() -> String {
        DEFAULT_API_HOST.to_string()
    }

    /// `host:port` for the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `logging:` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Log root; `ADSRV_LOG_DIR` takes precedence
    pub dir: String,
    /// Also write a daily-rolling file
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_logging_section_defaults() {
        let cfg: LoggingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, LoggingConfig::default());

        let cfg: LoggingConfig = serde_yaml::from_str("file: false").unwrap();
        assert!(!cfg.file);
        assert_eq!(cfg.level, "info");
    }

    #[test]
    fn test_api_bind_address() {
        let cfg: ApiConfig = serde_yaml::from_str("port: 6010").unwrap();
        assert_eq!(cfg.bind_address(), "0.0.0.0:6010");
    }
}
