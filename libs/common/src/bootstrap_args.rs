//! Startup arguments understood by the shared bootstrap helpers
//!
//! A service parses its own clap `Args` and converts them into [`ServiceArgs`].

use tracing::Level;

#[derive(Debug, Clone)]
pub struct ServiceArgs {
    pub log_level: String,
    /// `host:port` that replaces the configured API address
    pub bind_address: Option<String>,
    pub config: Option<String>,
    pub no_color: bool,
    /// Check configuration and exit
    pub validate: bool,
}

impl Default for ServiceArgs {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_address: None,
            config: None,
            no_color: false,
            validate: false,
        }
    }
}

impl ServiceArgs {
    /// Console level; `warning` is taken as `warn`, anything unparsable as `info`
    pub fn parse_log_level(&self) -> Level {
        let raw = self.log_level.trim();
        let raw = if raw.eq_ignore_ascii_case("warning") {
            "warn"
        } else {
            raw
        };
        raw.parse().unwrap_or(Level::INFO)
    }

    /// `--config` if given, otherwise `config/<service>.yaml`
    pub fn get_config_path(&self, service_name: &str) -> String {
        self.config
            .clone()
            .unwrap_or_else(|| format!("config/{}.yaml", service_name))
    }
}
