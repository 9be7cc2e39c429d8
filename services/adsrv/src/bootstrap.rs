//! Service Bootstrap and Initialization
//!
//! Command-line arguments, logging setup and configuration validation.

use clap::Parser;
use tracing::{debug, info};

use common::service_bootstrap::ServiceInfo;

use crate::config::{AppConfig, DEFAULT_PORT};
use crate::error::Result;
use crate::manifest;

pub use common::bootstrap_args::ServiceArgs;

/// Service name used for the banner, log directory and default config path
pub const SERVICE_NAME: &str = "adsrv";

/// Command-line arguments for adsrv
#[derive(Parser, Debug, Clone)]
#[command(
    name = "adsrv",
    version = env!("CARGO_PKG_VERSION"),
    about = "TwinCAT ADS Device Service",
    long_about = None
)]
pub struct Args {
    /// Configuration file (defaults to config/adsrv.yaml)
    #[arg(short = 'c', long, env = "ADSRV_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Bind address for the API server; overrides api.host/api.port
    #[arg(short = 'b', long)]
    pub bind_address: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Validation mode - parse configuration and manifest without connecting
    #[arg(long)]
    pub validate: bool,
}

impl From<Args> for ServiceArgs {
    fn from(args: Args) -> Self {
        ServiceArgs {
            log_level: args.log_level.unwrap_or_else(|| "info".to_string()),
            bind_address: args.bind_address,
            config: args.config,
            no_color: args.no_color,
            validate: args.validate,
        }
    }
}

pub fn create_service_info() -> ServiceInfo {
    ServiceInfo::new(SERVICE_NAME, "TwinCAT ADS Device Service", DEFAULT_PORT)
}

/// Initialize logging
///
/// A level given on the command line wins over `logging.level`.
pub fn initialize_logging(
    args: &Args,
    service_info: &ServiceInfo,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let level_override = args
        .log_level
        .as_ref()
        .map(|_| ServiceArgs::from(args.clone()).parse_log_level());

    common::service_bootstrap::init_logging(
        service_info,
        Some(&config.logging),
        level_override,
        !args.no_color,
    )
}

/// Resolve the API bind address, command line first
pub fn bind_address(args: &ServiceArgs, config: &AppConfig) -> String {
    args.bind_address
        .clone()
        .unwrap_or_else(|| config.api.bind_address())
}

/// Check configuration and manifest without touching the PLC
pub fn validate_configuration(config: &AppConfig) -> Result<()> {
    debug!("Validating configuration");
    config.validate()?;

    let descriptors = manifest::parse_manifest(&config.device.scalar_symbols)?;
    for d in &descriptors {
        debug!("manifest: {} -> {} ({})", d.ads_name, d.label, d.access);
    }
    info!(
        "Configuration valid: device {} at {} with {} endpoint(s)",
        config.device.name,
        config.device.endpoint(),
        descriptors.len()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "adsrv",
            "--config",
            "/etc/adsrv.yaml",
            "-l",
            "debug",
            "--validate",
        ]);
        assert_eq!(args.config.as_deref(), Some("/etc/adsrv.yaml"));
        assert!(args.validate);
        assert!(!args.no_color);

        let service_args: ServiceArgs = args.into();
        assert_eq!(service_args.parse_log_level(), tracing::Level::DEBUG);
        assert_eq!(service_args.get_config_path(SERVICE_NAME), "/etc/adsrv.yaml");
    }

    #[test]
    fn test_default_config_path() {
        let args: ServiceArgs = Args::parse_from(["adsrv"]).into();
        assert_eq!(args.log_level, "info");
        assert_eq!(args.get_config_path(SERVICE_NAME), "config/adsrv.yaml");
    }

    #[test]
    fn test_bind_address_override() {
        let config = AppConfig::default();
        let mut args = ServiceArgs::default();
        assert_eq!(bind_address(&args, &config), "0.0.0.0:6010");

        args.bind_address = Some("127.0.0.1:7000".into());
        assert_eq!(bind_address(&args, &config), "127.0.0.1:7000");
    }

    #[test]
    fn test_validate_rejects_bad_manifest() {
        let mut config = AppConfig::default();
        assert!(validate_configuration(&config).is_ok());

        config.device.scalar_symbols = vec!["MAIN.x".into()];
        assert!(validate_configuration(&config).is_err());
    }
}
