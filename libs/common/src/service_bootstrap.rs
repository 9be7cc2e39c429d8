//! Service identity, startup banner and logging setup

use crate::logging::{self, LogConfig};
use crate::service_config::LoggingConfig;
use tracing::{info, Level};

const BANNER: &str = r#"
  █████╗ ██████╗ ███████╗██████╗ ██╗   ██╗
 ██╔══██╗██╔══██╗██╔════╝██╔══██╗██║   ██║
 ███████║██║  ██║███████╗██████╔╝██║   ██║
 ██╔══██║██║  ██║╚════██║██╔══██╗╚██╗ ██╔╝
 ██║  ██║██████╔╝███████║██║  ██║ ╚████╔╝
 ╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝  ╚═╝  ╚═══╝
"#;

pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub default_port: u16,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_port: u16) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: description.into(),
            default_port,
        }
    }
}

pub fn print_startup_banner(service: &ServiceInfo) {
    info!("{}", BANNER);
    info!(
        " {} v{} - {}",
        service.name.to_uppercase(),
        service.version,
        service.description
    );
    info!(" Default Port: {}", service.default_port);
}

/// Set up console and file logging for `service`
///
/// The console level is `level_override` (command line), then `logging.level`,
/// then info. Files go to `<log root>/<service>/`.
pub fn init_logging(
    service: &ServiceInfo,
    logging_config: Option<&LoggingConfig>,
    level_override: Option<Level>,
    ansi: bool,
) -> anyhow::Result<()> {
    logging::init_log_root(logging_config.map(|c| c.dir.as_str()));

    let configured = logging_config.and_then(|c| c.level.parse::<Level>().ok());
    let log_config = LogConfig {
        service_name: service.name.clone(),
        log_dir: logging::get_log_root().join(&service.name),
        console_level: level_override.or(configured).unwrap_or(Level::INFO),
        enable_file: logging_config.map_or(true, |c| c.file),
        ansi,
    };

    logging::init_with_config(log_config).map_err(|e| anyhow::anyhow!("{}", e))
}
