//! Logging for the device services
//!
//! One `timestamp [LEVEL] message` layout for the console and for the optional
//! daily-rolling file. The filter sits behind a reload layer so the admin API can
//! change it while the service runs.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Environment variable overriding the log root directory
pub const LOG_DIR_ENV: &str = "ADSRV_LOG_DIR";

const DEFAULT_LOG_ROOT: &str = "logs";

/// Bracketed tag and ANSI color of a level
fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::ERROR => ("[ERROR]", "\x1b[31m"),
        Level::WARN => ("[WARN]", "\x1b[33m"),
        Level::INFO => ("[INFO]", "\x1b[32m"),
        Level::DEBUG => ("[DEBUG]", "\x1b[34m"),
        Level::TRACE => ("[TRACE]", "\x1b[35m"),
    }
}

/// `2026-01-05T08:12:44.809113Z [INFO] adsrv: Device ON`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        write!(
            writer,
            "{} ",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ")
        )?;

        let (tag, color) = level_style(*event.metadata().level());
        if writer.has_ansi_escapes() {
            write!(writer, "{}{}\x1b[0m ", color, tag)?;
        } else {
            write!(writer, "{} ", tag)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Reload handle of the installed filter plus the directive it currently holds
struct FilterControl {
    handle: reload::Handle<EnvFilter, Registry>,
    current: Mutex<String>,
}

static FILTER: OnceLock<FilterControl> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_ROOT: OnceLock<PathBuf> = OnceLock::new();

fn root_from(config_dir: Option<&str>) -> PathBuf {
    std::env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| config_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_ROOT))
}

/// Fix the log root once: `ADSRV_LOG_DIR`, then `config_dir`, then `logs`
pub fn init_log_root(config_dir: Option<&str>) {
    LOG_ROOT.get_or_init(|| root_from(config_dir));
}

pub fn get_log_root() -> PathBuf {
    LOG_ROOT.get().cloned().unwrap_or_else(|| root_from(None))
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub service_name: String,
    /// Directory of the rolling `<service>.log` file
    pub log_dir: PathBuf,
    /// Level used when RUST_LOG is not set
    pub console_level: Level,
    pub enable_file: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "adsrv".to_string(),
            log_dir: get_log_root(),
            console_level: Level::INFO,
            enable_file: true,
            ansi: true,
        }
    }
}

/// Directive used when RUST_LOG is absent; HTTP stack noise stays at warn
fn default_filter(config: &LogConfig) -> String {
    format!(
        "{},tower_http=warn,hyper=warn",
        config.console_level.as_str().to_lowercase()
    )
}

fn file_writer(
    log_dir: &Path,
    service_name: &str,
) -> std::io::Result<tracing_appender::non_blocking::NonBlocking> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, format!("{}.log", service_name));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // A second init keeps the first guard; its writer is dropped with the failed subscriber
    let _ = FILE_GUARD.set(guard);
    Ok(writer)
}

/// Install the global subscriber
pub fn init_with_config(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(&config));
    let (filter_layer, handle) = reload::Layer::new(EnvFilter::try_new(&directive)?);

    let console = fmt::layer()
        .with_ansi(config.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file = if config.enable_file {
        let writer = file_writer(&config.log_dir, &config.service_name)?;
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(BracketedLevelFormat)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console)
        .with(file)
        .try_init()?;

    let _ = FILTER.set(FilterControl {
        handle,
        current: Mutex::new(directive),
    });

    if config.enable_file {
        tracing::info!("Logging to {}", config.log_dir.display());
    }
    Ok(())
}

/// Replace the active filter
///
/// Accepts a plain level ("debug") or a full filter directive ("info,adsrv=debug").
pub fn set_log_level(level: &str) -> Result<(), String> {
    let control = FILTER
        .get()
        .ok_or("Logging not initialized with reload support")?;

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;
    control
        .handle
        .reload(filter)
        .map_err(|e| format!("Failed to reload log filter: {}", e))?;

    match control.current.lock() {
        Ok(mut current) => *current = level.to_string(),
        Err(poisoned) => *poisoned.into_inner() = level.to_string(),
    }

    tracing::info!("Log level changed to: {}", level);
    Ok(())
}

/// Active filter directive, `unknown` before [`init_with_config`]
pub fn get_log_level() -> String {
    FILTER
        .get()
        .and_then(|control| control.current.lock().ok().map(|c| c.clone()))
        .unwrap_or_else(|| "unknown".to_string())
}
