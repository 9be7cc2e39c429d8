//! Basic library shared by the TwinCAT ADS device services
//!
//! Provides:
//! - logging bootstrap (console + rolling file, reloadable filter)
//! - service metadata, banner and command-line base arguments
//! - API and logging configuration sections
//! - API response envelopes and the HTTP error type
//! - graceful shutdown signal handling

pub mod api_types;
pub mod bootstrap_args;
pub mod logging;
pub mod service_bootstrap;
pub mod service_config;
pub mod shutdown;

pub use service_config::{ApiConfig, LoggingConfig, DEFAULT_API_HOST};

pub use api_types::{
    DeviceHealth, ErrorInfo, ErrorResponse, HealthStatus, ServiceStatus, SuccessResponse,
};

#[cfg(feature = "axum")]
pub use api_types::AppError;
