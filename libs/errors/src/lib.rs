//! Outward-facing errors of the device services
//!
//! Service crates keep their own domain error (`AdsError` in adsrv) and either
//! convert it into [`ServiceError`] or implement [`ServiceErrorTrait`] on it to
//! get codes, categories and the HTTP status mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body carried in API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// HTTP status of the failed request
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorInfo {
    /// Error with status 500 until [`ErrorInfo::with_code`] says otherwise
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Service-level error
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to a field device
    #[error("Communication error: {0}")]
    Communication(String),

    /// Error reported by the field device protocol
    #[error("Protocol error: {protocol}: {message}")]
    Protocol { protocol: String, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound { .. } => 404,
            Self::Protocol { .. } | Self::Communication(_) => 502,
            Self::ServiceUnavailable(_) => 503,
            Self::Timeout(_) => 504,
            Self::Configuration(_) | Self::Serialization(_) | Self::Internal(_) => 500,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let info = ErrorInfo::new(self.to_string()).with_code(self.status_code());
        info.with_details(format!("error_code: {}", self.error_code()))
    }
}

impl ServiceErrorTrait for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Communication(_) => "COMMUNICATION_ERROR",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Communication(_) => ErrorCategory::Connection,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::BadRequest(_) | Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Forbidden(_) => ErrorCategory::Permission,
            Self::ServiceUnavailable(_) => ErrorCategory::Network,
            Self::Serialization(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// Error classification used for status mapping and log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Configuration,
    /// Service or device not reachable / not serving
    Network,
    Timeout,
    Validation,
    NotFound,
    Permission,
    /// Field device rejected the request
    Protocol,
    /// Field device link failed
    Connection,
    Internal,
    Unknown,
}

/// Common interface of domain errors
pub trait ServiceErrorTrait: std::error::Error + Send + Sync + 'static {
    /// Stable code for API bodies and logs
    fn error_code(&self) -> &'static str;

    fn category(&self) -> ErrorCategory;

    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Connection
        )
    }

    #[cfg(feature = "axum-support")]
    fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Permission => StatusCode::FORBIDDEN,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Protocol | ErrorCategory::Connection => StatusCode::BAD_GATEWAY,
            ErrorCategory::Network => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::Configuration | ErrorCategory::Internal | ErrorCategory::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Level at which the error is worth logging
    fn log_level(&self) -> tracing::Level {
        match self.category() {
            ErrorCategory::Internal | ErrorCategory::Configuration => tracing::Level::ERROR,
            ErrorCategory::Validation | ErrorCategory::NotFound | ErrorCategory::Permission => {
                tracing::Level::INFO
            },
            _ => tracing::Level::WARN,
        }
    }
}
