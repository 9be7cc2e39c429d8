//! Error handling for the ADS device service
//!
//! One flat error enum covers configuration, PLC communication and the
//! host-level attribute/command failures. It converts into the unified
//! `ServiceError` at API boundaries and into `AppError` for HTTP responses.

use errors::ServiceError;
use thiserror::Error;

/// ADS device service error type
#[derive(Error, Debug, Clone)]
pub enum AdsError {
    /// Configuration-related errors (properties, NetID, port)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed symbol manifest line
    #[error("Manifest error: {0}")]
    ManifestError(String),

    /// Connection establishment errors
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// ADS transport and device errors reported by the client library
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Symbol could not be resolved on the PLC
    #[error("Symbol error: {0}")]
    SymbolError(String),

    /// Value conversion errors (type mismatch, range, encoding)
    #[error("Data error: {0}")]
    DataError(String),

    /// No attribute registered under the given name
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// Write attempted on a read-only attribute
    #[error("Access violation: {0}")]
    AccessViolation(String),

    /// No command registered under the given name
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Device is not in a state that allows the operation
    #[error("State error: {0}")]
    StateError(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for the ADS device service
pub type Result<T> = std::result::Result<T, AdsError>;

impl AdsError {
    pub fn config(msg: impl Into<String>) -> Self {
        AdsError::ConfigError(msg.into())
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        AdsError::ManifestError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        AdsError::ConnectionError(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        AdsError::ProtocolError(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        AdsError::DataError(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AdsError::InvalidArgument(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AdsError::StateError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AdsError::InternalError(msg.into())
    }

    // Convenience constructors for specific cases
    pub fn symbol_not_found(name: impl std::fmt::Display) -> Self {
        AdsError::SymbolError(format!("Symbol not found: {}", name))
    }

    pub fn attribute_not_found(name: impl std::fmt::Display) -> Self {
        AdsError::AttributeNotFound(name.to_string())
    }

    pub fn read_only(name: impl std::fmt::Display) -> Self {
        AdsError::AccessViolation(format!("Attribute {} is read-only", name))
    }

    pub fn command_not_found(name: impl std::fmt::Display) -> Self {
        AdsError::CommandNotFound(name.to_string())
    }

    pub fn not_connected() -> Self {
        AdsError::ConnectionError("Not connected".to_string())
    }
}

// ============================================================================
// Extension trait for adding context to errors
// ============================================================================

/// Extension trait for adding context to errors
pub trait ErrorExt<T> {
    fn connection_error(self, msg: &str) -> Result<T>;
    fn protocol_error(self, msg: &str) -> Result<T>;
}

impl<T, E> ErrorExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn connection_error(self, msg: &str) -> Result<T> {
        self.map_err(|e| AdsError::ConnectionError(format!("{msg}: {e}")))
    }

    fn protocol_error(self, msg: &str) -> Result<T> {
        self.map_err(|e| AdsError::ProtocolError(format!("{msg}: {e}")))
    }
}

// ============================================================================
// Conversion from AdsError to ServiceError for API boundaries
// ============================================================================

impl From<AdsError> for ServiceError {
    fn from(err: AdsError) -> Self {
        match err {
            AdsError::ConfigError(msg) | AdsError::ManifestError(msg) => {
                ServiceError::Configuration(msg)
            },
            AdsError::ConnectionError(msg) => ServiceError::Communication(msg),
            AdsError::ProtocolError(msg) => ServiceError::Protocol {
                protocol: "ads".to_string(),
                message: msg,
            },
            AdsError::SymbolError(msg) => ServiceError::NotFound { resource: msg },
            AdsError::DataError(msg) => ServiceError::Validation(msg),
            AdsError::AttributeNotFound(name) => ServiceError::NotFound {
                resource: format!("Attribute: {}", name),
            },
            AdsError::CommandNotFound(name) => ServiceError::NotFound {
                resource: format!("Command: {}", name),
            },
            AdsError::AccessViolation(msg) => ServiceError::Forbidden(msg),
            AdsError::InvalidArgument(msg) => ServiceError::BadRequest(msg),
            AdsError::StateError(msg) => ServiceError::ServiceUnavailable(msg),
            AdsError::InternalError(msg) => ServiceError::Internal(msg),
        }
    }
}

// ============================================================================
// AdsError implements ServiceErrorTrait
// ============================================================================

use errors::{ErrorCategory, ServiceErrorTrait};

impl ServiceErrorTrait for AdsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "ADSRV_CONFIG_ERROR",
            Self::ManifestError(_) => "ADSRV_MANIFEST_ERROR",
            Self::ConnectionError(_) => "ADSRV_CONNECTION_ERROR",
            Self::ProtocolError(_) => "ADSRV_PROTOCOL_ERROR",
            Self::SymbolError(_) => "ADSRV_SYMBOL_ERROR",
            Self::DataError(_) => "ADSRV_DATA_ERROR",
            Self::AttributeNotFound(_) => "ADSRV_ATTRIBUTE_NOT_FOUND",
            Self::AccessViolation(_) => "ADSRV_ACCESS_VIOLATION",
            Self::CommandNotFound(_) => "ADSRV_COMMAND_NOT_FOUND",
            Self::InvalidArgument(_) => "ADSRV_INVALID_ARGUMENT",
            Self::StateError(_) => "ADSRV_STATE_ERROR",
            Self::InternalError(_) => "ADSRV_INTERNAL_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError(_) | Self::ManifestError(_) => ErrorCategory::Configuration,
            Self::ConnectionError(_) => ErrorCategory::Connection,
            Self::ProtocolError(_) => ErrorCategory::Protocol,
            Self::SymbolError(_) | Self::AttributeNotFound(_) | Self::CommandNotFound(_) => {
                ErrorCategory::NotFound
            },
            Self::DataError(_) | Self::InvalidArgument(_) => ErrorCategory::Validation,
            Self::AccessViolation(_) => ErrorCategory::Permission,
            Self::StateError(_) => ErrorCategory::Network,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }
}

// ============================================================================
// API Adaptation: AdsError → AppError conversion
// ============================================================================

impl From<AdsError> for common::AppError {
    fn from(err: AdsError) -> Self {
        use common::{AppError, ErrorInfo};

        let status = err.http_status();
        let error_info = ErrorInfo::new(err.to_string())
            .with_code(status.as_u16())
            .with_details(format!(
                "error_code: {}, category: {:?}, retryable: {}",
                err.error_code(),
                err.category(),
                err.is_retryable()
            ));

        AppError::new(status, error_info)
    }
}
