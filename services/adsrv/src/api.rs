//! HTTP interface of the hosted device
//!
//! Every handler hands its PLC work to the blocking pool; the PLC connection
//! itself is synchronous.

pub mod admin_handlers;
pub mod device_handlers;
pub mod dto;
pub mod health_handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn, Level};

use common::AppError;
use errors::ServiceErrorTrait;

use crate::device::DeviceServer;
use crate::error::{AdsError, Result};

use admin_handlers::{get_log_level, set_log_level};
use device_handlers::{
    get_device, list_attributes, read_attribute, read_float_array, write_attribute,
};
use health_handlers::health_check;

/// State shared by all handlers
pub struct AppState {
    pub server: Arc<DeviceServer>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(server: Arc<DeviceServer>) -> Self {
        Self {
            server,
            start_time: Instant::now(),
        }
    }
}

/// Create all API routes of the device service
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/device", get(get_device))
        .route("/api/attributes", get(list_attributes))
        .route(
            "/api/attributes/{name}",
            get(read_attribute).put(write_attribute),
        )
        .route("/api/commands/read_float_array", post(read_float_array))
        .route(
            "/api/admin/logs/level",
            get(get_log_level).post(set_log_level),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run `op` against the device server on the blocking pool
pub(crate) async fn blocking<T, F>(state: &AppState, op: F) -> std::result::Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&DeviceServer) -> Result<T> + Send + 'static,
{
    let server = state.server.clone();
    tokio::task::spawn_blocking(move || op(&server))
        .await
        .map_err(|e| AppError::internal_error(format!("device task failed: {}", e)))?
        .map_err(|e| {
            log_failure(&e);
            AppError::from(e)
        })
}

fn log_failure(err: &AdsError) {
    let level = err.log_level();
    if level == Level::ERROR {
        error!("{}: {}", err.error_code(), err);
    } else if level == Level::WARN {
        warn!("{}: {}", err.error_code(), err);
    } else {
        debug!("{}: {}", err.error_code(), err);
    }
}
