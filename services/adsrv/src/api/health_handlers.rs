//! Health Check API Handlers

use axum::{extract::State, response::Json};
use std::sync::Arc;

use common::{AppError, DeviceHealth, HealthStatus, ServiceStatus, SuccessResponse};

use crate::api::AppState;
use crate::device::DevState;

/// Health check endpoint
///
/// Healthy while the device is ON, unhealthy after a failed startup.
///
/// @route GET /health
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<HealthStatus>>, AppError> {
    let device_state = state.server.state();
    let status = match device_state {
        DevState::On => ServiceStatus::Healthy,
        DevState::Fault => ServiceStatus::Unhealthy,
        DevState::Off => ServiceStatus::Degraded,
        DevState::Unknown => ServiceStatus::Unknown,
    };

    Ok(Json(SuccessResponse::new(HealthStatus {
        status,
        service: "adsrv".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now(),
        device: DeviceHealth {
            state: device_state.to_string(),
            status: state.server.status(),
        },
    })))
}
