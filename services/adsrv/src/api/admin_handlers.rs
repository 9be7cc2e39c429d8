//! Admin API Handlers
//!
//! Runtime log level control.

use axum::response::Json;
use serde::{Deserialize, Serialize};

use common::{AppError, SuccessResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct SetLogLevelRequest {
    /// Plain level (`debug`) or a filter directive (`info,adsrv=trace`)
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLevelResponse {
    pub level: String,
}

/// @route GET /api/admin/logs/level
pub async fn get_log_level() -> Json<SuccessResponse<LogLevelResponse>> {
    Json(SuccessResponse::new(LogLevelResponse {
        level: common::logging::get_log_level(),
    }))
}

/// @route POST /api/admin/logs/level
/// @status 400 - Invalid filter directive, or logging was initialized without reload support
pub async fn set_log_level(
    Json(req): Json<SetLogLevelRequest>,
) -> Result<Json<SuccessResponse<LogLevelResponse>>, AppError> {
    common::logging::set_log_level(&req.level).map_err(AppError::bad_request)?;
    Ok(Json(SuccessResponse::new(LogLevelResponse { level: req.level })))
}
