//! Device API Handlers
//!
//! Attribute access and command invocation on the hosted device.

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::debug;

use common::{AppError, SuccessResponse};

use crate::adapter::READ_FLOAT_ARRAY;
use crate::api::dto::{AttributeValue, DeviceInfo, ReadFloatArrayRequest, WriteAttributeRequest};
use crate::api::{blocking, AppState};
use crate::device::{AttributeInfo, CommandInput, CommandOutput, LongStringArray};

/// Device description
///
/// @route GET /api/device
pub async fn get_device(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<DeviceInfo>>, AppError> {
    let info = blocking(&state, |server| {
        let device = server.device();
        Ok(DeviceInfo {
            name: device.name().to_string(),
            state: server.state(),
            status: server.status(),
            properties: device.properties(),
            attributes: server.attribute_list(),
            commands: server.command_list(),
        })
    })
    .await?;
    Ok(Json(SuccessResponse::new(info)))
}

/// Attribute metadata in registration order
///
/// @route GET /api/attributes
pub async fn list_attributes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<Vec<AttributeInfo>>>, AppError> {
    let list = state.server.attribute_list();
    Ok(Json(
        SuccessResponse::new(list.clone()).with_metadata("total", list.len().into()),
    ))
}

/// Live attribute value
///
/// @route GET /api/attributes/{name}
/// @status 404 - Unknown attribute
/// @status 503 - Device not ON
pub async fn read_attribute(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse<AttributeValue>>, AppError> {
    let attr = name.clone();
    let value = blocking(&state, move |server| server.read_attribute(&attr)).await?;
    Ok(Json(SuccessResponse::new(AttributeValue {
        name,
        data_type: value.data_type(),
        value,
        timestamp: chrono::Utc::now(),
    })))
}

/// Write an attribute, answering with the value as converted and written
///
/// @route PUT /api/attributes/{name}
/// @input Json(req): WriteAttributeRequest - `{"value": ...}`
/// @status 400 - Value does not match the attribute type
/// @status 403 - Attribute is read-only
pub async fn write_attribute(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<WriteAttributeRequest>,
) -> Result<Json<SuccessResponse<AttributeValue>>, AppError> {
    debug!("write {} = {}", name, req.value);
    let attr = name.clone();
    let value = blocking(&state, move |server| server.write_attribute(&attr, &req.value)).await?;
    Ok(Json(SuccessResponse::new(AttributeValue {
        name,
        data_type: value.data_type(),
        value,
        timestamp: chrono::Utc::now(),
    })))
}

/// Bulk REAL read
///
/// @route POST /api/commands/read_float_array
/// @input Json(req): ReadFloatArrayRequest - count (negative = whole array) and symbol name
/// @output Json<SuccessResponse<CommandOutput>> - list of floats
pub async fn read_float_array(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadFloatArrayRequest>,
) -> Result<Json<SuccessResponse<CommandOutput>>, AppError> {
    let argin = CommandInput::LongStringArray(LongStringArray::new(
        vec![req.count],
        vec![req.symbol_name],
    ));
    let out = blocking(&state, move |server| {
        server.command_inout(READ_FLOAT_ARRAY, argin)
    })
    .await?;
    Ok(Json(SuccessResponse::new(out)))
}
