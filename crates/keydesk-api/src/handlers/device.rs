//! Device presence and ban handlers.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use keydesk_core::error::AppError;
use keydesk_entity::device::BannedDevice;

use crate::dto::request::{BanDeviceRequest, RegisterDeviceRequest};
use crate::dto::response::{ApiResponse, DeviceListResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

fn require_admin(session: &CurrentSession) -> Result<(), ApiError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required").into())
    }
}

/// GET /api/devices
pub async fn list(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> Result<Json<ApiResponse<DeviceListResponse>>, ApiError> {
    let listing = state.presence.list().await?;
    Ok(Json(ApiResponse::ok(DeviceListResponse {
        devices: listing.devices,
        online_count: listing.online_count,
    })))
}

/// POST /api/devices — register (or re-register) the calling device.
///
/// A banned device name is refused before any write.
pub async fn register(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    if state.presence.is_banned(&req.device_name).await? {
        return Err(AppError::forbidden("This device is banned").into());
    }

    let user_type = if session.is_admin() { "admin" } else { "manager" };
    state
        .presence
        .register(&req.id, &req.device_name, user_type)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Device registered"))))
}

/// POST /api/devices/{id}/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.presence.heartbeat(&id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Heartbeat recorded"))))
}

/// DELETE /api/devices/{id} — kick a device. Admin only.
pub async fn kick(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&session)?;
    state.presence.kick(&id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Device kicked"))))
}

/// GET /api/devices/bans
pub async fn bans(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<BannedDevice>>>, ApiError> {
    require_admin(&session)?;
    Ok(Json(ApiResponse::ok(state.presence.bans().await?)))
}

/// POST /api/devices/bans
pub async fn ban(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<BanDeviceRequest>,
) -> Result<Json<ApiResponse<BannedDevice>>, ApiError> {
    require_admin(&session)?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let ban = state
        .presence
        .ban(
            &req.device_name,
            req.duration_minutes,
            &session.performed_by(),
            req.reason.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(ban)))
}

/// DELETE /api/devices/bans/{id}
pub async fn unban(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&session)?;
    state.presence.unban(&id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Ban lifted"))))
}
