//! Activity log handlers. Admin only.

use axum::Json;
use axum::extract::State;

use keydesk_core::error::AppError;
use keydesk_entity::activity::ActivityLog;

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/activity
pub async fn list(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<ActivityLog>>>, ApiError> {
    if !session.is_admin() {
        return Err(AppError::forbidden("Admin access required").into());
    }
    Ok(Json(ApiResponse::ok(state.activity.recent().await?)))
}

/// DELETE /api/activity
pub async fn clear(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !session.is_admin() {
        return Err(AppError::forbidden("Admin access required").into());
    }
    state.activity.clear().await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Activity log cleared"))))
}
