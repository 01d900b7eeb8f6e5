//! Mirror-database stat handlers.

use axum::Json;
use axum::extract::{Path, State};

use crate::dto::response::{ApiResponse, MirrorCountResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/stats/mirrors/{index}
pub async fn mirror_count(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<MirrorCountResponse>>, ApiError> {
    let users = state.mirrors.count_users(index).await?;
    Ok(Json(ApiResponse::ok(MirrorCountResponse { index, users })))
}
