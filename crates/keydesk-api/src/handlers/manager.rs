//! Manager roster handlers. Admin only.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use keydesk_core::error::AppError;
use keydesk_entity::manager::UpdateManager;

use crate::dto::request::{CreateManagerRequest, UpdateManagerRequest};
use crate::dto::response::{ApiResponse, ManagerResponse, MessageResponse, QuotaResponse};
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

/// GET /api/managers
pub async fn list(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<ManagerResponse>>>, ApiError> {
    require_admin(&session)?;
    let roster = state.lock_roster();
    let managers = roster.managers().iter().map(ManagerResponse::from).collect();
    Ok(Json(ApiResponse::ok(managers)))
}

/// POST /api/managers
///
/// The password-uniqueness pre-check lives here, at the surface layer:
/// the roster itself does not enforce it.
pub async fn create(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<CreateManagerRequest>,
) -> Result<Json<ApiResponse<ManagerResponse>>, ApiError> {
    require_admin(&session)?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let max_licenses = req
        .max_licenses
        .unwrap_or(state.config.security.default_manager_quota);

    let mut roster = state.lock_roster();
    if roster.password_in_use(&req.password) {
        return Err(AppError::conflict("Password is already in use by another manager").into());
    }

    let manager = roster.add(&req.name, &req.password, max_licenses)?;
    Ok(Json(ApiResponse::ok(ManagerResponse::from(&manager))))
}

/// PUT /api/managers/{id}
pub async fn update(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<UpdateManagerRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&session)?;

    let mut roster = state.lock_roster();
    if roster.get(&id).is_none() {
        return Err(AppError::not_found("Manager not found").into());
    }

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            if roster.password_in_use(password) {
                return Err(
                    AppError::conflict("Password is already in use by another manager").into(),
                );
            }
            Some(roster.hash_password(password)?)
        }
        None => None,
    };

    roster.update(
        &id,
        UpdateManager {
            name: req.name,
            password_hash,
            max_licenses: req.max_licenses,
            created_licenses: req.created_licenses,
            is_active: req.is_active,
        },
    )?;

    Ok(Json(ApiResponse::ok(MessageResponse::new("Manager updated"))))
}

/// DELETE /api/managers/{id}
pub async fn delete(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&session)?;
    state.lock_roster().remove(&id)?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Manager removed"))))
}

/// GET /api/managers/{id}/quota
///
/// Also answers for the manager's own session, so the dashboard can show
/// the remaining-quota badge.
pub async fn quota(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<QuotaResponse>>, ApiError> {
    if !session.is_admin() && session.manager_id() != Some(id.as_str()) {
        return Err(AppError::forbidden("Not your quota").into());
    }

    let roster = state.lock_roster();
    Ok(Json(ApiResponse::ok(QuotaResponse {
        remaining: roster.remaining(&id),
        can_create: roster.can_create(&id),
    })))
}
