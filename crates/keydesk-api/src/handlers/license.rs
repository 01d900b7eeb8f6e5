//! License handlers — CRUD, HWID reset, archive flow, export.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use validator::Validate;

use keydesk_core::error::AppError;
use keydesk_entity::archive::DeletedLicense;
use keydesk_entity::license::filter::{filter_licenses, license_stats, LicenseStats};
use keydesk_entity::license::{CreateLicense, License, UpdateLicense};
use keydesk_service::export;

use crate::dto::request::{
    CreateLicenseRequest, ExportQuery, LicenseListQuery, UpdateLicenseRequest,
};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// GET /api/licenses
pub async fn list(
    State(state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<LicenseListQuery>,
) -> Result<Json<ApiResponse<Vec<License>>>, ApiError> {
    let licenses = state.dashboard.list_licenses().await?;
    let filtered = filter_licenses(&licenses, query.filter, &query.q, Utc::now());
    Ok(Json(ApiResponse::ok(filtered)))
}

/// GET /api/licenses/stats
pub async fn stats(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> Result<Json<ApiResponse<LicenseStats>>, ApiError> {
    let licenses = state.dashboard.list_licenses().await?;
    Ok(Json(ApiResponse::ok(license_stats(&licenses, Utc::now()))))
}

/// POST /api/licenses
pub async fn create(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<CreateLicenseRequest>,
) -> Result<Json<ApiResponse<License>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let license = state
        .dashboard
        .create_license(
            &session,
            CreateLicense {
                key: req.key,
                user_name: req.user_name,
                expires_at: req.expires_at,
                notes: req.notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(license)))
}

/// PUT /api/licenses/{key}
pub async fn update(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(key): Path<String>,
    Json(req): Json<UpdateLicenseRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .dashboard
        .update_license(
            &session,
            &key,
            UpdateLicense {
                user_name: req.user_name,
                expires_at: req.expires_at,
                notes: req.notes,
                used: req.used,
                hwid: req.hwid,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new("License updated"))))
}

/// POST /api/licenses/{key}/reset
pub async fn reset_hwid(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.dashboard.reset_hwid(&session, &key).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("HWID reset"))))
}

/// DELETE /api/licenses/{key} — hard delete.
pub async fn delete(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.dashboard.delete_license(&session, &key).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("License deleted"))))
}

/// POST /api/licenses/{key}/archive — soft delete into the archive.
pub async fn archive(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.dashboard.archive_license(&session, &key).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("License archived"))))
}

/// GET /api/licenses/deleted
pub async fn deleted(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> Result<Json<ApiResponse<Vec<DeletedLicense>>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.dashboard.deleted_licenses().await?)))
}

/// POST /api/licenses/deleted/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<License>>, ApiError> {
    let license = state.dashboard.restore_license(&session, &id).await?;
    Ok(Json(ApiResponse::ok(license)))
}

/// DELETE /api/licenses/deleted/{id} — permanent removal.
pub async fn purge(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.dashboard.purge_archived(&session, &id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Archived license removed",
    ))))
}

/// GET /api/licenses/export
///
/// Streams the rendered artifact with a download disposition. The filter
/// and search are applied first, so the export matches what the operator
/// sees.
pub async fn export(
    State(state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let licenses = state.dashboard.list_licenses().await?;
    let filtered = filter_licenses(&licenses, query.filter, &query.q, now);

    let (body, mime, filename) = match query.format.as_deref() {
        None | Some("csv") => (export::to_csv(&filtered, now), export::CSV_MIME, "licenses.csv"),
        Some("excel") => (
            export::to_excel_html(&filtered, now),
            export::EXCEL_MIME,
            "licenses.xls",
        ),
        Some(other) => {
            return Err(AppError::validation(format!("Unknown export format '{other}'")).into());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}
