//! Auth handlers — login, logout, session status.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use keydesk_auth::LoginOutcome;
use keydesk_core::error::AppError;
use keydesk_entity::session::UserType;

use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, LoginResponse, MessageResponse, SessionStatusResponse};
use crate::error::ApiError;
use crate::extractors::CurrentSession;
use crate::state::AppState;

/// POST /api/auth/login
///
/// The admin path verifies the secret and accounts attempts inside the
/// state machine. The manager path resolves the credential against the
/// roster first and reports a genuine failure back to the machine, so
/// both paths share one attempt counter and one lockout.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let role: UserType = req
        .role
        .parse()
        .map_err(|_| AppError::validation(format!("Unknown role '{}'", req.role)))?;

    let outcome = match role {
        UserType::Admin => state.lock_session().attempt_admin_login(&req.password)?,
        UserType::Manager => {
            let resolved = state.lock_roster().validate_login(&req.password);
            match resolved {
                Some(manager) => state.lock_session().login_as_manager(&manager.id)?,
                None => state.lock_session().report_manager_failure()?,
            }
        }
    };

    match outcome {
        LoginOutcome::Success {
            user_type,
            manager_id,
        } => {
            let manager_name = manager_id.as_deref().and_then(|id| {
                state.lock_roster().get(id).map(|m| m.name.clone())
            });
            let time_left_seconds = state.lock_session().time_left_seconds();

            Ok(Json(ApiResponse::ok(LoginResponse {
                user_type: user_type.to_string(),
                manager_id,
                manager_name,
                time_left_seconds,
            })))
        }
        LoginOutcome::Rejected { attempts_left } => Err(AppError::unauthorized(format!(
            "Invalid credentials. {attempts_left} attempts left"
        ))
        .into()),
        LoginOutcome::Blocked { minutes_left } => Err(AppError::locked(format!(
            "Login is locked. Try again in {minutes_left} minutes"
        ))
        .into()),
    }
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    _session: CurrentSession,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.lock_session().logout(false)?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Logged out"))))
}

/// GET /api/auth/session
///
/// Unauthenticated: the login screen polls this for the attempt counter
/// and lockout countdown.
pub async fn session_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionStatusResponse>>, ApiError> {
    let mut session = state.lock_session();
    let blocked = session.check_block_status()?;

    Ok(Json(ApiResponse::ok(SessionStatusResponse {
        logged_in: session.is_logged_in(),
        user_type: session.user_type().map(|t| t.to_string()),
        manager_id: session.manager_id().map(String::from),
        time_left_seconds: session.time_left_seconds(),
        attempts_left: session.attempts_left(),
        blocked,
        block_minutes_left: session.block_minutes_left(),
    })))
}
