//! `CurrentSession` extractor — resolves the console session into an
//! acting identity, rejecting requests when no session is open.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use keydesk_core::error::AppError;
use keydesk_entity::session::UserType;
use keydesk_service::Actor;

use crate::error::ApiError;
use crate::state::AppState;

/// The acting identity of the open console session.
///
/// The console holds one session per process (the single-operator model);
/// every authenticated route goes through this extractor, which is how
/// session validity implicitly gates all screens.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Actor);

impl std::ops::Deref for CurrentSession {
    type Target = Actor;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_type, manager_id) = {
            let session = state.lock_session();
            if !session.is_logged_in() {
                return Err(AppError::unauthorized("No active session").into());
            }
            (session.user_type(), session.manager_id().map(String::from))
        };

        let actor = match user_type {
            Some(UserType::Admin) => Actor::Admin,
            Some(UserType::Manager) => {
                let id = manager_id
                    .ok_or_else(|| AppError::unauthorized("Manager session has no identity"))?;
                let roster = state.lock_roster();
                let manager = roster
                    .get(&id)
                    .ok_or_else(|| AppError::unauthorized("Manager no longer exists"))?;
                Actor::Manager {
                    id: manager.id.clone(),
                    name: manager.name.clone(),
                }
            }
            None => return Err(AppError::unauthorized("Session has no role").into()),
        };

        Ok(CurrentSession(actor))
    }
}
