//! Shared application state threaded through all handlers.

use std::sync::{Arc, Mutex};

use keydesk_auth::{ManagerRoster, SessionGuard};
use keydesk_core::config::AppConfig;
use keydesk_core::traits::RecordStore;
use keydesk_remote::MirrorStats;
use keydesk_service::{ActivityLogger, DashboardService, PresenceService};

/// Everything the handlers need, all behind `Arc`s so the state is cheap
/// to clone per request.
///
/// The two state machines sit behind mutexes: handler access is short and
/// synchronous, and no lock is ever held across an await point.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The session/lockout state machine.
    pub session: Arc<Mutex<SessionGuard>>,
    /// The manager roster.
    pub roster: Arc<Mutex<ManagerRoster>>,
    /// The remote record store.
    pub records: Arc<dyn RecordStore>,
    /// License CRUD orchestration.
    pub dashboard: Arc<DashboardService>,
    /// Device presence and bans.
    pub presence: Arc<PresenceService>,
    /// Activity log.
    pub activity: Arc<ActivityLogger>,
    /// Mirror-database user counters.
    pub mirrors: Arc<MirrorStats>,
}

impl AppState {
    /// Locks the session guard, recovering from a poisoned lock.
    pub fn lock_session(&self) -> std::sync::MutexGuard<'_, SessionGuard> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Locks the roster, recovering from a poisoned lock.
    pub fn lock_roster(&self) -> std::sync::MutexGuard<'_, ManagerRoster> {
        self.roster.lock().unwrap_or_else(|e| e.into_inner())
    }
}
