//! Console session and lockout state machine.
//!
//! States: logged out, logged in (with role and start time), and blocked
//! (reachable only from logged out). The machine is synchronous; all
//! persistence goes through the injected [`KeyValueStore`], and time-
//! dependent transitions are implemented as `*_at(now)` internals so the
//! boundaries are deterministic under test.
//!
//! The lockout has no running timer: it is evaluated lazily by
//! [`SessionGuard::check_block_status`] at startup and on every login
//! attempt. The session countdown is a best-effort local timer driven by
//! [`SessionGuard::tick`]; it never cancels in-flight work, and an active
//! block is never enforced retroactively against an open session.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use keydesk_core::config::security::SecurityConfig;
use keydesk_core::result::AppResult;
use keydesk_core::traits::KeyValueStore;
use keydesk_entity::session::{AuthState, UserType};
use keydesk_store::keys;

use crate::password::PasswordHasher;

/// Result of a login attempt. Bad credentials are an outcome, not an
/// error; `Err` is reserved for storage failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session is now open.
    Success {
        /// Role of the new session.
        user_type: UserType,
        /// Manager identity when the role is `Manager`.
        manager_id: Option<String>,
    },
    /// Credential rejected; the attempt counter was incremented.
    Rejected {
        /// Attempts left before lockout.
        attempts_left: u32,
    },
    /// Login is locked out. The counter was *not* incremented.
    Blocked {
        /// Whole minutes until the lockout lifts, rounded up.
        minutes_left: i64,
    },
}

impl LoginOutcome {
    /// Whether the attempt opened a session.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The session/lockout state machine.
pub struct SessionGuard {
    kv: Arc<dyn KeyValueStore>,
    hasher: PasswordHasher,
    /// Argon2id hash of the configured admin secret, computed at startup.
    admin_hash: String,
    max_attempts: u32,
    session_timeout: Duration,
    block_time: Duration,
    state: AuthState,
    /// Remaining seconds in the open session's countdown.
    time_left_seconds: u64,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state)
            .field("time_left_seconds", &self.time_left_seconds)
            .finish()
    }
}

impl SessionGuard {
    /// Creates the guard, hashing the configured admin secret.
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &SecurityConfig) -> AppResult<Self> {
        let hasher = PasswordHasher::new();
        let admin_hash = hasher.hash(&config.admin_secret)?;
        let timeout_seconds = config.session_timeout_minutes * 60;

        Ok(Self {
            kv,
            hasher,
            admin_hash,
            max_attempts: config.max_attempts,
            session_timeout: Duration::minutes(config.session_timeout_minutes as i64),
            block_time: Duration::minutes(config.block_minutes as i64),
            state: AuthState::default(),
            time_left_seconds: timeout_seconds,
        })
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Current state snapshot.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Whether a session is open.
    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in
    }

    /// Role of the open session.
    pub fn user_type(&self) -> Option<UserType> {
        self.state.user_type
    }

    /// Manager id of the open session, when the role is `Manager`.
    pub fn manager_id(&self) -> Option<&str> {
        self.state.manager_id.as_deref()
    }

    /// Remaining seconds before the session countdown forces a logout.
    pub fn time_left_seconds(&self) -> u64 {
        self.time_left_seconds
    }

    /// Attempts left before lockout, clamped to zero.
    pub fn attempts_left(&self) -> u32 {
        self.max_attempts.saturating_sub(self.state.login_attempts)
    }

    /// Whether a lockout is currently in force.
    pub fn is_blocked(&self) -> bool {
        self.is_blocked_at(Utc::now())
    }

    fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.state.blocked_until.is_some_and(|until| now < until)
    }

    /// Whole minutes until the lockout lifts, rounded up; zero when not
    /// blocked.
    pub fn block_minutes_left(&self) -> i64 {
        self.block_minutes_left_at(Utc::now())
    }

    fn block_minutes_left_at(&self, now: DateTime<Utc>) -> i64 {
        match self.state.blocked_until {
            Some(until) if now < until => {
                let ms = (until - now).num_milliseconds();
                (ms + 59_999) / 60_000
            }
            _ => 0,
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Re-evaluates the persisted lockout record.
    ///
    /// An active block loads `blocked_until` and returns `true`. An
    /// expired block clears both the block record and the attempt counter
    /// (full reset). With no block, any leftover attempt counter is loaded
    /// so failed attempts stay sticky across restarts.
    pub fn check_block_status(&mut self) -> AppResult<bool> {
        self.check_block_status_at(Utc::now())
    }

    fn check_block_status_at(&mut self, now: DateTime<Utc>) -> AppResult<bool> {
        if let Some(raw) = self.kv.get(keys::BLOCKED)? {
            match parse_block_record(&raw) {
                Some(until) if now < until => {
                    self.state.blocked_until = Some(until);
                    return Ok(true);
                }
                Some(_) => {
                    self.kv.remove(keys::BLOCKED)?;
                    self.kv.remove(keys::LOGIN_ATTEMPTS)?;
                    self.state.blocked_until = None;
                    self.state.login_attempts = 0;
                }
                None => {
                    warn!("Malformed lockout record, treating as absent");
                    self.kv.remove(keys::BLOCKED)?;
                }
            }
        }

        if let Some(raw) = self.kv.get(keys::LOGIN_ATTEMPTS)? {
            if let Ok(attempts) = raw.parse::<u32>() {
                self.state.login_attempts = attempts;
            }
        }

        Ok(false)
    }

    /// Attempts an admin login. Verifies the secret against the startup
    /// hash and handles attempt accounting internally.
    pub fn attempt_admin_login(&mut self, secret: &str) -> AppResult<LoginOutcome> {
        self.attempt_admin_login_at(secret, Utc::now())
    }

    fn attempt_admin_login_at(
        &mut self,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AppResult<LoginOutcome> {
        if self.check_block_status_at(now)? {
            return Ok(LoginOutcome::Blocked {
                minutes_left: self.block_minutes_left_at(now),
            });
        }

        if self.hasher.verify(secret, &self.admin_hash)? {
            self.complete_login_at(now, UserType::Admin, None)?;
            info!("Admin login successful");
            Ok(LoginOutcome::Success {
                user_type: UserType::Admin,
                manager_id: None,
            })
        } else {
            self.register_failure_at(now)
        }
    }

    /// Opens a manager session after the caller has resolved the
    /// credential against the roster.
    pub fn login_as_manager(&mut self, manager_id: &str) -> AppResult<LoginOutcome> {
        self.login_as_manager_at(manager_id, Utc::now())
    }

    fn login_as_manager_at(
        &mut self,
        manager_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<LoginOutcome> {
        if self.check_block_status_at(now)? {
            return Ok(LoginOutcome::Blocked {
                minutes_left: self.block_minutes_left_at(now),
            });
        }

        self.complete_login_at(now, UserType::Manager, Some(manager_id))?;
        info!(manager_id, "Manager login successful");
        Ok(LoginOutcome::Success {
            user_type: UserType::Manager,
            manager_id: Some(manager_id.to_string()),
        })
    }

    /// Records a failed manager credential. The manager path resolves
    /// credentials outside this machine, so the caller reports genuine
    /// failures explicitly.
    pub fn report_manager_failure(&mut self) -> AppResult<LoginOutcome> {
        self.report_manager_failure_at(Utc::now())
    }

    fn report_manager_failure_at(&mut self, now: DateTime<Utc>) -> AppResult<LoginOutcome> {
        if self.check_block_status_at(now)? {
            return Ok(LoginOutcome::Blocked {
                minutes_left: self.block_minutes_left_at(now),
            });
        }
        self.register_failure_at(now)
    }

    /// Reconstructs a persisted session after a restart. The sole path
    /// that restores logged-in state.
    ///
    /// The timeout boundary is exclusive: a session exactly as old as the
    /// timeout is not restored.
    pub fn restore_session(&mut self) -> AppResult<()> {
        self.restore_session_at(Utc::now())
    }

    fn restore_session_at(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        let logged_in = self.kv.get(keys::LOGGED_IN)?.as_deref() == Some("true");
        let start = self
            .kv
            .get(keys::SESSION_START)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        let (Some(start), true) = (start, logged_in) else {
            return Ok(());
        };

        let elapsed = now - start;
        if elapsed < self.session_timeout {
            let remaining_ms = (self.session_timeout - elapsed).num_milliseconds();
            self.time_left_seconds = (remaining_ms / 1000).max(0) as u64;

            let user_type = self
                .kv
                .get(keys::USER_TYPE)?
                .and_then(|raw| raw.parse::<UserType>().ok());
            let manager_id = match user_type {
                Some(UserType::Manager) => self.kv.get(keys::MANAGER_ID)?,
                _ => None,
            };

            self.state.is_logged_in = true;
            self.state.session_start = Some(start);
            self.state.user_type = user_type;
            self.state.manager_id = manager_id;
            info!(remaining_seconds = self.time_left_seconds, "Session restored");
        } else {
            self.clear_session_keys()?;
            info!("Persisted session expired, cleared");
        }

        Ok(())
    }

    /// One-second countdown step. Returns `true` when the countdown
    /// reached zero and forced a timeout logout.
    pub fn tick(&mut self) -> AppResult<bool> {
        if !self.state.is_logged_in {
            return Ok(false);
        }
        if self.time_left_seconds <= 1 {
            self.logout(true)?;
            info!("Session expired, forced logout");
            Ok(true)
        } else {
            self.time_left_seconds -= 1;
            Ok(false)
        }
    }

    /// Closes the session. A timeout logout is benign, not punitive: it
    /// also clears the attempt counter.
    pub fn logout(&mut self, timeout: bool) -> AppResult<()> {
        self.clear_session_keys()?;
        if timeout {
            self.kv.remove(keys::LOGIN_ATTEMPTS)?;
            self.state.login_attempts = 0;
        }

        self.state.is_logged_in = false;
        self.state.session_start = None;
        self.state.user_type = None;
        self.state.manager_id = None;
        self.time_left_seconds = self.session_timeout.num_seconds() as u64;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    fn complete_login_at(
        &mut self,
        now: DateTime<Utc>,
        user_type: UserType,
        manager_id: Option<&str>,
    ) -> AppResult<()> {
        self.kv.set(keys::LOGGED_IN, "true")?;
        self.kv
            .set(keys::SESSION_START, &now.timestamp_millis().to_string())?;
        self.kv.remove(keys::LOGIN_ATTEMPTS)?;
        self.kv.remove(keys::BLOCKED)?;
        self.kv.set(keys::USER_TYPE, user_type.as_str())?;
        match manager_id {
            Some(id) => self.kv.set(keys::MANAGER_ID, id)?,
            None => self.kv.remove(keys::MANAGER_ID)?,
        }

        self.state = AuthState {
            is_logged_in: true,
            login_attempts: 0,
            blocked_until: None,
            session_start: Some(now),
            user_type: Some(user_type),
            manager_id: manager_id.map(String::from),
        };
        self.time_left_seconds = self.session_timeout.num_seconds() as u64;
        Ok(())
    }

    fn register_failure_at(&mut self, now: DateTime<Utc>) -> AppResult<LoginOutcome> {
        let attempts = self.state.login_attempts + 1;
        self.kv.set(keys::LOGIN_ATTEMPTS, &attempts.to_string())?;
        self.state.login_attempts = attempts;

        if attempts >= self.max_attempts {
            let until = now + self.block_time;
            self.kv.set(
                keys::BLOCKED,
                &serde_json::json!({ "until": until.timestamp_millis() }).to_string(),
            )?;
            self.state.blocked_until = Some(until);
            warn!(attempts, until = %until, "Login locked out");
            Ok(LoginOutcome::Blocked {
                minutes_left: self.block_minutes_left_at(now),
            })
        } else {
            info!(attempts, "Login attempt rejected");
            Ok(LoginOutcome::Rejected {
                attempts_left: self.attempts_left(),
            })
        }
    }

    fn clear_session_keys(&self) -> AppResult<()> {
        self.kv.remove(keys::LOGGED_IN)?;
        self.kv.remove(keys::SESSION_START)?;
        self.kv.remove(keys::USER_TYPE)?;
        self.kv.remove(keys::MANAGER_ID)?;
        Ok(())
    }
}

/// Parses the persisted block record `{"until": <epoch-ms>}`.
fn parse_block_record(raw: &str) -> Option<DateTime<Utc>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let ms = value.get("until")?.as_i64()?;
    DateTime::from_timestamp_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use keydesk_store::MemoryStore;

    const SECRET: &str = "780431";

    fn config() -> SecurityConfig {
        SecurityConfig {
            admin_secret: SECRET.to_string(),
            max_attempts: 5,
            session_timeout_minutes: 30,
            block_minutes: 15,
            default_manager_quota: 10,
        }
    }

    fn guard() -> (SessionGuard, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        let guard = SessionGuard::new(kv.clone(), &config()).unwrap();
        (guard, kv)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn four_failures_do_not_block_fifth_does() {
        let (mut guard, _) = guard();
        let now = t0();

        for (i, wrong) in ["a", "b", "c", "d"].iter().enumerate() {
            let outcome = guard.attempt_admin_login_at(wrong, now).unwrap();
            assert_eq!(
                outcome,
                LoginOutcome::Rejected {
                    attempts_left: 5 - (i as u32 + 1)
                }
            );
            assert!(!guard.is_blocked_at(now));
        }

        let outcome = guard.attempt_admin_login_at("e", now).unwrap();
        assert!(matches!(outcome, LoginOutcome::Blocked { minutes_left: 15 }));
        assert_eq!(guard.state().login_attempts, 5);
        assert_eq!(guard.state().blocked_until, Some(now + Duration::minutes(15)));
    }

    #[test]
    fn blocked_rejects_even_correct_secret_without_incrementing() {
        let (mut guard, _) = guard();
        let now = t0();

        for wrong in ["a", "b", "c", "d", "e"] {
            guard.attempt_admin_login_at(wrong, now).unwrap();
        }
        assert_eq!(guard.state().login_attempts, 5);

        let later = now + Duration::minutes(10);
        let outcome = guard.attempt_admin_login_at(SECRET, later).unwrap();
        assert!(matches!(outcome, LoginOutcome::Blocked { minutes_left: 5 }));
        assert_eq!(guard.state().login_attempts, 5);

        let outcome = guard.report_manager_failure_at(later).unwrap();
        assert!(matches!(outcome, LoginOutcome::Blocked { .. }));
        assert_eq!(guard.state().login_attempts, 5);
    }

    #[test]
    fn expired_block_fully_resets_and_allows_login() {
        let (mut guard, _) = guard();
        let now = t0();

        for wrong in ["a", "b", "c", "d", "e"] {
            guard.attempt_admin_login_at(wrong, now).unwrap();
        }

        let after = now + Duration::minutes(15);
        assert!(!guard.check_block_status_at(after).unwrap());
        assert_eq!(guard.state().login_attempts, 0);
        assert_eq!(guard.attempts_left(), 5);

        let outcome = guard.attempt_admin_login_at(SECRET, after).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn successful_login_resets_attempts_and_clears_block_record() {
        let (mut guard, kv) = guard();
        let now = t0();

        guard.attempt_admin_login_at("a", now).unwrap();
        guard.attempt_admin_login_at("b", now).unwrap();

        let outcome = guard.attempt_admin_login_at(SECRET, now).unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::Success {
                user_type: UserType::Admin,
                manager_id: None
            }
        );
        assert_eq!(guard.state().login_attempts, 0);
        assert_eq!(kv.get(keys::LOGIN_ATTEMPTS).unwrap(), None);
        assert_eq!(kv.get(keys::BLOCKED).unwrap(), None);
        assert_eq!(kv.get(keys::LOGGED_IN).unwrap(), Some("true".to_string()));
    }

    #[test]
    fn manager_login_persists_role_and_identity() {
        let (mut guard, kv) = guard();
        let outcome = guard.login_as_manager_at("m-42", t0()).unwrap();
        assert!(outcome.is_success());
        assert_eq!(guard.user_type(), Some(UserType::Manager));
        assert_eq!(guard.manager_id(), Some("m-42"));
        assert_eq!(kv.get(keys::USER_TYPE).unwrap(), Some("manager".to_string()));
        assert_eq!(kv.get(keys::MANAGER_ID).unwrap(), Some("m-42".to_string()));
    }

    #[test]
    fn restore_at_exact_timeout_boundary_is_exclusive() {
        let (mut guard, kv) = guard();
        let start = t0();
        guard.attempt_admin_login_at(SECRET, start).unwrap();

        // elapsed == timeout: must NOT restore.
        let mut restored = SessionGuard::new(kv.clone(), &config()).unwrap();
        restored
            .restore_session_at(start + Duration::minutes(30))
            .unwrap();
        assert!(!restored.is_logged_in());
    }

    #[test]
    fn restore_computes_remaining_countdown() {
        let (mut guard, kv) = guard();
        let start = t0();
        guard.attempt_admin_login_at(SECRET, start).unwrap();

        let mut restored = SessionGuard::new(kv.clone(), &config()).unwrap();
        restored
            .restore_session_at(start + Duration::minutes(10))
            .unwrap();
        assert!(restored.is_logged_in());
        assert_eq!(restored.time_left_seconds(), 20 * 60);
        assert_eq!(restored.user_type(), Some(UserType::Admin));
    }

    #[test]
    fn expired_persisted_session_is_cleared_on_restore() {
        let (mut guard, kv) = guard();
        let start = t0();
        guard.attempt_admin_login_at(SECRET, start).unwrap();

        let mut restored = SessionGuard::new(kv.clone(), &config()).unwrap();
        restored
            .restore_session_at(start + Duration::minutes(31))
            .unwrap();
        assert!(!restored.is_logged_in());
        assert_eq!(kv.get(keys::LOGGED_IN).unwrap(), None);
        assert_eq!(kv.get(keys::SESSION_START).unwrap(), None);
    }

    #[test]
    fn tick_counts_down_and_forces_timeout_logout() {
        let (mut guard, kv) = guard();
        guard.attempt_admin_login_at(SECRET, t0()).unwrap();
        guard.attempt_admin_login_at("sticky?", t0()).ok();

        assert!(!guard.tick().unwrap());
        assert_eq!(guard.time_left_seconds(), 30 * 60 - 1);

        guard.time_left_seconds = 1;
        assert!(guard.tick().unwrap());
        assert!(!guard.is_logged_in());
        // Timeout logout is benign: attempt counter is cleared too.
        assert_eq!(kv.get(keys::LOGIN_ATTEMPTS).unwrap(), None);
        assert_eq!(guard.time_left_seconds(), 30 * 60);
    }

    #[test]
    fn manual_logout_keeps_attempt_counter_sticky() {
        let (mut guard, kv) = guard();
        guard.attempt_admin_login_at("a", t0()).unwrap();
        guard.attempt_admin_login_at("b", t0()).unwrap();
        guard.logout(false).unwrap();
        assert!(!guard.is_logged_in());
        assert_eq!(kv.get(keys::LOGGED_IN).unwrap(), None);

        // The two failures survive the manual logout and a restart.
        let mut fresh = SessionGuard::new(kv.clone(), &config()).unwrap();
        fresh.check_block_status().unwrap();
        assert_eq!(fresh.attempts_left(), 3);
    }

    #[test]
    fn malformed_block_record_is_treated_as_absent() {
        let (mut guard, kv) = guard();
        kv.set(keys::BLOCKED, "{not json").unwrap();
        assert!(!guard.check_block_status_at(t0()).unwrap());
        assert_eq!(kv.get(keys::BLOCKED).unwrap(), None);
    }

    #[test]
    fn block_minutes_round_up() {
        let (mut guard, _) = guard();
        let now = t0();
        for wrong in ["a", "b", "c", "d", "e"] {
            guard.attempt_admin_login_at(wrong, now).unwrap();
        }
        let later = now + Duration::seconds(14 * 60 + 1);
        assert!(guard.check_block_status_at(later).unwrap());
        assert_eq!(guard.block_minutes_left_at(later), 1);
    }
}
