//! Console session state model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which identity holds the console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// The single admin identity.
    Admin,
    /// A delegated manager.
    Manager,
}

impl UserType {
    /// The persisted tag for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            _ => Err(()),
        }
    }
}

/// The in-memory session/lockout state, mirrored into the persistent
/// key-value store.
///
/// Invariants: `user_type == Some(Manager)` implies `manager_id` names a
/// roster entry; an active block only prevents *new* logins, it never
/// terminates an open session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthState {
    /// Whether a session is currently open.
    pub is_logged_in: bool,
    /// Consecutive failed login attempts.
    pub login_attempts: u32,
    /// Instant the active lockout lifts, if any.
    pub blocked_until: Option<DateTime<Utc>>,
    /// When the open session started.
    pub session_start: Option<DateTime<Utc>>,
    /// Role of the open session.
    pub user_type: Option<UserType>,
    /// Manager identity, set iff the role is `Manager`.
    pub manager_id: Option<String>,
}
