//! Persisted key names.
//!
//! One constant per key so call sites never spell raw strings.

/// `"true"` while a console session is open.
pub const LOGGED_IN: &str = "logged_in";

/// Session start instant in epoch milliseconds.
pub const SESSION_START: &str = "session_start";

/// Consecutive failed login attempt counter.
pub const LOGIN_ATTEMPTS: &str = "login_attempts";

/// Lockout record, JSON `{"until": <epoch-ms>}`.
pub const BLOCKED: &str = "system_blocked";

/// Role tag of the open session (`admin` / `manager`).
pub const USER_TYPE: &str = "user_type";

/// Manager id of the open session, when the role is `manager`.
pub const MANAGER_ID: &str = "manager_id";

/// The full manager roster, JSON array of manager records.
pub const MANAGERS: &str = "managers";
