//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keydesk_entity::device::OnlineDevice;
use keydesk_entity::manager::Manager;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Role of the opened session.
    pub user_type: String,
    /// Manager id when the role is `manager`.
    pub manager_id: Option<String>,
    /// Manager display name when the role is `manager`.
    pub manager_name: Option<String>,
    /// Seconds until the session countdown expires.
    pub time_left_seconds: u64,
}

/// Session status, polled by the login screen and the dashboard footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    /// Whether a session is open.
    pub logged_in: bool,
    /// Role of the open session.
    pub user_type: Option<String>,
    /// Manager id of the open session.
    pub manager_id: Option<String>,
    /// Seconds left in the session countdown.
    pub time_left_seconds: u64,
    /// Attempts left before lockout.
    pub attempts_left: u32,
    /// Whether a lockout is in force.
    pub blocked: bool,
    /// Whole minutes until the lockout lifts.
    pub block_minutes_left: i64,
}

/// Manager summary without the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerResponse {
    /// Roster id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Quota maximum.
    pub max_licenses: u32,
    /// Licenses created so far.
    pub created_licenses: u32,
    /// Licenses left in the quota.
    pub remaining: u32,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// Whether the manager may log in.
    pub is_active: bool,
}

impl From<&Manager> for ManagerResponse {
    fn from(manager: &Manager) -> Self {
        Self {
            id: manager.id.clone(),
            name: manager.name.clone(),
            max_licenses: manager.max_licenses,
            created_licenses: manager.created_licenses,
            remaining: manager.remaining(),
            created_at: manager.created_at,
            is_active: manager.is_active,
        }
    }
}

/// Per-manager quota status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaResponse {
    /// Licenses left.
    pub remaining: u32,
    /// Whether one more creation is allowed.
    pub can_create: bool,
}

/// Device listing with the derived online count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListResponse {
    /// Registered devices, most recently seen first.
    pub devices: Vec<OnlineDevice>,
    /// Devices seen within the online window.
    pub online_count: usize,
}

/// Mirror-database user count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorCountResponse {
    /// Zero-based mirror index.
    pub index: usize,
    /// Number of users in that mirror.
    pub users: u64,
}
