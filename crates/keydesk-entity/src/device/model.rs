//! Connected-device and ban entity models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A device currently registered with the console.
///
/// The id is generated once by the client and persists across reconnects,
/// so re-registration upserts rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineDevice {
    /// Client-persistent device identifier.
    #[serde(default)]
    pub id: String,
    /// Client-reported device name.
    pub device_name: String,
    /// Role of the session the device belongs to (`admin`/`manager`).
    pub user_type: String,
    /// Last heartbeat instant.
    pub last_seen: DateTime<Utc>,
    /// Whether the device currently reports itself online.
    pub is_online: bool,
}

impl OnlineDevice {
    /// Whether the device was seen within the online window.
    pub fn seen_within(&self, window_seconds: u64, now: DateTime<Utc>) -> bool {
        now - self.last_seen < Duration::seconds(window_seconds as i64)
    }
}

/// A timed device ban.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannedDevice {
    /// Store-generated identifier.
    #[serde(default)]
    pub id: String,
    /// The banned device's name.
    pub device_name: String,
    /// When the ban was issued.
    pub banned_at: DateTime<Utc>,
    /// When the ban lifts.
    pub banned_until: DateTime<Utc>,
    /// Who issued the ban.
    pub banned_by: String,
    /// Optional operator-supplied reason.
    pub reason: Option<String>,
}

impl BannedDevice {
    /// Whether the ban is still in force.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.banned_until > now
    }
}
