//! Logical collection names in the remote record store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The collections KeyDesk reads and writes.
///
/// License records are keyed by the user-supplied license key string; all
/// other collections use store-generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// License key records.
    Licenses,
    /// Append-only activity log entries.
    ActivityLogs,
    /// Soft-deleted license archive.
    DeletedLicenses,
    /// Devices banned from connecting.
    BannedDevices,
    /// Currently connected devices (presence).
    OnlineDevices,
}

impl Collection {
    /// The collection's path segment on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Licenses => "license_keys",
            Self::ActivityLogs => "activity_logs",
            Self::DeletedLicenses => "deleted_licenses",
            Self::BannedDevices => "banned_devices",
            Self::OnlineDevices => "online_devices",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
