//! Device presence configuration.

use serde::{Deserialize, Serialize};

/// Timing parameters for the online-device registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Expected client heartbeat interval in seconds.
    pub heartbeat_seconds: u64,
    /// Devices unseen for longer than this are purged.
    pub stale_after_seconds: u64,
    /// A device counts as online if seen within this window.
    pub online_window_seconds: u64,
    /// Interval of the server-side stale sweep in seconds.
    pub sweep_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_seconds: 30,
            stale_after_seconds: 120,
            online_window_seconds: 60,
            sweep_interval_seconds: 60,
        }
    }
}
