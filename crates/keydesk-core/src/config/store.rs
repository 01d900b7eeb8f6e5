//! Local persistent key-value store configuration.

use serde::{Deserialize, Serialize};

/// Settings for the durable local key-value store that mirrors session
/// flags, attempt counters, the lockout record, and the manager roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON file backing the store.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> String {
    "data/keydesk.json".to_string()
}
