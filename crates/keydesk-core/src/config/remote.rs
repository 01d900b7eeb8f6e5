//! Remote record store connection configuration.

use serde::{Deserialize, Serialize};

/// Connection parameters for the remote document store holding license
/// records, activity logs, the deleted-license archive, and device lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteStoreConfig {
    /// Base URL of the document store.
    pub base_url: String,
    /// Auth token appended to every request.
    pub auth_token: String,
    /// Read-only mirror endpoints whose user maps are counted for the
    /// dashboard stat cards.
    pub mirror_urls: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            mirror_urls: Vec::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    15
}
