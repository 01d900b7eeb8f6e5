//! Read-only mirror-database user counters.
//!
//! The dashboard shows how many users each legacy mirror database holds.
//! Each mirror endpoint returns a keyed user map (or `null` when empty);
//! only the key count is of interest.

use std::time::Duration;

use serde_json::Value;

use keydesk_core::config::remote::RemoteStoreConfig;
use keydesk_core::error::AppError;
use keydesk_core::result::AppResult;

/// Client for the configured mirror endpoints.
pub struct MirrorStats {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl MirrorStats {
    /// Creates a client from the remote-store configuration.
    pub fn new(config: &RemoteStoreConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            urls: config.mirror_urls.clone(),
        })
    }

    /// Number of configured mirrors.
    pub fn mirror_count(&self) -> usize {
        self.urls.len()
    }

    /// Counts the users in the mirror at `index` (zero-based).
    pub async fn count_users(&self, index: usize) -> AppResult<u64> {
        let url = self
            .urls
            .get(index)
            .ok_or_else(|| AppError::not_found(format!("No mirror database {index}")))?;

        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::remote(format!("Mirror {index} unreachable: {e}")))?
            .json::<Value>()
            .await
            .map_err(|e| AppError::remote(format!("Mirror {index} returned invalid JSON: {e}")))?;

        match body {
            Value::Null => Ok(0),
            Value::Object(map) => Ok(map.len() as u64),
            _ => Err(AppError::remote(format!(
                "Mirror {index} returned an unexpected payload"
            ))),
        }
    }
}
