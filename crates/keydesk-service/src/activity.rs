//! Activity log over the record store.

use std::sync::Arc;

use chrono::Utc;
use tracing::error;

use keydesk_core::result::AppResult;
use keydesk_core::traits::RecordStore;
use keydesk_core::types::Collection;
use keydesk_entity::activity::ActivityLog;

/// Most recent entries returned by [`ActivityLogger::recent`].
const RECENT_LIMIT: usize = 100;

/// Appends and reads console activity entries.
#[derive(Clone)]
pub struct ActivityLogger {
    records: Arc<dyn RecordStore>,
}

impl ActivityLogger {
    /// Creates a logger over the given record store.
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Appends an entry. Best-effort: a failed append is logged and
    /// swallowed so it never blocks the action it describes.
    pub async fn log(
        &self,
        action_type: &str,
        performed_by: &str,
        license_key: Option<&str>,
        user_name: Option<&str>,
        details: Option<&str>,
    ) {
        let entry = ActivityLog {
            id: String::new(),
            action_type: action_type.to_string(),
            license_key: license_key.map(String::from),
            user_name: user_name.map(String::from),
            performed_by: performed_by.to_string(),
            details: details.map(String::from),
            created_at: Utc::now(),
        };

        let value = match serde_json::to_value(&entry) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Failed to serialize activity entry");
                return;
            }
        };

        if let Err(e) = self.records.insert(Collection::ActivityLogs, &value).await {
            error!(action_type, error = %e, "Failed to append activity entry");
        }
    }

    /// The most recent entries, newest first, capped at 100.
    pub async fn recent(&self) -> AppResult<Vec<ActivityLog>> {
        let raw = self.records.list(Collection::ActivityLogs).await?;

        let mut entries: Vec<ActivityLog> = raw
            .into_iter()
            .filter_map(|(id, value)| {
                serde_json::from_value::<ActivityLog>(value)
                    .ok()
                    .map(|mut entry| {
                        entry.id = id;
                        entry
                    })
            })
            .collect();

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(RECENT_LIMIT);
        Ok(entries)
    }

    /// Deletes every entry.
    pub async fn clear(&self) -> AppResult<()> {
        let raw = self.records.list(Collection::ActivityLogs).await?;
        for key in raw.keys() {
            self.records.remove(Collection::ActivityLogs, key).await?;
        }
        Ok(())
    }
}
