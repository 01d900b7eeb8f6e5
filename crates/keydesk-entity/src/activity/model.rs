//! Activity log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit trail entry for a console action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    /// Store-generated identifier.
    #[serde(default)]
    pub id: String,
    /// Action tag, e.g. `"create"`, `"delete"`, `"reset_hwid"`.
    pub action_type: String,
    /// License key the action touched, if any.
    pub license_key: Option<String>,
    /// End-user name on the affected license, if any.
    pub user_name: Option<String>,
    /// Who performed the action (`"admin"` or a manager name).
    pub performed_by: String,
    /// Free-form detail text.
    pub details: Option<String>,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}
