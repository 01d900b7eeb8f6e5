//! Deleted-license archive entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A soft-deleted license held in the archive collection.
///
/// Restoring re-creates the license under `original_key` and removes this
/// row; permanent deletion removes the row alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedLicense {
    /// Store-generated identifier.
    #[serde(default)]
    pub id: String,
    /// The key the license was issued under.
    pub original_key: String,
    /// End-user name at deletion time.
    pub user_name: Option<String>,
    /// Expiry date at deletion time.
    pub expires_at: Option<String>,
    /// Bound hardware id at deletion time.
    pub hwid: Option<String>,
    /// Notes at deletion time.
    pub notes: Option<String>,
    /// Who deleted the license.
    pub deleted_by: String,
    /// When it was deleted.
    pub deleted_at: DateTime<Utc>,
}
