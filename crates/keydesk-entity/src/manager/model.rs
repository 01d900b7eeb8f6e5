//! Manager entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A delegated operator with a capped license-creation quota.
///
/// The whole roster is persisted as one JSON array in the local key-value
/// store, so the hash field is serialized; API responses use a separate
/// DTO that omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manager {
    /// Unique, generation-time-derived identifier (UUIDv7). Never reused.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Argon2id hash of the manager's login password.
    pub password_hash: String,
    /// Maximum number of licenses this manager may create.
    pub max_licenses: u32,
    /// Advisory count of licenses created so far. Monotonically
    /// non-decreasing except on manual edit.
    pub created_licenses: u32,
    /// When the roster entry was created.
    pub created_at: DateTime<Utc>,
    /// Whether this manager may log in.
    pub is_active: bool,
}

impl Manager {
    /// Whether this manager may create one more license.
    pub fn can_create(&self) -> bool {
        self.created_licenses < self.max_licenses
    }

    /// Licenses left in the quota, clamped to zero when the usage counter
    /// has been edited past the maximum.
    pub fn remaining(&self) -> u32 {
        self.max_licenses.saturating_sub(self.created_licenses)
    }
}

/// Partial update merged into a roster entry.
///
/// Absent fields leave the entry untouched. `password_hash` carries an
/// already-hashed replacement password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateManager {
    /// New display name.
    pub name: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New quota maximum.
    pub max_licenses: Option<u32>,
    /// Manual override of the usage counter.
    pub created_licenses: Option<u32>,
    /// Activation toggle.
    pub is_active: Option<bool>,
}
