//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use keydesk_entity::license::LicenseFilter;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Credential for the chosen role path.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Role path: `"admin"` or `"manager"`.
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

/// License listing query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseListQuery {
    /// Status/link filter.
    #[serde(default)]
    pub filter: LicenseFilter,
    /// Case-insensitive key/user search.
    #[serde(default)]
    pub q: String,
}

/// Export query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    /// `"csv"` (default) or `"excel"`.
    #[serde(default)]
    pub format: Option<String>,
    /// Status/link filter.
    #[serde(default)]
    pub filter: LicenseFilter,
    /// Case-insensitive key/user search.
    #[serde(default)]
    pub q: String,
}

/// Create license request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLicenseRequest {
    /// Explicit license key.
    #[validate(length(min = 1, message = "License key is required"))]
    pub key: String,
    /// End-user name.
    #[validate(length(min = 1, message = "User name is required"))]
    pub user_name: String,
    /// Expiry date (`YYYY-MM-DD`), empty for none.
    #[serde(default)]
    pub expires_at: String,
    /// Operator notes.
    #[serde(default)]
    pub notes: String,
}

/// Update license request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLicenseRequest {
    /// New end-user name.
    pub user_name: Option<String>,
    /// New expiry date.
    pub expires_at: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// New used flag.
    pub used: Option<bool>,
    /// New hardware id.
    pub hwid: Option<String>,
}

/// Create manager request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateManagerRequest {
    /// Display name.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Login password. Must not collide with any existing manager's.
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    /// Quota maximum; defaults to the configured per-manager quota.
    pub max_licenses: Option<u32>,
}

/// Update manager request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateManagerRequest {
    /// New display name.
    pub name: Option<String>,
    /// New login password.
    pub password: Option<String>,
    /// New quota maximum.
    pub max_licenses: Option<u32>,
    /// Manual usage-counter override.
    pub created_licenses: Option<u32>,
    /// Activation toggle.
    pub is_active: Option<bool>,
}

/// Device registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    /// Client-persistent device id.
    #[validate(length(min = 1, message = "Device id is required"))]
    pub id: String,
    /// Client-reported device name.
    #[validate(length(min = 1, message = "Device name is required"))]
    pub device_name: String,
}

/// Ban device request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BanDeviceRequest {
    /// Device name to ban.
    #[validate(length(min = 1, message = "Device name is required"))]
    pub device_name: String,
    /// Ban duration in minutes.
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_minutes: u64,
    /// Optional reason.
    pub reason: Option<String>,
}
