//! License entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A license key record.
///
/// The key doubles as the record's primary identifier in the remote store;
/// on the wire the document body carries it too, but the map key is
/// authoritative when reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    /// The license key string, supplied by the operator at creation.
    #[serde(default)]
    pub key: String,
    /// End-user name the key was issued to.
    #[serde(default)]
    pub user_name: String,
    /// Expiry date (`YYYY-MM-DD`); empty means no expiry.
    #[serde(default)]
    pub expires_at: String,
    /// Hardware-id link token; empty until a client binds the key.
    #[serde(default)]
    pub hwid: String,
    /// Free-form operator notes.
    #[serde(default)]
    pub notes: String,
    /// Whether the key has been consumed by a client.
    #[serde(default)]
    pub used: bool,
    /// When the record was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the record was last modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// When the HWID was last reset, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

/// Derived license state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Unused and not past its expiry date.
    Active,
    /// Consumed by a client.
    Used,
    /// Past its expiry date.
    Expired,
}

impl License {
    /// Whether the expiry date has passed. A missing or unparseable date
    /// never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match parse_expiry(&self.expires_at) {
            Some(expiry) => expiry < now,
            None => false,
        }
    }

    /// Whether a hardware id is bound to this key.
    pub fn has_hwid(&self) -> bool {
        !self.hwid.trim().is_empty()
    }

    /// Derived status. Expiry wins over `used`.
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.is_expired_at(now) {
            LicenseStatus::Expired
        } else if self.used {
            LicenseStatus::Used
        } else {
            LicenseStatus::Active
        }
    }
}

/// Parses an expiry value as either a full RFC 3339 timestamp or a bare
/// date (interpreted as midnight UTC).
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Fields supplied when issuing a new license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicense {
    /// The explicit key. No collision check is performed; an existing
    /// record under the same key is overwritten.
    pub key: String,
    /// End-user name.
    pub user_name: String,
    /// Expiry date (`YYYY-MM-DD`), empty for none.
    pub expires_at: String,
    /// Operator notes.
    pub notes: String,
}

/// Partial update applied to an existing license.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLicense {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_expiry_never_expires() {
        let license = License {
            key: "K-1".into(),
            expires_at: String::new(),
            ..blank()
        };
        assert!(!license.is_expired_at(at(2099, 1, 1)));
        assert_eq!(license.status_at(at(2099, 1, 1)), LicenseStatus::Active);
    }

    #[test]
    fn date_expiry_is_compared_against_midnight() {
        let license = License {
            expires_at: "2024-05-01".into(),
            ..blank()
        };
        assert!(license.is_expired_at(at(2024, 5, 1)));
        assert!(!license.is_expired_at(at(2024, 4, 30)));
    }

    #[test]
    fn expiry_wins_over_used() {
        let license = License {
            expires_at: "2020-01-01".into(),
            used: true,
            ..blank()
        };
        assert_eq!(license.status_at(at(2024, 1, 1)), LicenseStatus::Expired);
    }

    #[test]
    fn camel_case_wire_form() {
        let license = License {
            key: "K-9".into(),
            user_name: "alice".into(),
            ..blank()
        };
        let json = serde_json::to_value(&license).unwrap();
        assert!(json.get("userName").is_some());
        assert!(json.get("user_name").is_none());
    }

    fn blank() -> License {
        License {
            key: String::new(),
            user_name: String::new(),
            expires_at: String::new(),
            hwid: String::new(),
            notes: String::new(),
            used: false,
            created_at: None,
            last_updated: None,
            reset_at: None,
        }
    }
}
