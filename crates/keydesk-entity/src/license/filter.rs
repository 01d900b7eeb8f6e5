//! Client-side license filtering, search, and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::License;

/// Status/link filter applied to the license list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseFilter {
    /// No filtering.
    #[default]
    All,
    /// Unused and unexpired keys.
    Active,
    /// Consumed keys.
    Used,
    /// Keys past their expiry date.
    Expired,
    /// Keys with a bound hardware id.
    Linked,
    /// Keys without a bound hardware id.
    Unlinked,
}

impl LicenseFilter {
    /// Whether a license passes this filter.
    pub fn matches(&self, license: &License, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Active => !license.used && !license.is_expired_at(now),
            Self::Used => license.used,
            Self::Expired => license.is_expired_at(now),
            Self::Linked => license.has_hwid(),
            Self::Unlinked => !license.has_hwid(),
        }
    }
}

/// Applies the status filter and a case-insensitive key/user search.
pub fn filter_licenses(
    licenses: &[License],
    filter: LicenseFilter,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<License> {
    let query = query.trim().to_lowercase();
    licenses
        .iter()
        .filter(|l| filter.matches(l, now))
        .filter(|l| {
            query.is_empty()
                || l.key.to_lowercase().contains(&query)
                || l.user_name.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Aggregate counts shown on the dashboard stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseStats {
    /// Total number of licenses.
    pub total: usize,
    /// Unused, unexpired licenses.
    pub active: usize,
    /// Consumed licenses.
    pub used: usize,
    /// Expired licenses.
    pub expired: usize,
}

/// Computes aggregate license counts.
///
/// The categories overlap: a used-and-expired key counts under both
/// `used` and `expired`.
pub fn license_stats(licenses: &[License], now: DateTime<Utc>) -> LicenseStats {
    LicenseStats {
        total: licenses.len(),
        active: licenses
            .iter()
            .filter(|l| !l.used && !l.is_expired_at(now))
            .count(),
        used: licenses.iter().filter(|l| l.used).count(),
        expired: licenses.iter().filter(|l| l.is_expired_at(now)).count(),
    }
}

/// Sorts licenses newest-first by creation time.
pub fn sort_newest_first(licenses: &mut [License]) {
    licenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
