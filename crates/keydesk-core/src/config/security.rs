//! Login, lockout, session, and quota configuration.

use serde::{Deserialize, Serialize};

/// Authentication, lockout, and quota configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// The admin console secret. Compared via Argon2id after being hashed
    /// once at startup; never stored in plaintext beyond this config value.
    pub admin_secret: String,
    /// Maximum failed login attempts before lockout.
    pub max_attempts: u32,
    /// Session lifetime in minutes, measured from login.
    pub session_timeout_minutes: u64,
    /// Lockout duration in minutes after the attempt limit is reached.
    pub block_minutes: u64,
    /// Default per-manager license quota offered when creating a manager.
    pub default_manager_quota: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_secret: default_admin_secret(),
            max_attempts: default_max_attempts(),
            session_timeout_minutes: default_session_timeout(),
            block_minutes: default_block_minutes(),
            default_manager_quota: default_manager_quota(),
        }
    }
}

fn default_admin_secret() -> String {
    "780431".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_session_timeout() -> u64 {
    30
}

fn default_block_minutes() -> u64 {
    15
}

fn default_manager_quota() -> u32 {
    10
}
