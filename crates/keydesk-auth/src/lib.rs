//! # keydesk-auth
//!
//! The two access-control state machines of the console:
//!
//! - [`SessionGuard`] — login-attempt throttling with a timed lockout and
//!   a bounded-lifetime session, persisted through an injected
//!   key-value store.
//! - [`ManagerRoster`] — the delegated-manager roster with per-manager
//!   license-creation quotas.
//!
//! Both are plain synchronous state machines: no network access, no UI
//! coupling. Credentials are stored as Argon2id hashes and verified with
//! constant-time comparison.

pub mod password;
pub mod roster;
pub mod session;

pub use password::PasswordHasher;
pub use roster::ManagerRoster;
pub use session::{LoginOutcome, SessionGuard};
