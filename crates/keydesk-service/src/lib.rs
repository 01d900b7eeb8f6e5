//! # keydesk-service
//!
//! The dashboard controller layer: composes the auth state machines with
//! the record store to gate license mutations by role and quota, plus the
//! device presence/ban registry, the activity log, and export formatting.

pub mod activity;
pub mod context;
pub mod dashboard;
pub mod export;
pub mod presence;

pub use activity::ActivityLogger;
pub use context::Actor;
pub use dashboard::DashboardService;
pub use presence::PresenceService;
