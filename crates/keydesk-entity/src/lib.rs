//! # keydesk-entity
//!
//! Serde data models for every record KeyDesk handles: licenses and their
//! archive, the manager roster, session state, devices, and activity logs.
//!
//! License records use camelCase field names on the wire and the
//! remaining collections snake_case, matching their respective backing
//! stores.

pub mod activity;
pub mod archive;
pub mod device;
pub mod license;
pub mod manager;
pub mod session;
