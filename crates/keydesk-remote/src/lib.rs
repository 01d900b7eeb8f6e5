//! # keydesk-remote
//!
//! [`RecordStore`](keydesk_core::traits::RecordStore) implementations: an
//! HTTP client for the remote document store that holds license records,
//! logs, the archive, and device lists; plus an in-memory fake for tests.
//! Also the read-only mirror-database user counters.

pub mod client;
pub mod memory;
pub mod mirrors;

pub use client::HttpRecordStore;
pub use memory::MemoryRecordStore;
pub use mirrors::MirrorStats;
