//! # keydesk-store
//!
//! [`KeyValueStore`](keydesk_core::traits::KeyValueStore) implementations:
//! a JSON-file-backed durable store for the server process and a purely
//! in-memory store for tests.

pub mod file;
pub mod keys;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
