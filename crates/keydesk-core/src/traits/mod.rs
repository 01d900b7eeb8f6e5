//! Storage traits implemented by the store and remote crates.

pub mod kv;
pub mod records;

pub use kv::KeyValueStore;
pub use records::RecordStore;
