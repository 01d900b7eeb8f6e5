//! # keydesk-core
//!
//! Core crate for KeyDesk. Contains the storage traits, configuration
//! schemas, collection names, and the unified error system.
//!
//! This crate has **no** internal dependencies on other KeyDesk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
