//! License entity model, status derivation, and filtering.

pub mod filter;
pub mod model;

pub use filter::{LicenseFilter, LicenseStats};
pub use model::{CreateLicense, License, LicenseStatus, UpdateLicense};
