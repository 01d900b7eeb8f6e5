//! Activity log entity model.

pub mod model;

pub use model::ActivityLog;
