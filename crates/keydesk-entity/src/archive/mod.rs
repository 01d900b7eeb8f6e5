//! Deleted-license archive entity model.

pub mod model;

pub use model::DeletedLicense;
