//! Manager roster entity model.

pub mod model;

pub use model::{Manager, UpdateManager};
