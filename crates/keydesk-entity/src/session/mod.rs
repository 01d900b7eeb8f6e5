//! Console session state model.

pub mod model;

pub use model::{AuthState, UserType};
