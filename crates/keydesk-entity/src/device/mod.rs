//! Connected-device and ban entity models.

pub mod model;

pub use model::{BannedDevice, OnlineDevice};
