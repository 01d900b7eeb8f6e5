//! Change notifications published by record stores.

use serde::{Deserialize, Serialize};

use super::collection::Collection;

/// The kind of mutation a change notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// A record was created or fully replaced.
    Put,
    /// Fields were merged into an existing record.
    Patch,
    /// A record was deleted.
    Remove,
}

/// A single record mutation, published on the store's broadcast channel.
///
/// Listeners treat this as a refetch trigger rather than a data payload,
/// so the notification intentionally carries no document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordChange {
    /// The collection that changed.
    pub collection: Collection,
    /// The key of the changed record.
    pub key: String,
    /// What happened to it.
    pub op: ChangeOp,
}
