//! Acting identity threaded through controller operations.

use serde::{Deserialize, Serialize};

/// Who is performing a console operation.
///
/// Extracted from the session by the API layer and passed into service
/// methods so every mutation knows whether quota gating applies and how
/// to attribute the action in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// The single admin identity.
    Admin,
    /// A delegated manager.
    Manager {
        /// Roster id of the manager.
        id: String,
        /// Display name, used for log attribution.
        name: String,
    },
}

impl Actor {
    /// Whether the actor is the admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Roster id when the actor is a manager.
    pub fn manager_id(&self) -> Option<&str> {
        match self {
            Self::Admin => None,
            Self::Manager { id, .. } => Some(id),
        }
    }

    /// Attribution label for the activity log.
    pub fn performed_by(&self) -> String {
        match self {
            Self::Admin => "admin".to_string(),
            Self::Manager { name, .. } => name.clone(),
        }
    }
}
