//! Delegated-manager roster with per-manager license quotas.
//!
//! The roster is a small in-memory list mirrored into the key-value store
//! as one JSON array. Every mutation rewrites the whole array
//! (last-writer-wins across processes), which matches the coarse
//! overwrite policy of the rest of the persisted state.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use keydesk_core::result::AppResult;
use keydesk_core::traits::KeyValueStore;
use keydesk_entity::manager::{Manager, UpdateManager};
use keydesk_store::keys;

use crate::password::PasswordHasher;

/// The manager roster and quota accounting.
pub struct ManagerRoster {
    kv: Arc<dyn KeyValueStore>,
    hasher: PasswordHasher,
    managers: Vec<Manager>,
}

impl std::fmt::Debug for ManagerRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerRoster")
            .field("managers", &self.managers.len())
            .finish()
    }
}

impl ManagerRoster {
    /// Loads the roster from the store. A malformed persisted roster is
    /// treated as empty and logged, never fatal.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let managers = match kv.get(keys::MANAGERS)? {
            Some(raw) => match serde_json::from_str::<Vec<Manager>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(error = %e, "Malformed manager roster, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self {
            kv,
            hasher: PasswordHasher::new(),
            managers,
        })
    }

    /// All roster entries, active and inactive.
    pub fn managers(&self) -> &[Manager] {
        &self.managers
    }

    /// Looks up a manager by id.
    pub fn get(&self, id: &str) -> Option<&Manager> {
        self.managers.iter().find(|m| m.id == id)
    }

    /// Hashes a plaintext password for storage in the roster.
    pub fn hash_password(&self, plaintext: &str) -> AppResult<String> {
        self.hasher.hash(plaintext)
    }

    /// Advisory pre-check: whether a candidate password matches any roster
    /// entry, active or not. Called by the surface layer before add/update
    /// so manager passwords stay distinguishable at login.
    pub fn password_in_use(&self, candidate: &str) -> bool {
        self.managers
            .iter()
            .any(|m| self.hasher.verify(candidate, &m.password_hash).unwrap_or(false))
    }

    /// Adds a manager with a fresh generation-time-derived id and an empty
    /// usage counter, then persists the whole roster.
    pub fn add(&mut self, name: &str, password: &str, max_licenses: u32) -> AppResult<Manager> {
        let manager = Manager {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            password_hash: self.hasher.hash(password)?,
            max_licenses,
            created_licenses: 0,
            created_at: Utc::now(),
            is_active: true,
        };

        self.managers.push(manager.clone());
        self.persist()?;
        Ok(manager)
    }

    /// Merges the given fields into the matching entry and persists.
    /// A missing id is a no-op.
    pub fn update(&mut self, id: &str, updates: UpdateManager) -> AppResult<()> {
        let Some(manager) = self.managers.iter_mut().find(|m| m.id == id) else {
            return Ok(());
        };

        if let Some(name) = updates.name {
            manager.name = name;
        }
        if let Some(hash) = updates.password_hash {
            manager.password_hash = hash;
        }
        if let Some(max) = updates.max_licenses {
            manager.max_licenses = max;
        }
        if let Some(created) = updates.created_licenses {
            manager.created_licenses = created;
        }
        if let Some(active) = updates.is_active {
            manager.is_active = active;
        }

        self.persist()
    }

    /// Removes the matching entry and persists. No referential-integrity
    /// check is made against licenses that manager created.
    pub fn remove(&mut self, id: &str) -> AppResult<()> {
        self.managers.retain(|m| m.id != id);
        self.persist()
    }

    /// Bumps the usage counter after a store-confirmed license creation.
    /// A missing id leaves the roster unchanged.
    pub fn increment_usage(&mut self, id: &str) -> AppResult<()> {
        let Some(manager) = self.managers.iter_mut().find(|m| m.id == id) else {
            return Ok(());
        };
        manager.created_licenses = manager.created_licenses.saturating_add(1);
        self.persist()
    }

    /// Resolves a login password against active entries.
    ///
    /// A wrong password and a correct password on a deactivated entry are
    /// indistinguishable to the caller: both return `None`.
    pub fn validate_login(&self, password: &str) -> Option<Manager> {
        self.managers
            .iter()
            .filter(|m| m.is_active)
            .find(|m| match self.hasher.verify(password, &m.password_hash) {
                Ok(matched) => matched,
                Err(e) => {
                    warn!(manager_id = %m.id, error = %e, "Unverifiable password hash");
                    false
                }
            })
            .cloned()
    }

    /// Whether the manager may create one more license. False for a
    /// missing id.
    pub fn can_create(&self, id: &str) -> bool {
        self.get(id).is_some_and(Manager::can_create)
    }

    /// Licenses left in the manager's quota; zero for a missing id, and
    /// clamped to zero when the counter was edited past the maximum.
    pub fn remaining(&self, id: &str) -> u32 {
        self.get(id).map_or(0, Manager::remaining)
    }

    fn persist(&self) -> AppResult<()> {
        let json = serde_json::to_string(&self.managers)?;
        self.kv.set(keys::MANAGERS, &json)
    }
}
