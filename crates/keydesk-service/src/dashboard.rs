//! The dashboard controller.
//!
//! Routes console actions to the record store, gating license creation by
//! role and quota. The ordering contract is: advisory quota check, then
//! the remote mutation, then the local usage increment — only after the
//! store confirmed the write. A remote failure therefore leaves the quota
//! untouched. Two console processes sharing a roster can still both pass
//! the check before either increments; that overrun is an accepted
//! property of advisory quota enforcement, not something this layer
//! papers over.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;

use keydesk_auth::ManagerRoster;
use keydesk_core::error::AppError;
use keydesk_core::result::AppResult;
use keydesk_core::traits::RecordStore;
use keydesk_core::types::Collection;
use keydesk_entity::archive::DeletedLicense;
use keydesk_entity::license::filter::sort_newest_first;
use keydesk_entity::license::{CreateLicense, License, UpdateLicense};

use crate::activity::ActivityLogger;
use crate::context::Actor;

/// License CRUD orchestration with role/quota gating.
#[derive(Clone)]
pub struct DashboardService {
    records: Arc<dyn RecordStore>,
    roster: Arc<Mutex<ManagerRoster>>,
    activity: ActivityLogger,
}

impl DashboardService {
    /// Creates the controller.
    pub fn new(
        records: Arc<dyn RecordStore>,
        roster: Arc<Mutex<ManagerRoster>>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            records,
            roster,
            activity,
        }
    }

    // ── Licenses ─────────────────────────────────────────────────

    /// All licenses, newest first.
    pub async fn list_licenses(&self) -> AppResult<Vec<License>> {
        let raw = self.records.list(Collection::Licenses).await?;
        let mut licenses: Vec<License> = raw
            .into_iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<License>(value)
                    .ok()
                    .map(|mut license| {
                        license.key = key;
                        license
                    })
            })
            .collect();
        sort_newest_first(&mut licenses);
        Ok(licenses)
    }

    /// Issues a new license.
    ///
    /// For a manager actor the quota is checked before any remote call;
    /// exhaustion aborts with a quota error and no store mutation. The
    /// usage counter is incremented only after the store confirms the
    /// write. There is no key collision check: an existing record under
    /// the same key is overwritten.
    pub async fn create_license(&self, actor: &Actor, req: CreateLicense) -> AppResult<License> {
        if let Some(manager_id) = actor.manager_id() {
            let allowed = self.lock_roster().can_create(manager_id);
            if !allowed {
                return Err(AppError::quota(
                    "License creation quota exhausted for this manager",
                ));
            }
        }

        let now = Utc::now();
        let license = License {
            key: req.key.clone(),
            user_name: req.user_name,
            expires_at: req.expires_at,
            hwid: String::new(),
            notes: req.notes,
            used: false,
            created_at: Some(now),
            last_updated: Some(now),
            reset_at: None,
        };

        let value = serde_json::to_value(&license)?;
        self.records
            .put(Collection::Licenses, &license.key, &value)
            .await?;

        if let Some(manager_id) = actor.manager_id() {
            self.lock_roster().increment_usage(manager_id)?;
        }

        info!(key = %license.key, by = %actor.performed_by(), "License created");
        self.activity
            .log(
                "create",
                &actor.performed_by(),
                Some(&license.key),
                Some(&license.user_name),
                None,
            )
            .await;

        Ok(license)
    }

    /// Edits a license. Admin only.
    pub async fn update_license(
        &self,
        actor: &Actor,
        key: &str,
        updates: UpdateLicense,
    ) -> AppResult<()> {
        self.require_admin(actor)?;

        let mut fields = serde_json::Map::new();
        if let Some(user_name) = updates.user_name {
            fields.insert("userName".into(), user_name.into());
        }
        if let Some(expires_at) = updates.expires_at {
            fields.insert("expiresAt".into(), expires_at.into());
        }
        if let Some(notes) = updates.notes {
            fields.insert("notes".into(), notes.into());
        }
        if let Some(used) = updates.used {
            fields.insert("used".into(), used.into());
        }
        if let Some(hwid) = updates.hwid {
            fields.insert("hwid".into(), hwid.into());
        }
        fields.insert(
            "lastUpdated".into(),
            serde_json::to_value(Utc::now())?,
        );

        self.records
            .patch(Collection::Licenses, key, &serde_json::Value::Object(fields))
            .await?;

        self.activity
            .log("update", &actor.performed_by(), Some(key), None, None)
            .await;
        Ok(())
    }

    /// Unbinds the hardware id and marks the key unused. Admin only.
    pub async fn reset_hwid(&self, actor: &Actor, key: &str) -> AppResult<()> {
        self.require_admin(actor)?;

        let now = serde_json::to_value(Utc::now())?;
        let fields = serde_json::json!({
            "hwid": "",
            "used": false,
            "resetAt": now.clone(),
            "lastUpdated": now,
        });

        self.records
            .patch(Collection::Licenses, key, &fields)
            .await?;

        self.activity
            .log("reset_hwid", &actor.performed_by(), Some(key), None, None)
            .await;
        Ok(())
    }

    /// Hard-deletes a license. Admin only.
    pub async fn delete_license(&self, actor: &Actor, key: &str) -> AppResult<()> {
        self.require_admin(actor)?;

        self.records.remove(Collection::Licenses, key).await?;
        info!(key, by = %actor.performed_by(), "License deleted");
        self.activity
            .log("delete", &actor.performed_by(), Some(key), None, None)
            .await;
        Ok(())
    }

    // ── Archive (extended delete flow) ───────────────────────────

    /// Soft-deletes: copies the license into the archive, then removes the
    /// live record. Admin only.
    pub async fn archive_license(&self, actor: &Actor, key: &str) -> AppResult<()> {
        self.require_admin(actor)?;

        let raw = self
            .records
            .get(Collection::Licenses, key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("License '{key}' not found")))?;
        let mut license: License = serde_json::from_value(raw)?;
        license.key = key.to_string();

        let archived = DeletedLicense {
            id: String::new(),
            original_key: license.key.clone(),
            user_name: some_nonempty(&license.user_name),
            expires_at: some_nonempty(&license.expires_at),
            hwid: some_nonempty(&license.hwid),
            notes: some_nonempty(&license.notes),
            deleted_by: actor.performed_by(),
            deleted_at: Utc::now(),
        };

        self.records
            .insert(Collection::DeletedLicenses, &serde_json::to_value(&archived)?)
            .await?;
        self.records.remove(Collection::Licenses, key).await?;

        self.activity
            .log(
                "archive",
                &actor.performed_by(),
                Some(key),
                archived.user_name.as_deref(),
                None,
            )
            .await;
        Ok(())
    }

    /// Archived licenses, newest deletion first.
    pub async fn deleted_licenses(&self) -> AppResult<Vec<DeletedLicense>> {
        let raw = self.records.list(Collection::DeletedLicenses).await?;
        let mut entries: Vec<DeletedLicense> = raw
            .into_iter()
            .filter_map(|(id, value)| {
                serde_json::from_value::<DeletedLicense>(value)
                    .ok()
                    .map(|mut entry| {
                        entry.id = id;
                        entry
                    })
            })
            .collect();
        entries.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(entries)
    }

    /// Re-creates an archived license under its original key, then drops
    /// the archive row. Admin only.
    pub async fn restore_license(&self, actor: &Actor, archive_id: &str) -> AppResult<License> {
        self.require_admin(actor)?;

        let raw = self
            .records
            .get(Collection::DeletedLicenses, archive_id)
            .await?
            .ok_or_else(|| AppError::not_found("Archived license not found"))?;
        let archived: DeletedLicense = serde_json::from_value(raw)?;

        let now = Utc::now();
        let license = License {
            key: archived.original_key.clone(),
            user_name: archived.user_name.clone().unwrap_or_default(),
            expires_at: archived.expires_at.clone().unwrap_or_default(),
            hwid: archived.hwid.clone().unwrap_or_default(),
            notes: archived.notes.clone().unwrap_or_default(),
            used: false,
            created_at: Some(now),
            last_updated: Some(now),
            reset_at: None,
        };

        // Recreate first so a failure cannot lose the archived copy.
        self.records
            .put(
                Collection::Licenses,
                &license.key,
                &serde_json::to_value(&license)?,
            )
            .await?;
        self.records
            .remove(Collection::DeletedLicenses, archive_id)
            .await?;

        self.activity
            .log(
                "restore",
                &actor.performed_by(),
                Some(&license.key),
                archived.user_name.as_deref(),
                None,
            )
            .await;
        Ok(license)
    }

    /// Removes an archive row for good. Admin only.
    pub async fn purge_archived(&self, actor: &Actor, archive_id: &str) -> AppResult<()> {
        self.require_admin(actor)?;

        self.records
            .remove(Collection::DeletedLicenses, archive_id)
            .await?;
        self.activity
            .log("purge", &actor.performed_by(), None, None, Some(archive_id))
            .await;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    fn require_admin(&self, actor: &Actor) -> AppResult<()> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }

    fn lock_roster(&self) -> std::sync::MutexGuard<'_, ManagerRoster> {
        self.roster.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn some_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keydesk_remote::MemoryRecordStore;
    use keydesk_store::MemoryStore;
    use std::collections::BTreeMap;
    use tokio::sync::broadcast;

    fn service_with(records: Arc<dyn RecordStore>) -> (DashboardService, Arc<Mutex<ManagerRoster>>) {
        let kv = Arc::new(MemoryStore::new());
        let roster = Arc::new(Mutex::new(ManagerRoster::load(kv).unwrap()));
        let activity = ActivityLogger::new(records.clone());
        (
            DashboardService::new(records, roster.clone(), activity),
            roster,
        )
    }

    fn manager_actor(roster: &Arc<Mutex<ManagerRoster>>, name: &str, quota: u32) -> Actor {
        let manager = roster.lock().unwrap().add(name, "pw", quota).unwrap();
        Actor::Manager {
            id: manager.id,
            name: manager.name,
        }
    }

    fn create_req(key: &str) -> CreateLicense {
        CreateLicense {
            key: key.into(),
            user_name: "omar".into(),
            expires_at: "2030-01-01".into(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn manager_at_quota_is_rejected_before_any_write() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, roster) = service_with(records.clone());
        let actor = manager_actor(&roster, "omar", 0);

        let err = service.create_license(&actor, create_req("K-1")).await;
        assert_eq!(err.unwrap_err().kind, keydesk_core::error::ErrorKind::Quota);
        assert!(records.list(Collection::Licenses).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn manager_creation_increments_usage_after_confirmed_write() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, roster) = service_with(records.clone());
        let actor = manager_actor(&roster, "omar", 2);
        let id = actor.manager_id().unwrap().to_string();

        service.create_license(&actor, create_req("K-1")).await.unwrap();
        assert_eq!(roster.lock().unwrap().get(&id).unwrap().created_licenses, 1);

        service.create_license(&actor, create_req("K-2")).await.unwrap();
        let err = service.create_license(&actor, create_req("K-3")).await;
        assert!(err.is_err());
        assert_eq!(records.list(Collection::Licenses).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_is_never_quota_gated() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, _) = service_with(records.clone());

        for i in 0..20 {
            service
                .create_license(&Actor::Admin, create_req(&format!("K-{i}")))
                .await
                .unwrap();
        }
        assert_eq!(records.list(Collection::Licenses).await.unwrap().len(), 20);
    }

    /// Record store that fails every write, for increment-ordering tests.
    struct FailingStore {
        changes: broadcast::Sender<keydesk_core::types::RecordChange>,
    }

    impl FailingStore {
        fn new() -> Self {
            let (changes, _) = broadcast::channel(4);
            Self { changes }
        }
    }

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn list(
            &self,
            _: Collection,
        ) -> AppResult<BTreeMap<String, serde_json::Value>> {
            Ok(BTreeMap::new())
        }
        async fn get(&self, _: Collection, _: &str) -> AppResult<Option<serde_json::Value>> {
            Ok(None)
        }
        async fn put(&self, _: Collection, _: &str, _: &serde_json::Value) -> AppResult<()> {
            Err(AppError::remote("store down"))
        }
        async fn insert(&self, _: Collection, _: &serde_json::Value) -> AppResult<String> {
            Err(AppError::remote("store down"))
        }
        async fn patch(&self, _: Collection, _: &str, _: &serde_json::Value) -> AppResult<()> {
            Err(AppError::remote("store down"))
        }
        async fn remove(&self, _: Collection, _: &str) -> AppResult<()> {
            Err(AppError::remote("store down"))
        }
        fn subscribe(&self) -> broadcast::Receiver<keydesk_core::types::RecordChange> {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn remote_failure_leaves_quota_untouched() {
        let records: Arc<dyn RecordStore> = Arc::new(FailingStore::new());
        let (service, roster) = service_with(records);
        let actor = manager_actor(&roster, "omar", 5);
        let id = actor.manager_id().unwrap().to_string();

        let err = service.create_license(&actor, create_req("K-1")).await;
        assert!(err.is_err());
        assert_eq!(roster.lock().unwrap().get(&id).unwrap().created_licenses, 0);
    }

    #[tokio::test]
    async fn non_admin_cannot_mutate_existing_licenses() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, roster) = service_with(records);
        let actor = manager_actor(&roster, "omar", 5);

        let err = service.delete_license(&actor, "K-1").await.unwrap_err();
        assert_eq!(err.kind, keydesk_core::error::ErrorKind::Forbidden);
        let err = service.reset_hwid(&actor, "K-1").await.unwrap_err();
        assert_eq!(err.kind, keydesk_core::error::ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn archive_then_restore_roundtrip() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, _) = service_with(records.clone());

        service
            .create_license(&Actor::Admin, create_req("K-1"))
            .await
            .unwrap();
        service.archive_license(&Actor::Admin, "K-1").await.unwrap();

        assert!(records
            .get(Collection::Licenses, "K-1")
            .await
            .unwrap()
            .is_none());
        let archived = service.deleted_licenses().await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].original_key, "K-1");
        assert_eq!(archived[0].user_name.as_deref(), Some("omar"));

        let restored = service
            .restore_license(&Actor::Admin, &archived[0].id)
            .await
            .unwrap();
        assert_eq!(restored.key, "K-1");
        assert!(service.deleted_licenses().await.unwrap().is_empty());
        assert!(records
            .get(Collection::Licenses, "K-1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_keys_from_map() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let (service, _) = service_with(records.clone());

        service
            .create_license(&Actor::Admin, create_req("OLD"))
            .await
            .unwrap();
        // Make creation times distinct.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .create_license(&Actor::Admin, create_req("NEW"))
            .await
            .unwrap();

        let licenses = service.list_licenses().await.unwrap();
        assert_eq!(licenses[0].key, "NEW");
        assert_eq!(licenses[1].key, "OLD");
    }
}
