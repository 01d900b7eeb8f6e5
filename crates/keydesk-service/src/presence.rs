//! Connected-device registry and timed bans.
//!
//! Devices register under a client-persistent id and heartbeat while the
//! console is open. Staleness is enforced lazily on read and by the
//! periodic sweep; bans expire the same way. Consumers subscribe to the
//! record store's change channel and refetch on any device mutation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use keydesk_core::config::presence::PresenceConfig;
use keydesk_core::result::AppResult;
use keydesk_core::traits::RecordStore;
use keydesk_core::types::{Collection, RecordChange};
use keydesk_entity::device::{BannedDevice, OnlineDevice};

/// The device presence and ban service.
#[derive(Clone)]
pub struct PresenceService {
    records: Arc<dyn RecordStore>,
    config: PresenceConfig,
}

/// Device listing plus the derived online count.
#[derive(Debug, Clone)]
pub struct DeviceListing {
    /// All registered devices, most recently seen first.
    pub devices: Vec<OnlineDevice>,
    /// How many were seen within the online window.
    pub online_count: usize,
}

impl PresenceService {
    /// Creates the service.
    pub fn new(records: Arc<dyn RecordStore>, config: PresenceConfig) -> Self {
        Self { records, config }
    }

    /// Registers (or re-registers) a device under its persistent id.
    pub async fn register(&self, id: &str, device_name: &str, user_type: &str) -> AppResult<()> {
        let device = OnlineDevice {
            id: id.to_string(),
            device_name: device_name.to_string(),
            user_type: user_type.to_string(),
            last_seen: Utc::now(),
            is_online: true,
        };

        self.records
            .put(
                Collection::OnlineDevices,
                id,
                &serde_json::to_value(&device)?,
            )
            .await?;
        debug!(id, device_name, "Device registered");
        Ok(())
    }

    /// Touches a device's last-seen timestamp.
    pub async fn heartbeat(&self, id: &str) -> AppResult<()> {
        let fields = serde_json::json!({
            "last_seen": serde_json::to_value(Utc::now())?,
            "is_online": true,
        });
        self.records
            .patch(Collection::OnlineDevices, id, &fields)
            .await
    }

    /// Lists devices after purging stale ones, newest-seen first.
    pub async fn list(&self) -> AppResult<DeviceListing> {
        self.purge_stale_devices().await?;

        let now = Utc::now();
        let raw = self.records.list(Collection::OnlineDevices).await?;
        let mut devices: Vec<OnlineDevice> = raw
            .into_iter()
            .filter_map(|(id, value)| {
                serde_json::from_value::<OnlineDevice>(value)
                    .ok()
                    .map(|mut d| {
                        d.id = id;
                        d
                    })
            })
            .collect();
        devices.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        let online_count = devices
            .iter()
            .filter(|d| d.seen_within(self.config.online_window_seconds, now))
            .count();

        Ok(DeviceListing {
            devices,
            online_count,
        })
    }

    /// Disconnects a device (admin action, or the device's own goodbye).
    pub async fn kick(&self, id: &str) -> AppResult<()> {
        self.records.remove(Collection::OnlineDevices, id).await?;
        info!(id, "Device removed from registry");
        Ok(())
    }

    /// One sweep pass: purge stale devices and expired bans. Driven by a
    /// server interval task.
    pub async fn sweep(&self) -> AppResult<()> {
        self.purge_stale_devices().await?;
        self.purge_expired_bans().await?;
        Ok(())
    }

    /// Change feed; receiving any device change should trigger a refetch.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.records.subscribe()
    }

    // ── Bans ─────────────────────────────────────────────────────

    /// Bans a device by name for a number of minutes.
    pub async fn ban(
        &self,
        device_name: &str,
        duration_minutes: u64,
        banned_by: &str,
        reason: Option<&str>,
    ) -> AppResult<BannedDevice> {
        let now = Utc::now();
        let ban = BannedDevice {
            id: String::new(),
            device_name: device_name.to_string(),
            banned_at: now,
            banned_until: now + Duration::minutes(duration_minutes as i64),
            banned_by: banned_by.to_string(),
            reason: reason.map(String::from),
        };

        let id = self
            .records
            .insert(Collection::BannedDevices, &serde_json::to_value(&ban)?)
            .await?;
        info!(device_name, until = %ban.banned_until, "Device banned");

        Ok(BannedDevice { id, ..ban })
    }

    /// Lifts a ban.
    pub async fn unban(&self, id: &str) -> AppResult<()> {
        self.records.remove(Collection::BannedDevices, id).await?;
        info!(id, "Ban lifted");
        Ok(())
    }

    /// Active bans after purging expired ones, newest first.
    pub async fn bans(&self) -> AppResult<Vec<BannedDevice>> {
        self.purge_expired_bans().await?;

        let raw = self.records.list(Collection::BannedDevices).await?;
        let mut bans: Vec<BannedDevice> = raw
            .into_iter()
            .filter_map(|(id, value)| {
                serde_json::from_value::<BannedDevice>(value)
                    .ok()
                    .map(|mut b| {
                        b.id = id;
                        b
                    })
            })
            .collect();
        bans.sort_by(|a, b| b.banned_at.cmp(&a.banned_at));
        Ok(bans)
    }

    /// Whether a device name has an unexpired ban.
    pub async fn is_banned(&self, device_name: &str) -> AppResult<bool> {
        let now = Utc::now();
        Ok(self
            .bans()
            .await?
            .iter()
            .any(|b| b.device_name == device_name && b.is_active(now)))
    }

    // ── Internals ────────────────────────────────────────────────

    async fn purge_stale_devices(&self) -> AppResult<()> {
        let cutoff = Utc::now() - Duration::seconds(self.config.stale_after_seconds as i64);
        let raw = self.records.list(Collection::OnlineDevices).await?;

        for (id, value) in raw {
            let last_seen = value
                .get("last_seen")
                .and_then(|v| serde_json::from_value::<chrono::DateTime<Utc>>(v.clone()).ok());
            match last_seen {
                Some(seen) if seen >= cutoff => {}
                _ => {
                    debug!(id, "Purging stale device");
                    self.records.remove(Collection::OnlineDevices, &id).await?;
                }
            }
        }
        Ok(())
    }

    async fn purge_expired_bans(&self) -> AppResult<()> {
        let now = Utc::now();
        let raw = self.records.list(Collection::BannedDevices).await?;

        for (id, value) in raw {
            let until = value
                .get("banned_until")
                .and_then(|v| serde_json::from_value::<chrono::DateTime<Utc>>(v.clone()).ok());
            match until {
                Some(until) if until > now => {}
                _ => {
                    debug!(id, "Purging expired ban");
                    self.records.remove(Collection::BannedDevices, &id).await?;
                }
            }
        }
        Ok(())
    }
}
