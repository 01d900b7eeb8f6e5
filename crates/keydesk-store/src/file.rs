//! JSON-file-backed key-value store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use tracing::warn;

use keydesk_core::error::AppError;
use keydesk_core::result::AppResult;
use keydesk_core::traits::KeyValueStore;

/// Durable key-value store persisted as a single JSON object file.
///
/// The full map is rewritten on every mutation via a temp file and atomic
/// rename, so a crash mid-write leaves the previous contents intact.
/// Reads are served from the in-memory mirror.
#[derive(Debug)]
pub struct FileStore {
    /// Backing file path.
    path: PathBuf,
    /// In-memory mirror of the file contents.
    entries: DashMap<String, String>,
    /// Serializes flushes so concurrent mutations cannot interleave writes.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store, loading existing contents if the file is present.
    ///
    /// A malformed file is treated as empty and logged, never fatal.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| AppError::storage(format!("Failed to read store file: {e}")))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => {
                    for (k, v) in map {
                        entries.insert(k, v);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Store file is malformed, starting empty");
                }
            }
        } else if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::storage(format!("Failed to create store dir: {e}")))?;
            }
        }

        Ok(Self {
            path,
            entries,
            write_lock: Mutex::new(()),
        })
    }

    /// Writes the current map to disk via temp file and rename.
    fn flush(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let json = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| AppError::storage(format!("Failed to write store file: {e}")))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::storage(format!("Failed to replace store file: {e}")))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("keydesk-store-test-{name}-{}", std::process::id()));
        path
    }

    #[test]
    fn roundtrip_survives_reopen() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        store.set("alpha", "1").unwrap();
        store.set("beta", "two").unwrap();
        store.remove("alpha").unwrap();
        drop(store);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("alpha").unwrap(), None);
        assert_eq!(store.get("beta").unwrap(), Some("two".to_string()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let path = temp_path("malformed");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn removing_absent_key_is_noop() {
        let path = temp_path("noop-remove");
        let _ = fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        store.remove("ghost").unwrap();
        assert_eq!(store.get("ghost").unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
