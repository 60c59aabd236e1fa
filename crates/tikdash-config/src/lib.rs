//! Persisted router records for the tikdash dashboard.
//!
//! A small JSON document store under the platform data directory. The
//! connectivity core treats persistence as optional: when the data
//! directory cannot be used the store degrades to in-memory mode with a
//! warning, and the rest of the system keeps working — saved routers
//! simply do not survive a restart.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const STORE_FILE: &str = "routers.json";

/// One saved router configuration.
///
/// `password` is persisted so reconnects work across restarts; every
/// externally-facing view of this record is produced by
/// [`RouterRecord::redacted`], which drops it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRecord {
    pub id: String,
    pub name: String,
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub last_connected: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

/// A router record with the credential stripped, safe to serialize
/// toward the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRouter {
    pub id: String,
    pub name: String,
    pub host: String,
    pub username: String,
    pub port: u16,
    pub identity: Option<String>,
    pub version: Option<String>,
    pub model: Option<String>,
    pub last_connected: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl RouterRecord {
    /// External view of the record: everything except the password.
    pub fn redacted(&self) -> SavedRouter {
        SavedRouter {
            id: self.id.clone(),
            name: self.name.clone(),
            host: self.host.clone(),
            username: self.username.clone(),
            port: self.port,
            identity: self.identity.clone(),
            version: self.version.clone(),
            model: self.model.clone(),
            last_connected: self.last_connected,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON-file-backed table of saved routers, keyed by record id.
///
/// All mutations rewrite the backing file; write failures are logged
/// and the in-memory state stays authoritative for the process.
pub struct RouterStore {
    path: Option<PathBuf>,
    records: RwLock<HashMap<String, RouterRecord>>,
}

impl RouterStore {
    /// Open the store at the platform data directory.
    ///
    /// Never fails: an unusable directory or an unreadable store file
    /// degrades to in-memory mode with a warning.
    pub fn open() -> Self {
        let Some(dirs) = ProjectDirs::from("", "", "tikdash") else {
            warn!("no usable data directory; router records will not persist");
            return Self::in_memory();
        };

        let dir = dirs.data_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(error = %e, dir = %dir.display(), "cannot create data directory; running in-memory");
            return Self::in_memory();
        }

        Self::at_path(dir.join(STORE_FILE))
    }

    /// Open the store at an explicit file path (used by tests and by
    /// deployments that pin the data location).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match load_records(&path) {
            Ok(records) => records,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "cannot read router store; starting empty");
                HashMap::new()
            }
        };

        debug!(count = records.len(), path = %path.display(), "router store loaded");
        Self {
            path: Some(path),
            records: RwLock::new(records),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Whether records survive a restart.
    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Option<RouterRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// All records, ordered by name for stable presentation.
    pub fn all(&self) -> Vec<RouterRecord> {
        let mut records: Vec<RouterRecord> = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Insert or replace a record.
    pub fn upsert(&self, record: RouterRecord) {
        {
            let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
            records.insert(record.id.clone(), record);
        }
        self.persist();
    }

    /// Flip a record's active flag; ignored for unknown ids.
    pub fn set_active(&self, id: &str, is_active: bool) {
        let changed = {
            let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
            match records.get_mut(id) {
                Some(record) => {
                    record.is_active = is_active;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.persist();
        }
    }

    /// Delete a record. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
            records.remove(id).is_some()
        };
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        let Some(ref path) = self.path else { return };

        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut ordered: Vec<&RouterRecord> = records.values().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        match serde_json::to_string_pretty(&ordered) {
            Ok(json) => {
                if let Err(e) = fs::write(path, json) {
                    warn!(error = %e, path = %path.display(), "failed to write router store");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize router store"),
        }
    }
}

fn load_records(path: &Path) -> Result<HashMap<String, RouterRecord>, StoreError> {
    let raw = fs::read_to_string(path)?;
    let list: Vec<RouterRecord> = serde_json::from_str(&raw)?;
    Ok(list.into_iter().map(|r| (r.id.clone(), r)).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, name: &str) -> RouterRecord {
        RouterRecord {
            id: id.into(),
            name: name.into(),
            host: "192.168.88.1".into(),
            username: "admin".into(),
            password: "changeme".into(),
            port: 8728,
            identity: Some("gateway".into()),
            version: Some("7.14.3".into()),
            model: None,
            last_connected: Some(Utc::now()),
            is_active: false,
        }
    }

    #[test]
    fn roundtrips_through_the_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routers.json");

        let store = RouterStore::at_path(&path);
        store.upsert(record("a", "office"));
        store.upsert(record("b", "warehouse"));
        store.set_active("b", true);

        // A fresh instance at the same path sees the same records.
        let reopened = RouterStore::at_path(&path);
        let all = reopened.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "office");
        assert!(reopened.get("b").unwrap().is_active);
    }

    #[test]
    fn in_memory_mode_still_serves_records() {
        let store = RouterStore::in_memory();
        assert!(!store.is_persistent());

        store.upsert(record("a", "office"));
        assert_eq!(store.all().len(), 1);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
    }

    #[test]
    fn unreadable_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routers.json");
        fs::write(&path, "not json at all").unwrap();

        let store = RouterStore::at_path(&path);
        assert!(store.all().is_empty());
        // Still writable afterwards.
        store.upsert(record("a", "office"));
        assert_eq!(RouterStore::at_path(&path).all().len(), 1);
    }

    #[test]
    fn set_active_ignores_unknown_ids() {
        let store = RouterStore::in_memory();
        store.set_active("nope", true);
        assert!(store.all().is_empty());
    }

    #[test]
    fn redacted_view_has_no_password() {
        let saved = record("a", "office").redacted();
        let json = serde_json::to_value(&saved).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json.get("host").and_then(|v| v.as_str()), Some("192.168.88.1"));
    }
}
