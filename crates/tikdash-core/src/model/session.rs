// ── Session-facing types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the router's load figures, cached per session and
/// replaced by stat-refresh operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    /// CPU load percentage.
    pub cpu_load: u32,
    /// Free memory in bytes.
    pub free_memory: u64,
    /// Total memory in bytes.
    pub total_memory: u64,
    /// Uptime as reported by the router (e.g. `"2w3d4h5m6s"`).
    pub uptime: String,
}

/// Hardware details, best-effort: virtual and x86 routers have no
/// routerboard subsystem and report nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardInfo {
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub current_firmware: Option<String>,
}

/// External view of one registered router session.
///
/// This is the ONLY shape a session leaves the core in. It carries no
/// password and no transport handle, so redaction holds on every read
/// path by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub host: String,
    pub username: String,
    pub port: u16,
    pub identity: String,
    pub version: String,
    pub model: String,
    pub cpu_load: u32,
    pub free_memory: u64,
    pub total_memory: u64,
    pub uptime: String,
    pub connected_at: DateTime<Utc>,
    /// Count of clients currently online through the hotspot; only
    /// populated by lookups that refresh it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_users: Option<usize>,
}
