// ── Hotspot domain types ──

use serde::{Deserialize, Serialize};

/// A client currently online through the captive portal
/// (`ip/hotspot/active`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub id: String,
    pub user: String,
    pub address: Option<String>,
    pub mac: Option<String>,
    pub login_by: Option<String>,
    pub uptime: Option<String>,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// A provisioned hotspot account (`ip/hotspot/user`).
///
/// The password is intentionally exposed here — these are voucher
/// credentials the dashboard prints for guests, not operator secrets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotUser {
    pub id: String,
    pub name: String,
    pub password: Option<String>,
    pub profile: Option<String>,
    pub uptime: Option<String>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub disabled: bool,
    pub comment: Option<String>,
}

/// A hotspot user profile (`ip/hotspot/user/profile`): rate and
/// timeout policy shared by the accounts assigned to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotProfile {
    pub id: String,
    pub name: String,
    pub shared_users: Option<String>,
    pub rate_limit: Option<String>,
    pub session_timeout: Option<String>,
    pub idle_timeout: Option<String>,
    pub keepalive_timeout: Option<String>,
}
