// RouterOS row types
//
// Typed views over the raw [`Row`](crate::rpc::Row) records. RouterOS
// reports every value as a string and uses kebab-case keys (plus the
// `.id` internal id), so fields are `String`/`Option<String>` with
// explicit renames. This table IS the provider-to-stable field mapping;
// `tikdash-core` converts these into domain types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::rpc::Row;

/// Decode one raw row into a typed row.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, Error> {
    let value = serde_json::Value::Object(row);
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Decode a list of raw rows into typed rows.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, Error> {
    rows.into_iter().map(from_row).collect()
}

// ── System ───────────────────────────────────────────────────────────

/// `system/identity` — the router's configured name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRow {
    pub name: String,
}

/// `system/resource` — version, uptime, and load figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRow {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default, rename = "cpu-load")]
    pub cpu_load: Option<String>,
    #[serde(default, rename = "free-memory")]
    pub free_memory: Option<String>,
    #[serde(default, rename = "total-memory")]
    pub total_memory: Option<String>,
    #[serde(default, rename = "board-name")]
    pub board_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// `system/routerboard` — hardware details.
///
/// Absent entirely on CHR and x86 installs; callers treat a missing
/// subsystem as an empty result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterboardRow {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "serial-number")]
    pub serial_number: Option<String>,
    #[serde(default, rename = "current-firmware")]
    pub current_firmware: Option<String>,
}

// ── Hotspot ──────────────────────────────────────────────────────────

/// One row from `ip/hotspot/active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotActiveRow {
    #[serde(rename = ".id")]
    pub id: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "mac-address")]
    pub mac_address: Option<String>,
    #[serde(default, rename = "login-by")]
    pub login_by: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default, rename = "bytes-in")]
    pub bytes_in: Option<String>,
    #[serde(default, rename = "bytes-out")]
    pub bytes_out: Option<String>,
}

/// One row from `ip/hotspot/user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotUserRow {
    #[serde(rename = ".id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default, rename = "bytes-in")]
    pub bytes_in: Option<String>,
    #[serde(default, rename = "bytes-out")]
    pub bytes_out: Option<String>,
    #[serde(default)]
    pub disabled: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One row from `ip/hotspot/user/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotProfileRow {
    #[serde(rename = ".id")]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "shared-users")]
    pub shared_users: Option<String>,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: Option<String>,
    #[serde(default, rename = "session-timeout")]
    pub session_timeout: Option<String>,
    #[serde(default, rename = "idle-timeout")]
    pub idle_timeout: Option<String>,
    #[serde(default, rename = "keepalive-timeout")]
    pub keepalive_timeout: Option<String>,
}

/// Parameters for creating a hotspot user.
#[derive(Debug, Clone, Default)]
pub struct HotspotUserRequest {
    pub name: String,
    pub password: String,
    pub profile: Option<String>,
    pub comment: Option<String>,
}

impl HotspotUserRequest {
    /// Render as a raw row for the `add` verb. Optional fields are
    /// omitted rather than sent empty — RouterOS rejects blank values
    /// for some attributes.
    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), self.name.into());
        row.insert("password".into(), self.password.into());
        if let Some(profile) = self.profile {
            row.insert("profile".into(), profile.into());
        }
        if let Some(comment) = self.comment {
            row.insert("comment".into(), comment.into());
        }
        row
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn resource_row_maps_kebab_keys() {
        let parsed: ResourceRow = from_row(row(json!({
            "version": "7.14.3 (stable)",
            "uptime": "2w3d4h5m6s",
            "cpu-load": "7",
            "free-memory": "845873152",
            "total-memory": "1073741824",
            "board-name": "hAP ax3",
        })))
        .unwrap();

        assert_eq!(parsed.cpu_load.as_deref(), Some("7"));
        assert_eq!(parsed.free_memory.as_deref(), Some("845873152"));
        assert_eq!(parsed.board_name.as_deref(), Some("hAP ax3"));
    }

    #[test]
    fn hotspot_user_row_maps_dot_id() {
        let parsed: HotspotUserRow = from_row(row(json!({
            ".id": "*3",
            "name": "guest-01",
            "password": "s3cret",
            "bytes-in": "1024",
            "disabled": "false",
        })))
        .unwrap();

        assert_eq!(parsed.id, "*3");
        assert_eq!(parsed.bytes_in.as_deref(), Some("1024"));
    }

    #[test]
    fn from_row_reports_shape_mismatch() {
        let err = from_row::<HotspotUserRow>(row(json!({ "name": "no-id" }))).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn user_request_omits_empty_optionals() {
        let row = HotspotUserRequest {
            name: "guest".into(),
            password: "pw".into(),
            profile: None,
            comment: Some("voucher batch 7".into()),
        }
        .into_row();

        assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("guest"));
        assert!(!row.contains_key("profile"));
        assert_eq!(
            row.get("comment").and_then(|v| v.as_str()),
            Some("voucher batch 7")
        );
    }
}
