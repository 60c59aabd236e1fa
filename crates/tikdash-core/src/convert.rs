// ── Row-to-domain conversions ──
//
// Bridges raw `tikdash_api` row types into canonical `model` types.
// RouterOS reports every value as a string; each `From` impl parses
// the numerics and fills sensible defaults for missing optional data.

use tikdash_api::models::{
    HotspotActiveRow, HotspotProfileRow, HotspotUserRow, ResourceRow, RouterboardRow,
};

use crate::model::{ActiveSession, BoardInfo, HotspotProfile, HotspotUser, ResourceStats};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an optional numeric string, defaulting to zero. RouterOS
/// counters are plain decimal.
fn parse_u64(raw: &Option<String>) -> u64 {
    raw.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
}

fn parse_u32(raw: &Option<String>) -> u32 {
    raw.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// RouterOS booleans arrive as the strings `"true"`/`"false"`.
fn parse_bool(raw: &Option<String>) -> bool {
    raw.as_deref() == Some("true")
}

// ── System ─────────────────────────────────────────────────────────

impl From<&ResourceRow> for ResourceStats {
    fn from(r: &ResourceRow) -> Self {
        Self {
            cpu_load: parse_u32(&r.cpu_load),
            free_memory: parse_u64(&r.free_memory),
            total_memory: parse_u64(&r.total_memory),
            uptime: r.uptime.clone().unwrap_or_else(|| "unknown".into()),
        }
    }
}

impl From<RouterboardRow> for BoardInfo {
    fn from(r: RouterboardRow) -> Self {
        Self {
            model: r.model,
            serial_number: r.serial_number,
            current_firmware: r.current_firmware,
        }
    }
}

// ── Hotspot ────────────────────────────────────────────────────────

impl From<HotspotActiveRow> for ActiveSession {
    fn from(r: HotspotActiveRow) -> Self {
        Self {
            id: r.id,
            user: r.user.unwrap_or_default(),
            address: r.address,
            mac: r.mac_address,
            login_by: r.login_by,
            uptime: r.uptime,
            bytes_in: parse_u64(&r.bytes_in),
            bytes_out: parse_u64(&r.bytes_out),
        }
    }
}

impl From<HotspotUserRow> for HotspotUser {
    fn from(r: HotspotUserRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            password: r.password,
            profile: r.profile,
            uptime: r.uptime,
            bytes_in: parse_u64(&r.bytes_in),
            bytes_out: parse_u64(&r.bytes_out),
            disabled: parse_bool(&r.disabled),
            comment: r.comment,
        }
    }
}

impl From<HotspotProfileRow> for HotspotProfile {
    fn from(r: HotspotProfileRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            shared_users: r.shared_users,
            rate_limit: r.rate_limit,
            session_timeout: r.session_timeout,
            idle_timeout: r.idle_timeout,
            keepalive_timeout: r.keepalive_timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resource_stats_parse_numeric_strings() {
        let row = ResourceRow {
            version: Some("7.14.3 (stable)".into()),
            uptime: Some("1w2d".into()),
            cpu_load: Some("12".into()),
            free_memory: Some("845873152".into()),
            total_memory: Some("1073741824".into()),
            board_name: None,
            platform: None,
        };

        let stats = ResourceStats::from(&row);
        assert_eq!(stats.cpu_load, 12);
        assert_eq!(stats.free_memory, 845_873_152);
        assert_eq!(stats.total_memory, 1_073_741_824);
        assert_eq!(stats.uptime, "1w2d");
    }

    #[test]
    fn unparseable_counters_default_to_zero() {
        let row = HotspotActiveRow {
            id: "*1".into(),
            user: Some("guest".into()),
            address: None,
            mac_address: None,
            login_by: None,
            uptime: None,
            bytes_in: Some("lots".into()),
            bytes_out: None,
        };

        let session = ActiveSession::from(row);
        assert_eq!(session.bytes_in, 0);
        assert_eq!(session.bytes_out, 0);
    }

    #[test]
    fn disabled_flag_parses_provider_strings() {
        let mut row = HotspotUserRow {
            id: "*1".into(),
            name: "guest".into(),
            password: None,
            profile: None,
            uptime: None,
            bytes_in: None,
            bytes_out: None,
            disabled: Some("true".into()),
            comment: None,
        };
        assert!(HotspotUser::from(row.clone()).disabled);

        row.disabled = Some("false".into());
        assert!(!HotspotUser::from(row.clone()).disabled);

        row.disabled = None;
        assert!(!HotspotUser::from(row).disabled);
    }
}
