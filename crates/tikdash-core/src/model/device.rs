// ── Discovered device ──

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One RouterOS device seen on the local broadcast domain.
///
/// Ephemeral: produced per discovery run (or per listener callback) and
/// never persisted. Any combination of fields may be populated — the
/// announcement protocol sends whatever the device knows about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    /// Hardware address, canonical uppercase colon-hex. Dedup key.
    pub mac_address: Option<String>,
    /// Configured device name.
    pub identity: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub board_name: Option<String>,
    pub software_id: Option<String>,
    pub uptime_seconds: Option<u32>,
    /// IPv4 address as announced inside the packet. For display,
    /// [`source_address`](Self::source_address) is authoritative.
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
    pub unpack: Option<String>,
    pub interface_name: Option<String>,
    /// Origin IP of the UDP packet that announced this device.
    pub source_address: Option<IpAddr>,
    pub discovered_at: Option<DateTime<Utc>>,
}

impl DiscoveredDevice {
    /// A device is only worth reporting if it carries both a MAC
    /// address and an identity; anything less is noise or our own
    /// request echoed back.
    pub fn is_usable(&self) -> bool {
        self.mac_address.is_some() && self.identity.is_some()
    }

    /// Best address for reaching the device: the packet origin wins
    /// over whatever IPv4 the payload announced.
    pub fn host(&self) -> Option<String> {
        self.source_address
            .map(|addr| addr.to_string())
            .or_else(|| self.ipv4_address.clone())
    }
}
