// ── MNDP packet codec ──
//
// Wire format: a 4-byte header (opaque sequence field) followed by TLV
// records. Type and length are u16 little-endian; so is the uptime
// value. The one exception is the IPv6 value, read as eight big-endian
// 16-bit groups. This mixed endianness is how the protocol actually
// behaves on the wire — do not "fix" it.

use tracing::warn;

use crate::model::DiscoveredDevice;

/// Well-known UDP port for RouterOS neighbor discovery.
pub const MNDP_PORT: u16 = 5678;

/// Length of the opaque packet header.
const HEADER_LEN: usize = 4;

// Recognized TLV type codes. Everything else is skipped by length.
const TLV_MAC_ADDRESS: u16 = 0x0001;
const TLV_IDENTITY: u16 = 0x0005;
const TLV_VERSION: u16 = 0x0007;
const TLV_PLATFORM: u16 = 0x0008;
const TLV_UPTIME: u16 = 0x000a;
const TLV_SOFTWARE_ID: u16 = 0x000b;
const TLV_BOARD_NAME: u16 = 0x000c;
const TLV_UNPACK: u16 = 0x000e;
const TLV_IPV4_ADDRESS: u16 = 0x0010;
const TLV_IPV6_ADDRESS: u16 = 0x0011;
const TLV_INTERFACE_NAME: u16 = 0x0012;

/// The discovery request: a bare all-zero header. No TLV payload is
/// needed to elicit announcements.
pub fn encode_request() -> [u8; HEADER_LEN] {
    [0; HEADER_LEN]
}

/// Decode one announcement packet.
///
/// Total: whatever fields are present and well-formed are populated,
/// the rest stay `None`. A record whose declared length overruns the
/// buffer truncates parsing and keeps what was already decoded. A
/// header-only buffer (our own request echoed back) decodes to an
/// all-empty device for the caller to filter.
pub fn decode(buffer: &[u8]) -> DiscoveredDevice {
    let mut device = DiscoveredDevice::default();

    if buffer.len() <= HEADER_LEN {
        return device;
    }

    let mut offset = HEADER_LEN;
    // A complete type + length header must fit before reading a record.
    while offset + 4 <= buffer.len() {
        let tlv_type = u16::from_le_bytes([buffer[offset], buffer[offset + 1]]);
        let length = u16::from_le_bytes([buffer[offset + 2], buffer[offset + 3]]) as usize;
        offset += 4;

        if offset + length > buffer.len() {
            warn!(
                tlv_type,
                length, offset, "discovery record overruns the packet; truncating parse"
            );
            break;
        }

        let value = &buffer[offset..offset + length];
        apply_record(&mut device, tlv_type, value);
        offset += length;
    }

    device
}

fn apply_record(device: &mut DiscoveredDevice, tlv_type: u16, value: &[u8]) {
    match tlv_type {
        TLV_MAC_ADDRESS => {
            if value.len() == 6 {
                device.mac_address = Some(format_mac(value));
            }
        }
        TLV_IDENTITY => device.identity = Some(decode_string(value)),
        TLV_VERSION => device.version = Some(decode_string(value)),
        TLV_PLATFORM => device.platform = Some(decode_string(value)),
        TLV_UPTIME => {
            if let Ok(bytes) = <[u8; 4]>::try_from(value) {
                device.uptime_seconds = Some(u32::from_le_bytes(bytes));
            }
        }
        TLV_SOFTWARE_ID => device.software_id = Some(decode_string(value)),
        TLV_BOARD_NAME => device.board_name = Some(decode_string(value)),
        TLV_UNPACK => device.unpack = Some(decode_string(value)),
        TLV_IPV4_ADDRESS => {
            if value.len() == 4 {
                device.ipv4_address =
                    Some(format!("{}.{}.{}.{}", value[0], value[1], value[2], value[3]));
            }
        }
        TLV_IPV6_ADDRESS => {
            if value.len() == 16 {
                device.ipv6_address = Some(format_ipv6(value));
            }
        }
        TLV_INTERFACE_NAME => device.interface_name = Some(decode_string(value)),
        _ => {} // unknown type: skipped by length
    }
}

/// UTF-8 (lossy) with NUL bytes stripped — devices pad some strings.
fn decode_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).replace('\0', "")
}

fn format_mac(value: &[u8]) -> String {
    value
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Eight big-endian 16-bit groups, lowercase hex without zero padding.
fn format_ipv6(value: &[u8]) -> String {
    value
        .chunks_exact(2)
        .map(|pair| format!("{:x}", u16::from_be_bytes([pair[0], pair[1]])))
        .collect::<Vec<_>>()
        .join(":")
}
