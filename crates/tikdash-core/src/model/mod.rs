// ── Domain model ──
//
// Canonical representations of everything the dashboard shows. Raw
// provider rows (kebab-case keys, stringly values) are normalized into
// these types at the session boundary by `crate::convert`.

pub mod device;
pub mod hotspot;
pub mod session;

pub use device::DiscoveredDevice;
pub use hotspot::{ActiveSession, HotspotProfile, HotspotUser};
pub use session::{BoardInfo, ResourceStats, SessionSummary};
