// ── MikroTik Neighbor Discovery Protocol ──
//
// `codec` owns the wire format; `engine` owns the sockets and the
// scan/listen lifecycles.

pub mod codec;
pub mod engine;

pub use codec::MNDP_PORT;
pub use engine::{discover, Discovery, ListenerHandle, SCAN_WINDOW, SEND_INTERVAL};
