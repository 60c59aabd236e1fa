//! Router discovery and connection management for the tikdash
//! dashboard.
//!
//! Four pieces, leaf-first:
//!
//! - [`mndp`] — the neighbor-discovery TLV codec and the UDP
//!   broadcast/listen engine that finds RouterOS devices on the local
//!   broadcast domain.
//! - [`session`] — one authenticated connection per router with a
//!   typed command surface and uniform error classification.
//! - [`registry`] — the process-wide table of live sessions.
//! - [`service`] — the envelope-returning facade the HTTP layer calls.

pub mod convert;
pub mod error;
pub mod mndp;
pub mod model;
pub mod registry;
pub mod service;
pub mod session;

pub use error::CoreError;
pub use mndp::{discover, Discovery, ListenerHandle, MNDP_PORT};
pub use model::{
    ActiveSession, BoardInfo, DiscoveredDevice, HotspotProfile, HotspotUser, ResourceStats,
    SessionSummary,
};
pub use registry::ConnectionRegistry;
pub use service::{ConnectRequest, HotspotService, ServiceConfig};
pub use session::{RouterSession, SessionConfig};

// Re-exported so facade callers can build requests without naming the
// transport crate.
pub use tikdash_api::models::HotspotUserRequest;
pub use tikdash_api::{Connector, RestConnector, DEFAULT_API_PORT, DEFAULT_CONNECT_TIMEOUT};
