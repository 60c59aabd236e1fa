// ── Remote command capability ──
//
// `RouterRpc` is the seam between sessions and the wire: path-addressed
// verbs returning row-like key/value records. The production
// implementation is [`RestClient`](crate::RestClient); tests inject
// their own.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ConnectParams;
use crate::error::Error;

/// A single row as returned by the router: provider-chosen keys
/// (`.id`, `bytes-in`, `mac-address`, …) mapped to JSON values.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The closed set of resource paths the dashboard addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourcePath {
    SystemIdentity,
    SystemResource,
    SystemRouterboard,
    HotspotActive,
    HotspotUser,
    HotspotProfile,
}

impl ResourcePath {
    /// The REST path segment for this resource.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemIdentity => "system/identity",
            Self::SystemResource => "system/resource",
            Self::SystemRouterboard => "system/routerboard",
            Self::HotspotActive => "ip/hotspot/active",
            Self::HotspotUser => "ip/hotspot/user",
            Self::HotspotProfile => "ip/hotspot/user/profile",
        }
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path-addressed command capability against one router.
///
/// One implementor instance owns one authenticated channel; the owning
/// session is the only caller. `close()` must be idempotent.
#[async_trait]
pub trait RouterRpc: Send + Sync {
    /// Enumerate all records under a resource path.
    async fn list(&self, path: ResourcePath) -> Result<Vec<Row>, Error>;

    /// Fetch a single-record resource (e.g. `system/identity`).
    async fn get(&self, path: ResourcePath) -> Result<Row, Error>;

    /// Create a record under a resource path.
    async fn add(&self, path: ResourcePath, params: Row) -> Result<(), Error>;

    /// Remove the record with the given `.id` under a resource path.
    async fn remove(&self, path: ResourcePath, id: &str) -> Result<(), Error>;

    /// Release the underlying channel. Idempotent; afterwards every
    /// verb fails with [`Error::Closed`].
    async fn close(&self) -> Result<(), Error>;
}

/// Opens authenticated [`RouterRpc`] channels. The seam the session
/// registry dials through; tests substitute simulated transports.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn RouterRpc>, Error>;
}
