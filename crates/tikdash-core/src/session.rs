// ── Router session ──
//
// One live, authenticated connection to one router. The transport
// handle is exclusively owned here; every remote operation goes
// through the typed command surface below, and `close()` acts as a
// barrier — nothing dispatches on a closing transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use tikdash_api::models::{
    self, HotspotActiveRow, HotspotProfileRow, HotspotUserRequest, HotspotUserRow, IdentityRow,
    ResourceRow, RouterboardRow,
};
use tikdash_api::{ConnectParams, Connector, ResourcePath, RouterRpc};
use tikdash_config::RouterRecord;

use crate::error::CoreError;
use crate::model::{ActiveSession, BoardInfo, HotspotProfile, HotspotUser, ResourceStats, SessionSummary};

/// Everything needed to register a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Reconnect key; a fresh id is generated when absent.
    pub session_id: Option<String>,
    /// Display name; falls back to the router's identity.
    pub name: Option<String>,
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            session_id: None,
            name: None,
            host: host.into(),
            username: username.into(),
            password,
            port: tikdash_api::DEFAULT_API_PORT,
            timeout: tikdash_api::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub(crate) fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.timeout,
        }
    }
}

/// An authenticated session to one router.
pub struct RouterSession {
    id: String,
    name: String,
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    rpc: Arc<dyn RouterRpc>,
    identity: String,
    version: String,
    model: String,
    connected_at: DateTime<Utc>,
    stats: RwLock<ResourceStats>,
    closed: AtomicBool,
}

impl RouterSession {
    /// Dial, authenticate, and take the initial identity/resource
    /// snapshot. Board info is best-effort — virtual routers have no
    /// routerboard subsystem.
    ///
    /// Failures are classified for the operator: `Timeout` (naming the
    /// attempted port), `ConnectionRefused`, `AuthenticationFailed`,
    /// or a passthrough `Unknown`.
    pub(crate) async fn establish(
        id: String,
        config: SessionConfig,
        connector: &dyn Connector,
    ) -> Result<Self, CoreError> {
        let rpc = connector
            .connect(&config.connect_params())
            .await
            .map_err(CoreError::classify_connect)?;

        let (identity_row, resource_row, board_row) = tokio::join!(
            rpc.get(ResourcePath::SystemIdentity),
            rpc.get(ResourcePath::SystemResource),
            rpc.get(ResourcePath::SystemRouterboard),
        );

        let identity: IdentityRow = identity_row
            .and_then(models::from_row)
            .map_err(CoreError::classify_connect)?;
        let resource: ResourceRow = resource_row
            .and_then(models::from_row)
            .map_err(CoreError::classify_connect)?;
        let board: Option<RouterboardRow> = board_row
            .ok()
            .and_then(|row| models::from_row(row).ok());

        let stats = ResourceStats::from(&resource);
        let model = board
            .and_then(|b| b.model)
            .or(resource.board_name)
            .unwrap_or_else(|| "unknown".into());
        let version = resource.version.unwrap_or_else(|| "unknown".into());
        let name = config.name.clone().unwrap_or_else(|| identity.name.clone());

        info!(
            session_id = %id,
            host = %config.host,
            identity = %identity.name,
            "router session established"
        );

        Ok(Self {
            id,
            name,
            host: config.host,
            port: config.port,
            username: config.username,
            password: config.password,
            rpc,
            identity: identity.name,
            version,
            model,
            connected_at: Utc::now(),
            stats: RwLock::new(stats),
            closed: AtomicBool::new(false),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// External view of this session: cached stats, no password, no
    /// transport handle.
    pub fn summary(&self) -> SessionSummary {
        let stats = self
            .stats
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            host: self.host.clone(),
            username: self.username.clone(),
            port: self.port,
            identity: self.identity.clone(),
            version: self.version.clone(),
            model: self.model.clone(),
            cpu_load: stats.cpu_load,
            free_memory: stats.free_memory,
            total_memory: stats.total_memory,
            uptime: stats.uptime,
            connected_at: self.connected_at,
            active_users: None,
        }
    }

    /// The persistable record for this session, credential included —
    /// this is the one internal path that reads the password, and it
    /// feeds the store, never a response.
    pub fn record(&self) -> RouterRecord {
        RouterRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.expose_secret().to_owned(),
            port: self.port,
            identity: Some(self.identity.clone()),
            version: Some(self.version.clone()),
            model: Some(self.model.clone()),
            last_connected: Some(self.connected_at),
            is_active: true,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn fetch_identity(&self) -> Result<String, CoreError> {
        self.ensure_open()?;
        let row = self.rpc.get(ResourcePath::SystemIdentity).await?;
        let identity: IdentityRow = models::from_row(row)?;
        Ok(identity.name)
    }

    /// Pull fresh load figures and replace the cached snapshot.
    pub async fn fetch_resource_stats(&self) -> Result<ResourceStats, CoreError> {
        self.ensure_open()?;
        let row = self.rpc.get(ResourcePath::SystemResource).await?;
        let resource: ResourceRow = models::from_row(row)?;
        let stats = ResourceStats::from(&resource);

        *self.stats.write().unwrap_or_else(|e| e.into_inner()) = stats.clone();
        Ok(stats)
    }

    /// Best-effort hardware query: routers without the routerboard
    /// subsystem yield an empty result rather than an error. A lost
    /// connection still surfaces as `Disconnected`.
    pub async fn fetch_board_info(&self) -> Result<BoardInfo, CoreError> {
        self.ensure_open()?;
        match self.rpc.get(ResourcePath::SystemRouterboard).await {
            Ok(row) => {
                let board: RouterboardRow = models::from_row(row)?;
                Ok(BoardInfo::from(board))
            }
            Err(e) if e.is_connection_lost() => Err(CoreError::Disconnected),
            Err(e) => {
                debug!(session_id = %self.id, error = %e, "no routerboard subsystem");
                Ok(BoardInfo::default())
            }
        }
    }

    pub async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, CoreError> {
        self.ensure_open()?;
        let rows = self.rpc.list(ResourcePath::HotspotActive).await?;
        let typed: Vec<HotspotActiveRow> = models::from_rows(rows)?;
        Ok(typed.into_iter().map(ActiveSession::from).collect())
    }

    pub async fn list_hotspot_users(&self) -> Result<Vec<HotspotUser>, CoreError> {
        self.ensure_open()?;
        let rows = self.rpc.list(ResourcePath::HotspotUser).await?;
        let typed: Vec<HotspotUserRow> = models::from_rows(rows)?;
        Ok(typed.into_iter().map(HotspotUser::from).collect())
    }

    pub async fn list_hotspot_profiles(&self) -> Result<Vec<HotspotProfile>, CoreError> {
        self.ensure_open()?;
        let rows = self.rpc.list(ResourcePath::HotspotProfile).await?;
        let typed: Vec<HotspotProfileRow> = models::from_rows(rows)?;
        Ok(typed.into_iter().map(HotspotProfile::from).collect())
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create_hotspot_user(&self, request: HotspotUserRequest) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.rpc
            .add(ResourcePath::HotspotUser, request.into_row())
            .await?;
        Ok(())
    }

    pub async fn delete_hotspot_user(&self, user_id: &str) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.rpc.remove(ResourcePath::HotspotUser, user_id).await?;
        Ok(())
    }

    pub async fn disconnect_active_session(&self, active_id: &str) -> Result<(), CoreError> {
        self.ensure_open()?;
        self.rpc
            .remove(ResourcePath::HotspotActive, active_id)
            .await?;
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Release the transport. Idempotent: the underlying handle is
    /// closed exactly once, and a failing close is logged, never
    /// raised — a stuck remote must not keep a session alive.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.rpc.close().await {
            warn!(session_id = %self.id, error = %e, "transport close failed; dropping it anyway");
        }
        debug!(session_id = %self.id, "session closed");
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.is_closed() {
            return Err(CoreError::Disconnected);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RouterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterSession")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("identity", &self.identity)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
