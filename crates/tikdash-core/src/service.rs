// ── Dashboard service facade ──
//
// The typed surface the HTTP layer calls into. Every operation
// resolves to an envelope with a `success` flag and a human-readable
// message — a misbehaving router turns into a failed envelope for
// that one call, never a fault that takes the process down. Envelopes
// serialize to camelCase and, by construction, never carry a password
// or a transport handle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tikdash_api::models::HotspotUserRequest;
use tikdash_api::{Connector, ResourcePath, RestConnector};
use tikdash_config::{RouterStore, SavedRouter};

use crate::error::CoreError;
use crate::mndp::Discovery;
use crate::model::{ActiveSession, DiscoveredDevice, HotspotProfile, HotspotUser, SessionSummary};
use crate::registry::ConnectionRegistry;
use crate::session::SessionConfig;

/// Default cadence of the background liveness sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ── Response envelopes ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub success: bool,
    pub message: String,
    pub devices: Vec<DiscoveredDevice>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub sessions: Vec<ActiveSession>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotUsersResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub users: Vec<HotspotUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotProfilesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profiles: Vec<HotspotProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoutersResponse {
    pub success: bool,
    pub routers: Vec<SavedRouter>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub connected_routers: usize,
}

// ── Requests ─────────────────────────────────────────────────────────

/// Inbound connect parameters, as posted by the dashboard.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Existing key makes this a reconnect.
    pub session_id: Option<String>,
    pub name: Option<String>,
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub port: Option<u16>,
}

// ── Service ──────────────────────────────────────────────────────────

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Window for establishing a router connection.
    pub connect_timeout: Duration,
    /// Cadence of the background liveness sweep; zero disables it.
    pub sweep_interval: Duration,
    /// Discovery engine tuning.
    pub discovery: Discovery,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            connect_timeout: tikdash_api::DEFAULT_CONNECT_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            discovery: Discovery::default(),
        }
    }
}

/// The connectivity core behind the dashboard.
///
/// Owns the [`ConnectionRegistry`], the router-record store, and the
/// discovery engine. Constructed once at process start and injected
/// into the HTTP layer.
pub struct HotspotService {
    registry: Arc<ConnectionRegistry>,
    store: Arc<RouterStore>,
    connector: Arc<dyn Connector>,
    config: ServiceConfig,
    cancel: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl HotspotService {
    pub fn new(connector: Arc<dyn Connector>, store: Arc<RouterStore>, config: ServiceConfig) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new(Arc::clone(&connector))),
            store,
            connector,
            config,
            cancel: CancellationToken::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Production wiring: REST transport and the platform-dir store.
    pub fn with_defaults() -> Self {
        let store = RouterStore::open();
        if !store.is_persistent() {
            warn!("router store is not persistent; saved routers will not survive a restart");
        }
        Self::new(Arc::new(RestConnector), Arc::new(store), ServiceConfig::default())
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<RouterStore> {
        &self.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the periodic liveness sweep, if enabled.
    pub fn start_sweeper(&self) {
        if self.config.sweep_interval.is_zero() {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let cancel = self.cancel.clone();
        let interval = self.config.sweep_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = registry.sweep().await;
                    }
                }
            }
        });

        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = sweeper.replace(handle) {
            old.abort();
        }
    }

    /// Stop the sweeper and close every session.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.registry.disconnect_all().await;
        info!("hotspot service shut down");
    }

    // ── Connection management ────────────────────────────────────────

    /// Probe a router without registering a session.
    pub async fn test_connection(
        &self,
        host: String,
        username: String,
        password: SecretString,
        port: Option<u16>,
    ) -> TestConnectionResponse {
        let params = tikdash_api::ConnectParams {
            host,
            port: port.unwrap_or(tikdash_api::DEFAULT_API_PORT),
            username,
            password,
            timeout: self.config.connect_timeout,
        };

        let rpc = match self.connector.connect(&params).await {
            Ok(rpc) => rpc,
            Err(e) => {
                return TestConnectionResponse {
                    success: false,
                    message: CoreError::classify_connect(e).to_string(),
                    identity: None,
                };
            }
        };

        let identity = match rpc.get(ResourcePath::SystemIdentity).await {
            Ok(row) => tikdash_api::models::from_row::<tikdash_api::models::IdentityRow>(row)
                .map(|i| i.name)
                .ok(),
            Err(_) => None,
        };
        let _ = rpc.close().await;

        TestConnectionResponse {
            success: true,
            message: "connection successful".into(),
            identity,
        }
    }

    /// Connect (or reconnect) to a router and persist its record.
    pub async fn connect(&self, request: ConnectRequest) -> ConnectResponse {
        let config = SessionConfig {
            session_id: request.session_id,
            name: request.name,
            host: request.host,
            username: request.username,
            password: request.password,
            port: request.port.unwrap_or(tikdash_api::DEFAULT_API_PORT),
            timeout: self.config.connect_timeout,
        };

        match self.registry.connect(config).await {
            Ok(session) => {
                self.store.upsert(session.record());
                ConnectResponse {
                    success: true,
                    message: "router connected".into(),
                    session: Some(session.summary()),
                }
            }
            Err(e) => ConnectResponse {
                success: false,
                message: e.to_string(),
                session: None,
            },
        }
    }

    /// Summaries of every live session.
    pub fn list_sessions(&self) -> SessionsResponse {
        SessionsResponse {
            success: true,
            sessions: self.registry.list(),
        }
    }

    /// One session with freshly-pulled stats and the online-client
    /// count. This is the lookup-with-health-check path: a session
    /// observed `Disconnected` here is evicted.
    pub async fn get_session(&self, session_id: &str) -> SessionResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return SessionResponse {
                success: false,
                message: e.to_string(),
                session: None,
            },
        };

        match session.fetch_resource_stats().await {
            Ok(_) => {
                let active_users = session
                    .list_active_sessions()
                    .await
                    .map(|sessions| sessions.len())
                    .ok();
                let mut summary = session.summary();
                summary.active_users = active_users;
                SessionResponse {
                    success: true,
                    message: "ok".into(),
                    session: Some(summary),
                }
            }
            Err(CoreError::Disconnected) => {
                self.registry.evict(session_id).await;
                self.store.set_active(session_id, false);
                SessionResponse {
                    success: false,
                    message: CoreError::Disconnected.to_string(),
                    session: None,
                }
            }
            Err(e) => SessionResponse {
                success: false,
                message: e.to_string(),
                session: None,
            },
        }
    }

    /// Close a session and forget it. Succeeds even when the transport
    /// close fails; only an unknown id is an error.
    pub async fn disconnect(&self, session_id: &str) -> StatusResponse {
        match self.registry.disconnect(session_id).await {
            Ok(()) => {
                self.store.set_active(session_id, false);
                StatusResponse::ok("router disconnected")
            }
            Err(e) => StatusResponse::fail(e.to_string()),
        }
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Run one active discovery scan over the local broadcast domain.
    pub async fn discover(&self) -> DiscoverResponse {
        let devices = self.config.discovery.scan().await;
        let count = devices.len();
        DiscoverResponse {
            success: true,
            message: format!("found {count} MikroTik router(s)"),
            devices,
            count,
        }
    }

    // ── Hotspot operations ───────────────────────────────────────────

    /// Clients currently online through the hotspot.
    pub async fn get_active_sessions(&self, session_id: &str) -> ActiveSessionsResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return ActiveSessionsResponse {
                success: false,
                message: Some(e.to_string()),
                sessions: Vec::new(),
            },
        };

        match session.list_active_sessions().await {
            Ok(sessions) => ActiveSessionsResponse {
                success: true,
                message: None,
                sessions,
            },
            Err(e) => ActiveSessionsResponse {
                success: false,
                message: Some(e.to_string()),
                sessions: Vec::new(),
            },
        }
    }

    /// All provisioned hotspot accounts.
    pub async fn get_hotspot_users(&self, session_id: &str) -> HotspotUsersResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return HotspotUsersResponse {
                success: false,
                message: Some(e.to_string()),
                users: Vec::new(),
            },
        };

        match session.list_hotspot_users().await {
            Ok(users) => HotspotUsersResponse {
                success: true,
                message: None,
                users,
            },
            Err(e) => HotspotUsersResponse {
                success: false,
                message: Some(e.to_string()),
                users: Vec::new(),
            },
        }
    }

    /// All hotspot user profiles.
    pub async fn get_hotspot_profiles(&self, session_id: &str) -> HotspotProfilesResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return HotspotProfilesResponse {
                success: false,
                message: Some(e.to_string()),
                profiles: Vec::new(),
            },
        };

        match session.list_hotspot_profiles().await {
            Ok(profiles) => HotspotProfilesResponse {
                success: true,
                message: None,
                profiles,
            },
            Err(e) => HotspotProfilesResponse {
                success: false,
                message: Some(e.to_string()),
                profiles: Vec::new(),
            },
        }
    }

    /// Provision a hotspot account.
    pub async fn create_hotspot_user(
        &self,
        session_id: &str,
        request: HotspotUserRequest,
    ) -> StatusResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return StatusResponse::fail(e.to_string()),
        };

        match session.create_hotspot_user(request).await {
            Ok(()) => StatusResponse::ok("user created successfully"),
            Err(e) => StatusResponse::fail(e.to_string()),
        }
    }

    /// Delete a hotspot account.
    pub async fn delete_hotspot_user(&self, session_id: &str, user_id: &str) -> StatusResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return StatusResponse::fail(e.to_string()),
        };

        match session.delete_hotspot_user(user_id).await {
            Ok(()) => StatusResponse::ok("user deleted successfully"),
            Err(e) => StatusResponse::fail(e.to_string()),
        }
    }

    /// Kick a client off the hotspot.
    pub async fn disconnect_active_session(
        &self,
        session_id: &str,
        active_id: &str,
    ) -> StatusResponse {
        let session = match self.registry.get(session_id) {
            Ok(session) => session,
            Err(e) => return StatusResponse::fail(e.to_string()),
        };

        match session.disconnect_active_session(active_id).await {
            Ok(()) => StatusResponse::ok("user disconnected successfully"),
            Err(e) => StatusResponse::fail(e.to_string()),
        }
    }

    // ── Saved routers / health ───────────────────────────────────────

    /// Persisted router records (credentials stripped), with the
    /// active flag reflecting live registry state.
    pub fn saved_routers(&self) -> SavedRoutersResponse {
        let routers = self
            .store
            .all()
            .into_iter()
            .map(|record| {
                let mut saved = record.redacted();
                saved.is_active = self.registry.get(&saved.id).is_ok();
                saved
            })
            .collect();

        SavedRoutersResponse {
            success: true,
            routers,
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            success: true,
            message: "service is running".into(),
            connected_routers: self.registry.len(),
        }
    }
}
