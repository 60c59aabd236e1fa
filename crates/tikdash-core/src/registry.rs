// ── Connection registry ──
//
// The single process-wide authority over which routers are connected.
// Constructed once at startup and injected into whatever serves HTTP —
// never a module-level global. The session table is a `DashMap`:
// mutation locks one shard, so operations on different keys never
// serialize against each other, and the insert/remove swap semantics
// below keep the one-live-transport-per-key invariant under races.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tikdash_api::Connector;

use crate::error::CoreError;
use crate::model::SessionSummary;
use crate::session::{RouterSession, SessionConfig};

pub struct ConnectionRegistry {
    sessions: DashMap<String, Arc<RouterSession>>,
    connector: Arc<dyn Connector>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            sessions: DashMap::new(),
            connector,
        }
    }

    /// Register a session. A caller-supplied `session_id` that is
    /// already present makes this a reconnect: the old session is
    /// closed first — double-connections under one key never coexist —
    /// and the new one takes its place.
    ///
    /// The handshake itself runs without holding any table lock, so a
    /// slow router never stalls connects to other keys.
    pub async fn connect(&self, config: SessionConfig) -> Result<Arc<RouterSession>, CoreError> {
        let id = config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some((_, previous)) = self.sessions.remove(&id) {
            debug!(session_id = %id, "reconnect: retiring previous session");
            previous.close().await;
        }

        let session = Arc::new(RouterSession::establish(id.clone(), config, self.connector.as_ref()).await?);

        // A concurrent connect on the same key may have landed while we
        // were dialing; whichever session gets displaced is closed so
        // exactly one live transport remains registered.
        if let Some(displaced) = self.sessions.insert(id, Arc::clone(&session)) {
            warn!(session_id = %session.id(), "concurrent reconnect displaced a live session");
            displaced.close().await;
        }

        Ok(session)
    }

    /// Look up a session by id.
    pub fn get(&self, session_id: &str) -> Result<Arc<RouterSession>, CoreError> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::NotFound {
                session_id: session_id.to_owned(),
            })
    }

    /// Summaries of every registered session, ordered by name. Never
    /// carries passwords or transport handles.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close and forget a session. The entry is removed first: even a
    /// transport whose close errors is forgotten, never wedged in the
    /// table.
    pub async fn disconnect(&self, session_id: &str) -> Result<(), CoreError> {
        let (_, session) = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| CoreError::NotFound {
                session_id: session_id.to_owned(),
            })?;

        session.close().await;
        info!(session_id, "session disconnected");
        Ok(())
    }

    /// Forget a session observed dead (lookup-with-health-check path).
    /// Quiet no-op when something else already removed it.
    pub async fn evict(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            warn!(session_id, "evicting dead session");
            session.close().await;
        }
    }

    /// Liveness pass: probe every session with a cheap identity fetch
    /// and evict the ones whose remote side has silently dropped.
    /// Returns the evicted ids.
    pub async fn sweep(&self) -> Vec<String> {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut evicted = Vec::new();

        for id in ids {
            // Clone out of the shard before awaiting on the probe.
            let Some(session) = self
                .sessions
                .get(&id)
                .map(|entry| Arc::clone(entry.value()))
            else {
                continue;
            };

            if matches!(session.fetch_identity().await, Err(CoreError::Disconnected)) {
                self.evict(&id).await;
                evicted.push(id);
            }
        }

        if !evicted.is_empty() {
            info!(count = evicted.len(), "liveness sweep evicted dead sessions");
        }
        evicted
    }

    /// Close every session and empty the table (process shutdown).
    pub async fn disconnect_all(&self) {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, session)) = self.sessions.remove(&id) {
                session.close().await;
            }
        }
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
