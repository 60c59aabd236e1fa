// Shared mock transport for registry and service tests.
//
// `MockConnector` hands out `MockRouter` channels that serve canned
// rows, record mutations, and can simulate latency, a dropped remote,
// and a close that errors.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use tikdash_api::{ConnectParams, Connector, Error as ApiError, ResourcePath, RouterRpc, Row};

pub fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub struct MockRouter {
    pub identity: String,
    pub latency: Duration,
    pub fail_close: bool,
    pub close_count: AtomicUsize,
    /// Simulates the remote side silently dropping the connection.
    pub dropped: AtomicBool,
    pub added: Mutex<Vec<(ResourcePath, Row)>>,
    pub removed: Mutex<Vec<(ResourcePath, String)>>,
}

impl MockRouter {
    fn new(identity: String, latency: Duration, fail_close: bool) -> Self {
        Self {
            identity,
            latency,
            fail_close,
            close_count: AtomicUsize::new(0),
            dropped: AtomicBool::new(false),
            added: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn drop_remote(&self) {
        self.dropped.store(true, Ordering::SeqCst);
    }

    pub fn closes(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    async fn dispatch(&self) -> Result<(), ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.dropped.load(Ordering::SeqCst) {
            return Err(ApiError::ConnectionRefused {
                host: "mock".into(),
                port: 8728,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RouterRpc for MockRouter {
    async fn list(&self, path: ResourcePath) -> Result<Vec<Row>, ApiError> {
        self.dispatch().await?;
        let rows = match path {
            ResourcePath::HotspotActive => vec![
                row(json!({
                    ".id": "*1",
                    "user": "guest-01",
                    "address": "10.5.50.2",
                    "mac-address": "AA:BB:CC:DD:EE:01",
                    "login-by": "http-chap",
                    "uptime": "1h2m",
                    "bytes-in": "1024",
                    "bytes-out": "2048",
                })),
                row(json!({ ".id": "*2", "user": "guest-02" })),
            ],
            ResourcePath::HotspotUser => vec![row(json!({
                ".id": "*1",
                "name": "guest-01",
                "password": "voucher-pw",
                "profile": "default",
                "bytes-in": "10",
                "bytes-out": "20",
                "disabled": "false",
            }))],
            ResourcePath::HotspotProfile => vec![row(json!({
                ".id": "*1",
                "name": "default",
                "shared-users": "1",
                "rate-limit": "2M/2M",
                "session-timeout": "1h",
                "idle-timeout": "none",
                "keepalive-timeout": "2m",
            }))],
            other => panic!("unexpected list path {other}"),
        };
        Ok(rows)
    }

    async fn get(&self, path: ResourcePath) -> Result<Row, ApiError> {
        self.dispatch().await?;
        let record = match path {
            ResourcePath::SystemIdentity => json!({ "name": self.identity }),
            ResourcePath::SystemResource => json!({
                "version": "7.14.3 (stable)",
                "uptime": "1w2d3h4m5s",
                "cpu-load": "4",
                "free-memory": "845873152",
                "total-memory": "1073741824",
                "board-name": "hAP ax3",
            }),
            ResourcePath::SystemRouterboard => json!({
                "model": "C53UiG+5HPaxD2HPaxD",
                "serial-number": "HEX123456",
                "current-firmware": "7.14.3",
            }),
            other => panic!("unexpected get path {other}"),
        };
        Ok(row(record))
    }

    async fn add(&self, path: ResourcePath, params: Row) -> Result<(), ApiError> {
        self.dispatch().await?;
        self.added.lock().unwrap().push((path, params));
        Ok(())
    }

    async fn remove(&self, path: ResourcePath, id: &str) -> Result<(), ApiError> {
        self.dispatch().await?;
        self.removed.lock().unwrap().push((path, id.to_owned()));
        Ok(())
    }

    async fn close(&self) -> Result<(), ApiError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ApiError::Command {
                message: "simulated close failure".into(),
                status: None,
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockConnector {
    /// Error to return from the next connect attempt.
    fail_next: Mutex<Option<ApiError>>,
    /// Extra handshake latency per host.
    slow_hosts: Mutex<HashMap<String, Duration>>,
    /// Channels created by connects get their close() erroring.
    pub fail_close: AtomicBool,
    /// Per-operation latency applied to created channels.
    pub op_latency: Mutex<Duration>,
    routers: Mutex<Vec<Arc<MockRouter>>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn slow_host(&self, host: &str, latency: Duration) {
        self.slow_hosts.lock().unwrap().insert(host.into(), latency);
    }

    /// Channels handed out so far, in connect order.
    pub fn routers(&self) -> Vec<Arc<MockRouter>> {
        self.routers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn RouterRpc>, ApiError> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }

        let latency = self.slow_hosts.lock().unwrap().get(&params.host).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let router = Arc::new(MockRouter::new(
            format!("{}-identity", params.host),
            *self.op_latency.lock().unwrap(),
            self.fail_close.load(Ordering::SeqCst),
        ));
        self.routers.lock().unwrap().push(Arc::clone(&router));
        Ok(router)
    }
}

/// Recursively assert a serialized envelope never exposes a password.
pub fn assert_no_password_keys(value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            assert!(
                !map.contains_key("password"),
                "serialized view leaked a password field: {value}"
            );
            map.values().for_each(assert_no_password_keys);
        }
        serde_json::Value::Array(items) => items.iter().for_each(assert_no_password_keys),
        _ => {}
    }
}
