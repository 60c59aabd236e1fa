// REST command client
//
// Wraps `reqwest::Client` with RouterOS-specific URL construction,
// error classification, and the `{error, message, detail}` failure
// envelope. The binary API wire protocol is deliberately not
// implemented here — any client for it can stand behind [`RouterRpc`]
// instead of this one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::rpc::{ResourcePath, RouterRpc, Row};

/// Default RouterOS API port.
pub const DEFAULT_API_PORT: u16 = 8728;

/// Default window for establishing and authenticating a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to open an authenticated channel to one router.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub timeout: Duration,
}

impl ConnectParams {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_API_PORT,
            username: username.into(),
            password,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Failure envelope returned by the router's REST surface.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Authenticated command channel to a single router.
///
/// Exclusively owned by one session. Every verb authenticates with the
/// stored credentials; `close()` flips an atomic flag that gates all
/// subsequent dispatch.
#[derive(Debug)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    host: String,
    port: u16,
    timeout_secs: u64,
    username: String,
    password: SecretString,
    closed: AtomicBool,
}

impl RestClient {
    /// Open a channel to `host:port` and verify the credentials with an
    /// identity probe. Failures are classified per the error taxonomy:
    /// [`Error::Timeout`] (carrying the attempted port),
    /// [`Error::ConnectionRefused`], [`Error::Authentication`], or a
    /// passthrough [`Error::Transport`].
    pub async fn connect(params: &ConnectParams) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{}:{}/rest/", params.host, params.port))?;

        let http = reqwest::Client::builder()
            .timeout(params.timeout)
            .connect_timeout(params.timeout)
            .build()
            .map_err(Error::Transport)?;

        let client = Self {
            http,
            base_url,
            host: params.host.clone(),
            port: params.port,
            timeout_secs: params.timeout.as_secs(),
            username: params.username.clone(),
            password: params.password.clone(),
            closed: AtomicBool::new(false),
        };

        // Reachability + credential check in one round trip.
        client.get(ResourcePath::SystemIdentity).await?;
        Ok(client)
    }

    /// The router host this channel talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The router port this channel talks to.
    pub fn port(&self) -> u16 {
        self.port
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn resource_url(&self, path: ResourcePath) -> Result<Url, Error> {
        Ok(self.base_url.join(path.as_str())?)
    }

    fn record_url(&self, path: ResourcePath, id: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("{}/{id}", path.as_str()))?)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Translate a `reqwest` failure into the taxonomy. Timeouts are
    /// checked first — a connect timeout reports both flags, and the
    /// timeout classification is the one that carries the port.
    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            return Error::Timeout {
                port: self.port,
                timeout_secs: self.timeout_secs,
            };
        }

        if err.is_connect() {
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                    if io.kind() == std::io::ErrorKind::ConnectionRefused {
                        return Error::ConnectionRefused {
                            host: self.host.clone(),
                            port: self.port,
                        };
                    }
                }
                source = cause.source();
            }
        }

        Error::Transport(err)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        self.ensure_open()?;

        let response = request
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "invalid username or password".into(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
            let message = parsed
                .and_then(|b| b.detail.or(b.message))
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Command {
                message,
                status: Some(status.as_u16()),
            });
        }

        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, Error> {
        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// [`Connector`](crate::rpc::Connector) producing [`RestClient`]
/// channels — the production dialer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestConnector;

#[async_trait]
impl crate::rpc::Connector for RestConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> Result<std::sync::Arc<dyn RouterRpc>, Error> {
        let client = RestClient::connect(params).await?;
        Ok(std::sync::Arc::new(client))
    }
}

#[async_trait]
impl RouterRpc for RestClient {
    async fn list(&self, path: ResourcePath) -> Result<Vec<Row>, Error> {
        let url = self.resource_url(path)?;
        debug!("GET {url}");
        let response = self.execute(self.http.get(url)).await?;
        self.decode(response).await
    }

    async fn get(&self, path: ResourcePath) -> Result<Row, Error> {
        let url = self.resource_url(path)?;
        debug!("GET {url}");
        let response = self.execute(self.http.get(url)).await?;
        self.decode(response).await
    }

    async fn add(&self, path: ResourcePath, params: Row) -> Result<(), Error> {
        let url = self.resource_url(path)?;
        debug!("PUT {url}");
        self.execute(self.http.put(url).json(&params)).await?;
        Ok(())
    }

    async fn remove(&self, path: ResourcePath, id: &str) -> Result<(), Error> {
        let url = self.record_url(path, id)?;
        debug!("DELETE {url}");
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        // HTTP keeps no long-lived router state; closing just bars
        // further dispatch on this handle.
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
