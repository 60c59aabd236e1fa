use thiserror::Error;

/// Top-level error type for the `tikdash-api` crate.
///
/// Covers every failure mode of the remote command transport:
/// connection establishment, authentication, request execution, and
/// response decoding. `tikdash-core` maps these into its user-facing
/// taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// No response within the configured window. The port is carried so
    /// operators can check whether the API service is enabled there.
    #[error(
        "connection timed out after {timeout_secs}s; check that the router's API service is enabled on port {port}"
    )]
    Timeout { port: u16, timeout_secs: u64 },

    /// The remote actively rejected the connection attempt.
    #[error("connection refused by {host}:{port}; make sure the API service is running on the router")]
    ConnectionRefused { host: String, port: u16 },

    /// Credentials rejected by the router.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The transport handle was used after `close()`.
    #[error("transport is closed")]
    Closed,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error not covered by a more specific variant.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Remote command surface ──────────────────────────────────────
    /// Structured error returned by the router for a command.
    #[error("router error: {message}")]
    Command { message: String, status: Option<u16> },

    /// Response body did not decode into the expected row shape.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures of the connection itself (as opposed
    /// to application-level command failures). On an established
    /// session these indicate the remote end has dropped.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused { .. } | Self::Closed => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Returns `true` if the router reported the target object missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Command { status: Some(404), .. })
    }
}
