// ── Core error types ──
//
// User-facing errors from tikdash-core. Consumers never see raw
// transport errors; the `From<tikdash_api::Error>` impl translates
// them for operations on an established session, and
// `CoreError::classify_connect` does the same for the connect
// handshake, where the same underlying failure reads differently
// (a refused TCP dial is `ConnectionRefused`; on a live session it
// means the remote dropped us, i.e. `Disconnected`).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error(
        "connection timed out after {timeout_secs}s; check that the router's API service is enabled on port {port}"
    )]
    Timeout { port: u16, timeout_secs: u64 },

    #[error("connection refused by {host}:{port}; make sure the API service is running on the router")]
    ConnectionRefused { host: String, port: u16 },

    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// An established session observed the remote end gone. The
    /// registry uses this classification to decide eviction.
    #[error("router connection lost")]
    Disconnected,

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("no connected router with session id {session_id}")]
    NotFound { session_id: String },

    // ── Protocol errors ──────────────────────────────────────────────
    /// A payload that should have decoded into known rows or records
    /// did not. Non-fatal: the offending packet or row is skipped.
    #[error("malformed protocol payload: {reason}")]
    ProtocolParse { reason: String },

    // ── Passthrough ──────────────────────────────────────────────────
    #[error("{message}")]
    Unknown { message: String },
}

impl CoreError {
    /// Classify a transport failure raised while establishing a new
    /// session. Distinct from the `From` impl: at connect time a
    /// timeout or refusal describes the dial attempt, not a dropped
    /// session.
    pub(crate) fn classify_connect(err: tikdash_api::Error) -> Self {
        use tikdash_api::Error as ApiError;

        match err {
            ApiError::Timeout { port, timeout_secs } => Self::Timeout { port, timeout_secs },
            ApiError::ConnectionRefused { host, port } => Self::ConnectionRefused { host, port },
            ApiError::Authentication { message } => Self::AuthenticationFailed { message },
            ApiError::Command { message, .. } => Self::Unknown { message },
            ApiError::Deserialization { message, .. } => Self::ProtocolParse { reason: message },
            other => Self::Unknown {
                message: other.to_string(),
            },
        }
    }
}

// ── Conversion for operations on an established session ─────────────

impl From<tikdash_api::Error> for CoreError {
    fn from(err: tikdash_api::Error) -> Self {
        use tikdash_api::Error as ApiError;

        if err.is_connection_lost() {
            return Self::Disconnected;
        }

        match err {
            ApiError::Authentication { message } => Self::AuthenticationFailed { message },
            ApiError::Command { message, .. } => Self::Unknown { message },
            ApiError::Deserialization { message, .. } => Self::ProtocolParse { reason: message },
            other => Self::Unknown {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_message_carries_the_port() {
        let err = CoreError::classify_connect(tikdash_api::Error::Timeout {
            port: 8728,
            timeout_secs: 10,
        });
        assert!(err.to_string().contains("8728"));
    }

    #[test]
    fn established_session_transport_loss_maps_to_disconnected() {
        let err = CoreError::from(tikdash_api::Error::ConnectionRefused {
            host: "192.168.88.1".into(),
            port: 8728,
        });
        assert!(matches!(err, CoreError::Disconnected));
    }

    #[test]
    fn command_failures_stay_distinguishable_from_disconnects() {
        let err = CoreError::from(tikdash_api::Error::Command {
            message: "no such item".into(),
            status: Some(404),
        });
        assert!(matches!(err, CoreError::Unknown { .. }));
    }
}
