//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("{0}")]
    #[diagnostic(
        code(tikdash::connect_failed),
        help(
            "Check the router address and port, and that the API service\n\
             is enabled on the router (IP > Services)."
        )
    )]
    Connect(String),

    #[error("{0}")]
    #[diagnostic(code(tikdash::operation_failed))]
    Operation(String),

    #[error("failed to render output: {0}")]
    #[diagnostic(code(tikdash::output))]
    Render(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connect(_) => exit_code::CONNECTION,
            Self::Operation(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}
