//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use syncdev_config::ConfigError;
use syncdev_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Input file '{path}' not found")]
    #[diagnostic(
        code(syncdev::input_not_found),
        help("Pass a path to an existing file, or `-` to read from stdin.")
    )]
    InputNotFound { path: String },

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(syncdev::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(syncdev::validation))]
    Validation { field: String, reason: String },

    // ── Replay ───────────────────────────────────────────────────────
    #[error("{count} event(s) could not be applied")]
    #[diagnostic(
        code(syncdev::events_rejected),
        help("Re-run with -v to see why each event was dropped.")
    )]
    EventsRejected { count: u64 },

    #[error("Backend event rejected: {0}")]
    #[diagnostic(code(syncdev::payload))]
    Payload(CoreError),

    #[error("Update sink closed before the replay finished")]
    #[diagnostic(code(syncdev::sink_closed))]
    SinkClosed,

    #[error("Background task failed: {0}")]
    #[diagnostic(code(syncdev::task))]
    Task(#[from] tokio::task::JoinError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(syncdev::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(syncdev::config),
        help("Check the config file, or run: syncdev config init --force")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => exit_code::USAGE,
            Self::InputNotFound { .. } => exit_code::NOT_FOUND,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::SinkClosed => Self::SinkClosed,
            other => Self::Payload(other),
        }
    }
}
