//! Error types and exit codes for lister
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (network, extraction, internal)
//! - 2: Usage error (bad flags/args, invalid values)
//! - 3: Data/config error (missing preset, missing config, missing session)

mod macros;

use std::path::PathBuf;

use thiserror::Error;

/// Exit codes used by the `lister` binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/config error - unknown preset, unreadable config (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Failures reported by an [`HttpPort`](crate::http::HttpPort).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request was cancelled through its signal. Never surfaced as a session error.
    #[error("request aborted")]
    Aborted,

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, HttpError::Aborted)
    }
}

/// Errors that can occur while fetching lists or driving sessions
#[derive(Error, Debug)]
pub enum ListerError {
    #[error("{stage}: expected an array (selector: {selector}), got {preview}")]
    ExtractNotArray {
        stage: String,
        selector: String,
        preview: String,
    },

    #[error("no HTTP client configured")]
    HttpClientMissing,

    #[error("fetch failed: {0}")]
    FetchFailed(#[from] HttpError),

    #[error("access denied")]
    AccessDenied,

    #[error("preset not found: {kind}")]
    PresetNotFound { kind: String },

    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    #[error("config not found: {path:?}")]
    ConfigNotFound { path: PathBuf },

    #[error("usage error: {0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl ListerError {
    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        ListerError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an unknown preset kind
    pub fn preset_not_found(kind: impl Into<String>) -> Self {
        ListerError::PresetNotFound { kind: kind.into() }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ListerError::UsageError(_) | ListerError::InvalidValue { .. } => ExitCode::Usage,

            ListerError::PresetNotFound { .. }
            | ListerError::SessionNotFound { .. }
            | ListerError::ConfigNotFound { .. }
            | ListerError::Toml(_) => ExitCode::Data,

            ListerError::ExtractNotArray { .. }
            | ListerError::HttpClientMissing
            | ListerError::FetchFailed(_)
            | ListerError::AccessDenied
            | ListerError::Io(_)
            | ListerError::Json(_)
            | ListerError::Other(_) => ExitCode::Failure,
        }
    }

    /// Stable machine-readable code, also used as a session `error_code`
    pub fn code(&self) -> &'static str {
        match self {
            ListerError::ExtractNotArray { .. } => "extract_not_array",
            ListerError::HttpClientMissing => "http_client_missing",
            ListerError::FetchFailed(_) => "fetch_failed",
            ListerError::AccessDenied => "access_denied",
            ListerError::PresetNotFound { .. } => "preset_not_found",
            ListerError::SessionNotFound { .. } => "session_not_found",
            ListerError::ConfigNotFound { .. } => "config_not_found",
            ListerError::UsageError(_) => "usage_error",
            ListerError::InvalidValue { .. } => "invalid_value",
            ListerError::Io(_) => "io_error",
            ListerError::Json(_) => "json_error",
            ListerError::Toml(_) => "toml_error",
            ListerError::Other(_) => "other",
        }
    }

    /// True when the error only reports that a request was cancelled
    pub fn is_aborted(&self) -> bool {
        matches!(self, ListerError::FetchFailed(err) if err.is_aborted())
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.code(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for lister operations
pub type Result<T> = std::result::Result<T, ListerError>;
