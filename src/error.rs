//! Error types for the ptsync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (3=not_found, 4=validation, 5=remote, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use thiserror::Error;

use crate::api::ApiError;
use crate::model::ProjectId;
use crate::sync::SyncError;

/// Result type alias for ptsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Not Found (exit 3)
    NoProjects,
    ProjectNotConfigured,

    // Validation (exit 4)
    InvalidArgument,
    InvalidJson,

    // Remote (exit 5)
    RemoteUnavailable,
    RemoteRejected,
    ExportTimeout,

    // Sync (exit 6)
    SyncError,
    ArchiveError,
    ProjectsFailed,

    // Config (exit 7)
    ConfigError,
    MissingToken,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NoProjects => "NO_PROJECTS",
            Self::ProjectNotConfigured => "PROJECT_NOT_CONFIGURED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidJson => "INVALID_JSON",
            Self::RemoteUnavailable => "REMOTE_UNAVAILABLE",
            Self::RemoteRejected => "REMOTE_REJECTED",
            Self::ExportTimeout => "EXPORT_TIMEOUT",
            Self::SyncError => "SYNC_ERROR",
            Self::ArchiveError => "ARCHIVE_ERROR",
            Self::ProjectsFailed => "PROJECTS_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NoProjects | Self::ProjectNotConfigured => 3,
            Self::InvalidArgument | Self::InvalidJson => 4,
            Self::RemoteUnavailable | Self::RemoteRejected | Self::ExportTimeout => 5,
            Self::SyncError | Self::ArchiveError | Self::ProjectsFailed => 6,
            Self::ConfigError | Self::MissingToken => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether running the same command again may succeed.
    ///
    /// True for transport failures, server-side errors and export timeouts.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable | Self::ExportTimeout | Self::ProjectsFailed
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in ptsync CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API token configured")]
    MissingToken,

    #[error("No projects configured")]
    NoProjects,

    #[error("Project {id} is not configured")]
    ProjectNotConfigured { id: ProjectId },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{invalid} of {checked} JSON files are invalid")]
    InvalidJson { invalid: usize, checked: usize },

    #[error("Sync failed for project(s): {}", join_ids(.failed))]
    ProjectsFailed { failed: Vec<ProjectId> },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_ids(ids: &[ProjectId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

const fn api_code(err: &ApiError) -> ErrorCode {
    match err.status() {
        Some(status) if status < 500 => ErrorCode::RemoteRejected,
        _ => ErrorCode::RemoteUnavailable,
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::MissingToken => ErrorCode::MissingToken,
            Self::NoProjects => ErrorCode::NoProjects,
            Self::ProjectNotConfigured { .. } => ErrorCode::ProjectNotConfigured,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidJson { .. } => ErrorCode::InvalidJson,
            Self::ProjectsFailed { .. } => ErrorCode::ProjectsFailed,
            Self::Api(err) | Self::Sync(SyncError::Api(err)) => api_code(err),
            Self::Sync(SyncError::ExportTimeout { .. }) => ErrorCode::ExportTimeout,
            Self::Sync(SyncError::Archive(_) | SyncError::ExtractTimeout { .. }) => {
                ErrorCode::ArchiveError
            }
            Self::Sync(SyncError::Io(_)) | Self::Io(_) => ErrorCode::IoError,
            Self::Sync(SyncError::Json(_)) | Self::Json(_) => ErrorCode::JsonError,
            Self::Sync(SyncError::Worker(_)) => ErrorCode::SyncError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MissingToken => Some(
                "Set PARATRANZ_TOKEN or pass --token.\n  \
                 A \"token\" key in ptsync.json also works."
                    .to_string(),
            ),

            Self::NoProjects => Some(
                "Add a \"projects\" list to ptsync.json, e.g.\n  \
                 \"projects\": [{ \"id\": 9588, \"locale\": \"zh-HANS\" }]"
                    .to_string(),
            ),

            Self::ProjectNotConfigured { id } => Some(format!(
                "Project {id} is not in ptsync.json. Use `ptsync status` to list configured projects."
            )),

            Self::InvalidJson { .. } => {
                Some("Fix the files reported above and run `ptsync check` again.".to_string())
            }

            Self::ProjectsFailed { .. } => Some(
                "Each failure is logged above. Projects not listed were synced.".to_string(),
            ),

            Self::Api(err) | Self::Sync(SyncError::Api(err)) => match err.status() {
                Some(401 | 403) => {
                    Some("The service rejected the token. Check PARATRANZ_TOKEN.".to_string())
                }
                Some(404) => Some("Check the project id and that the token can access it.".to_string()),
                Some(429) => Some("Rate limited. Wait a moment and retry.".to_string()),
                _ => None,
            },

            Self::Sync(SyncError::ExportTimeout { .. }) => Some(
                "The export may still be building. Retry later or raise exportTimeoutSecs in ptsync.json."
                    .to_string(),
            ),

            Self::Sync(SyncError::ExtractTimeout { .. }) => {
                Some("Raise extractTimeoutSecs in ptsync.json for large projects.".to_string())
            }

            Self::Config(_)
            | Self::InvalidArgument(_)
            | Self::Sync(_)
            | Self::Io(_)
            | Self::Json(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
