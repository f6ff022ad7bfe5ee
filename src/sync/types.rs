//! Sync errors and per-operation statistics.

use std::time::Duration;

use serde::Serialize;

use crate::api::ApiError;
use crate::model::{Artifact, ProjectId};

/// Statistics for one archive extraction.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Entries under the `utf8` marker (files and directories).
    pub entries_handled: usize,
    /// Files fully written to the output directory.
    pub files_written: usize,
    /// Entries outside the marker, drained without being written.
    pub skipped: usize,
    /// Entries under the marker that could not be written.
    pub failed: usize,
}

/// Statistics for one transform pass over a directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// JSON files parsed successfully.
    pub seen: usize,
    /// Files rewritten from record arrays into mappings.
    pub converted: usize,
    /// Files that could not be read or parsed.
    pub failed: usize,
}

/// Result of an export download.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub project: ProjectId,
    /// Directory holding the extracted, normalized files.
    pub staging_dir: std::path::PathBuf,
    pub artifact: Artifact,
    pub archive_bytes: u64,
    pub extract: ExtractStats,
    pub transform: TransformStats,
    /// Files copied into the working tree (0 without a target locale).
    pub copied: usize,
}

/// Outcome of a pull that may be skipped when nothing changed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PullOutcome {
    /// The remote artifact matches the last one seen; nothing was downloaded.
    Unchanged { artifact: Artifact },
    /// A fresh export was downloaded and applied.
    Downloaded(ExportOutcome),
}

impl PullOutcome {
    /// The artifact the pull ended up observing.
    #[must_use]
    pub fn artifact(&self) -> &Artifact {
        match self {
            Self::Unchanged { artifact } => artifact,
            Self::Downloaded(outcome) => &outcome.artifact,
        }
    }
}

/// Statistics for a source push.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePushStats {
    pub created: usize,
    pub updated: usize,
    /// Files whose remote hash already matched.
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl SourcePushStats {
    /// Number of remote mutations issued successfully.
    #[must_use]
    pub fn changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Statistics for a translation push.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationPushStats {
    /// Local translation files found.
    pub total: usize,
    pub uploaded: usize,
    /// Files skipped because their fingerprint still matched.
    pub unchanged: usize,
    /// Files skipped because no remote file has that name.
    pub missing_remote: usize,
    pub failed: usize,
    /// State entries dropped because the local file is gone.
    pub pruned: usize,
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No new artifact appeared after triggering an export.
    #[error("Export not available within {}s for project {project}", .timeout.as_secs())]
    ExportTimeout { project: ProjectId, timeout: Duration },

    /// Extraction did not finish in time.
    #[error("Unzip timeout after {}s", .timeout.as_secs())]
    ExtractTimeout { timeout: Duration },

    /// The archive could not be opened or read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A background worker panicked or was cancelled.
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<walkdir::Error> for SyncError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.into())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
