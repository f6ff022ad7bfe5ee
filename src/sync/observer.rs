//! Progress reporting for sync passes.
//!
//! The engine reports what it does through [`SyncObserver`] instead of
//! printing. The CLI installs [`TracingObserver`]; tests use
//! [`NoopObserver`] and assert on returned statistics.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::model::ProjectId;
use crate::sync::types::{ExtractStats, TransformStats};

/// A progress event emitted during a sync pass.
#[derive(Debug)]
pub enum SyncEvent<'a> {
    ExportTriggered { project: ProjectId },
    ExportPollFailed { project: ProjectId, error: &'a str },
    ExportReady { project: ProjectId, created_at: &'a str },
    ArtifactUnchanged { project: ProjectId, created_at: &'a str },
    ArchiveDownloaded { project: ProjectId, path: &'a Path, bytes: u64 },
    Extracted { project: ProjectId, stats: &'a ExtractStats },
    Transformed { project: ProjectId, stats: &'a TransformStats },
    TransformFailed { path: &'a Path, error: &'a str },
    TreeCopied { project: ProjectId, from: &'a Path, to: &'a Path, files: usize },
    SourceCreated { project: ProjectId, name: &'a str },
    SourceUpdated { project: ProjectId, name: &'a str },
    SourceDeleted { project: ProjectId, name: &'a str },
    TranslationUploaded { project: ProjectId, name: &'a str },
    MissingRemote { project: ProjectId, name: &'a str },
    FileFailed { project: ProjectId, name: &'a str, error: &'a str },
    StatePruned { project: ProjectId, name: &'a str },
}

/// Receives progress events.
pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: &SyncEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_event(&self, _event: &SyncEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent<'_>) {
        match *event {
            SyncEvent::ExportTriggered { project } => {
                info!(%project, "Triggering export");
            }
            SyncEvent::ExportPollFailed { project, error } => {
                debug!(%project, error, "Artifact poll failed, retrying");
            }
            SyncEvent::ExportReady { project, created_at } => {
                info!(%project, created_at, "Export ready");
            }
            SyncEvent::ArtifactUnchanged { project, created_at } => {
                info!(%project, created_at, "Artifact unchanged, skipping download");
            }
            SyncEvent::ArchiveDownloaded { project, path, bytes } => {
                info!(%project, path = %path.display(), bytes, "Archive saved");
            }
            SyncEvent::Extracted { project, stats } => {
                info!(
                    %project,
                    entries_handled = stats.entries_handled,
                    files_written = stats.files_written,
                    failed = stats.failed,
                    "Unzip done"
                );
            }
            SyncEvent::Transformed { project, stats } => {
                info!(
                    %project,
                    seen = stats.seen,
                    converted = stats.converted,
                    failed = stats.failed,
                    "Processing done"
                );
            }
            SyncEvent::TransformFailed { path, error } => {
                warn!(path = %path.display(), error, "Failed processing file");
            }
            SyncEvent::TreeCopied { project, from, to, files } => {
                info!(
                    %project,
                    from = %from.display(),
                    to = %to.display(),
                    files,
                    "Copied processed files"
                );
            }
            SyncEvent::SourceCreated { project, name } => {
                info!(%project, name, "Created source");
            }
            SyncEvent::SourceUpdated { project, name } => {
                info!(%project, name, "Updated source");
            }
            SyncEvent::SourceDeleted { project, name } => {
                info!(%project, name, "Deleted remote source (not in local)");
            }
            SyncEvent::TranslationUploaded { project, name } => {
                info!(%project, name, "Uploaded translation");
            }
            SyncEvent::MissingRemote { project, name } => {
                warn!(
                    %project,
                    name,
                    "Translation file not found remotely, skipping. Upload source first."
                );
            }
            SyncEvent::FileFailed { project, name, error } => {
                warn!(%project, name, error, "File sync failed");
            }
            SyncEvent::StatePruned { project, name } => {
                debug!(%project, name, "Dropped sync state for removed file");
            }
        }
    }
}
