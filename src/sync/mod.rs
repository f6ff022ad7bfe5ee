//! Translation sync engine.
//!
//! This module moves translation files between a local working tree and a
//! remote ParaTranz project:
//!
//! - **Export**: trigger/poll/download an artifact, extract and normalize it
//! - **Push**: reconcile local source and translation files with the remote
//! - **State**: per-file fingerprints and last-seen artifact timestamps
//! - **Status**: offline view of what the next push would upload
//!
//! # Architecture
//!
//! The engine talks to the service only through [`ProjectApi`](crate::api::ProjectApi)
//! and reports progress through [`SyncObserver`]. Everything it decides is
//! returned as stats structs, so callers choose how to present results.
//!
//! # Example
//!
//! ```ignore
//! use ptsync::sync::{Exporter, Pusher, StateStore, TracingObserver};
//!
//! let observer = TracingObserver;
//! let mut state = store.load();
//!
//! let pusher = Pusher::new(&client, &observer);
//! pusher.push_source_originals(project, &paths.locale_dir("en-US")).await?;
//! pusher.push_translations(project, &paths.locale_dir("zh-HANS"), &mut state, false).await?;
//!
//! let exporter = Exporter::new(&client, &paths, &observer);
//! let outcome = exporter.download_latest(project, true, Some("zh-HANS")).await?;
//! store.save(&state)?;
//! ```

mod archive;
mod export;
mod file;
mod hash;
mod observer;
mod push;
mod state;
mod status;
mod transform;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{
    ArchiveEntry, DEFAULT_EXTRACT_TIMEOUT, EntryKind, EntryStream, UTF8_MARKER, extract,
    extract_with_timeout, strip_marker,
};
pub use export::{ExportOptions, Exporter};
pub use file::{
    LocalFile, MANAGED_EXTENSION, atomic_write, copy_tree, is_managed, list_managed_files,
    reset_dir,
};
pub use hash::{content_hash, matches_remote};
pub use observer::{NoopObserver, SyncEvent, SyncObserver, TracingObserver};
pub use push::Pusher;
pub use state::{FileProbe, Fingerprint, StateStore, SyncState};
pub use status::{ProjectStatus, print_status, project_status};
pub use transform::{Normalized, normalize_file, normalize_tree, strip_leading_invisible};
pub use types::{
    ExportOutcome, ExtractStats, PullOutcome, SourcePushStats, SyncError, SyncResult,
    TransformStats, TranslationPushStats,
};
