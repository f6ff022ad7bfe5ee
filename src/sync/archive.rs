//! Export archive extraction.
//!
//! ParaTranz export archives hold every file twice: once under a `utf8/`
//! folder and once in the raw encoding. Only the `utf8` copies are kept;
//! the marker segment and everything before it are stripped from the
//! destination path.
//!
//! Entries are visited through [`EntryStream`], which hands out one
//! [`ArchiveEntry`] at a time. An entry borrows the stream, so the next one
//! cannot be requested until the current one has been written or skipped.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::sync::types::{ExtractStats, SyncError, SyncResult};

/// Path segment marking UTF-8 encoded content.
pub const UTF8_MARKER: &str = "utf8";

/// Default bound for one extraction.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(120);

/// Kind of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of an archive, readable for its content.
pub struct ArchiveEntry<'a> {
    /// Entry path with `/` separators.
    pub path: String,
    pub kind: EntryKind,
    reader: Box<dyn Read + 'a>,
}

impl ArchiveEntry<'_> {
    /// Release the entry without reading it.
    ///
    /// Entries are located through the central directory, so the body of a
    /// skipped entry is never decompressed.
    pub fn skip(self) {}
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Forward-only iteration over the entries of an archive.
pub struct EntryStream<R: Read + Seek> {
    archive: ZipArchive<R>,
    next: usize,
}

impl<R: Read + Seek> EntryStream<R> {
    /// Open an archive for iteration.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive's directory cannot be read.
    pub fn new(reader: R) -> SyncResult<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            next: 0,
        })
    }

    /// Number of entries in the archive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Yield the next entry, or `None` once the archive is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry header cannot be read.
    pub fn next_entry(&mut self) -> SyncResult<Option<ArchiveEntry<'_>>> {
        if self.next >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;

        let reader = self.archive.by_index(index)?;
        let path = normalize_separators(reader.name());
        let kind = if reader.is_dir() || path.ends_with('/') {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Ok(Some(ArchiveEntry {
            path,
            kind,
            reader: Box::new(reader),
        }))
    }
}

/// Replace Windows separators with `/`.
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Destination-relative path of an entry, if it lies under the marker.
///
/// Matches a leading `utf8/` or any `/utf8/` segment, case-insensitively.
#[must_use]
pub fn strip_marker(path: &str) -> Option<&str> {
    let leading = format!("{UTF8_MARKER}/");
    let inner = format!("/{UTF8_MARKER}/");
    // ASCII lowercasing keeps byte offsets aligned with `path`.
    let lower = path.to_ascii_lowercase();

    let rest = if lower.starts_with(&leading) {
        &path[leading.len()..]
    } else {
        let idx = lower.find(&inner)?;
        &path[idx + inner.len()..]
    };

    if rest.trim_end_matches('/').is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Whether a relative path stays inside the output directory.
fn is_contained(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// Extract the `utf8` entries of `archive_path` into `output_dir`.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or an entry header is
/// unreadable. Failures writing individual entries are counted, not raised.
pub fn extract(archive_path: &Path, output_dir: &Path) -> SyncResult<ExtractStats> {
    let file = File::open(archive_path)?;
    let mut stream = EntryStream::new(BufReader::new(file))?;
    fs::create_dir_all(output_dir)?;

    let mut stats = ExtractStats::default();

    while let Some(mut entry) = stream.next_entry()? {
        let Some(rel) = strip_marker(&entry.path).map(|r| r.trim_end_matches('/').to_string())
        else {
            stats.skipped += 1;
            entry.skip();
            continue;
        };

        if !is_contained(&rel) {
            warn!(path = %entry.path, "Skipping archive entry outside the output directory");
            stats.skipped += 1;
            entry.skip();
            continue;
        }

        stats.entries_handled += 1;
        let dest = output_dir.join(&rel);

        match entry.kind {
            EntryKind::Directory => {
                if let Err(e) = fs::create_dir_all(&dest) {
                    warn!(path = %dest.display(), error = %e, "Failed to create directory");
                }
            }
            EntryKind::File => match write_entry(&mut entry, &dest) {
                Ok(bytes) => {
                    debug!(path = %rel, bytes, "Extracted");
                    stats.files_written += 1;
                }
                Err(e) => {
                    warn!(path = %dest.display(), error = %e, "Failed to extract entry");
                    stats.failed += 1;
                }
            },
        }
    }

    Ok(stats)
}

fn write_entry(entry: &mut ArchiveEntry<'_>, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(dest)?);
    let bytes = io::copy(entry, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}

/// Run [`extract`] on a blocking worker, bounded by `timeout`.
///
/// On timeout the worker is abandoned rather than cancelled; it releases its
/// file handles when it finishes.
///
/// # Errors
///
/// Returns [`SyncError::ExtractTimeout`] if the bound elapses, or the
/// extraction error.
pub async fn extract_with_timeout(
    archive_path: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
) -> SyncResult<ExtractStats> {
    run_bounded(timeout, move || extract(&archive_path, &output_dir)).await
}

/// Run blocking work on the blocking pool, giving up after `timeout`.
async fn run_bounded<T, F>(timeout: Duration, work: F) -> SyncResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SyncResult<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined?,
        Err(_) => Err(SyncError::ExtractTimeout { timeout }),
    }
}
