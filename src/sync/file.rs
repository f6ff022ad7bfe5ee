//! File operations for sync.
//!
//! This module provides the filesystem side of a sync pass:
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - Locale tree listing with `/`-separated relative paths
//! - Staging directory reset and additive tree copies

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

use crate::sync::types::SyncResult;

/// Extension of the structured files ptsync manages.
pub const MANAGED_EXTENSION: &str = ".json";

/// A file under a locale root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute (or caller-rooted) path on disk.
    pub path: PathBuf,
    /// Path relative to the locale root, always `/`-separated.
    pub relative: String,
}

impl LocalFile {
    /// Read the current bytes of the file.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn modified_ms(&self) -> io::Result<f64> {
        let modified = fs::metadata(&self.path)?.modified()?;
        let since_epoch = modified
            .duration_since(UNIX_EPOCH)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(since_epoch.as_secs_f64() * 1000.0)
    }

    /// Base name of the file.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }
}

/// Whether a name carries the managed extension.
#[must_use]
pub fn is_managed(name: &str) -> bool {
    name.ends_with(MANAGED_EXTENSION)
}

/// Convert a relative path to its `/`-separated form.
#[must_use]
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// List every managed file under `root`, sorted by relative path.
///
/// A missing root is an error: callers reconcile deletions against this
/// listing and must never mistake "no directory" for "no files".
///
/// # Errors
///
/// Returns an error if the root cannot be read.
pub fn list_managed_files(root: &Path) -> SyncResult<Vec<LocalFile>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("locale directory not found: {}", root.display()),
        )
        .into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = to_slash_path(rel);
        if !is_managed(&relative) {
            continue;
        }
        files.push(LocalFile {
            path: entry.path().to_path_buf(),
            relative,
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary sibling (`<name>.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> SyncResult<()> {
    let mut temp_name = path
        .file_name()
        .map_or_else(|| OsString::from("state"), ToOwned::to_owned);
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove a directory tree if present and recreate it empty.
///
/// # Errors
///
/// Returns an error if the directory cannot be removed or created.
pub fn reset_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}

/// Copy every file under `src` into `dest`, returning the number of files copied.
///
/// Existing destination files are overwritten; destination files with no
/// counterpart in `src` are left alone.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked or a file cannot be copied.
pub fn copy_tree(src: &Path, dest: &Path) -> SyncResult<usize> {
    fs::create_dir_all(dest)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        atomic_write(&path, b"{\n  \"a\": 1\n}").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"a\": 1\n}");
        assert!(!temp_dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_list_managed_files_relative_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("ui/menu")).unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("ui/menu/main.json"), "{}").unwrap();
        fs::write(root.join("ui/readme.txt"), "x").unwrap();

        let files = list_managed_files(root).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(names, vec!["a.json", "ui/menu/main.json"]);
        assert_eq!(files[1].file_name(), "main.json");
    }

    #[test]
    fn test_list_managed_files_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_managed_files(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_reset_dir_removes_stale_content() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("staging");
        fs::create_dir_all(dir.join("old")).unwrap();
        fs::write(dir.join("old/stale.json"), "{}").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        // Missing directories are simply created
        let fresh = temp_dir.path().join("fresh");
        reset_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
    }

    #[test]
    fn test_copy_tree_is_additive() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.json"), "new").unwrap();
        fs::write(src.join("sub/b.json"), "b").unwrap();
        fs::write(dest.join("a.json"), "old").unwrap();
        fs::write(dest.join("keep.json"), "keep").unwrap();

        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("a.json")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("sub/b.json")).unwrap(), "b");
        assert_eq!(fs::read_to_string(dest.join("keep.json")).unwrap(), "keep");
    }

    #[test]
    fn test_is_managed() {
        assert!(is_managed("dir/a.json"));
        assert!(!is_managed("dir/a.txt"));
        assert!(!is_managed("a.json.bak"));
    }
}
