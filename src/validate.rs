//! JSON validation for the working tree.
//!
//! Walks one or more directories, parses every `.json` file and reports the
//! ones that fail. A leading UTF-8 BOM is tolerated since some editors add
//! one. Dependency and VCS directories are never entered.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

/// Directory names skipped while walking.
pub const EXCLUDED_DIRS: [&str; 3] = ["node_modules", ".git", "dist"];

/// A file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidFile {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub invalid: Vec<InvalidFile>,
}

impl CheckReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.invalid.is_empty()
    }
}

fn is_excluded(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
}

/// Collect `.json` files under `roots`, sorted and de-duplicated.
///
/// Missing or unreadable roots and entries are skipped.
#[must_use]
pub fn collect_json_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();

    for root in roots.iter().filter(|r| r.exists()) {
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_excluded(&entry.file_name().to_string_lossy())
        });

        for entry in walker.filter_map(Result::ok) {
            if entry.file_type().is_file() && is_json(entry.path()) {
                files.insert(entry.into_path());
            }
        }
    }

    files.into_iter().collect()
}

/// Parse one file as JSON.
///
/// # Errors
///
/// Returns the read or parse error message.
pub fn validate_json_file(path: &Path) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
    serde_json::from_str::<serde::de::IgnoredAny>(text)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Validate every `.json` file under `roots`.
#[must_use]
pub fn check_paths(roots: &[PathBuf]) -> CheckReport {
    let files = collect_json_files(roots);
    let invalid = files
        .iter()
        .filter_map(|path| {
            validate_json_file(path).err().map(|message| InvalidFile {
                path: path.clone(),
                message,
            })
        })
        .collect();

    CheckReport {
        checked: files.len(),
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bom_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, "\u{FEFF}{\"k\": \"v\"}").unwrap();
        assert!(validate_json_file(&path).is_ok());
    }

    #[test]
    fn test_invalid_file_reports_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, "{\"k\": }").unwrap();
        let message = validate_json_file(&path).unwrap_err();
        assert!(message.contains("line 1"));
    }

    #[test]
    fn test_collect_skips_excluded_and_dedups() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("project/zh-HANS")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("project/zh-HANS/a.json"), "{}").unwrap();
        fs::write(root.join("project/zh-HANS/B.JSON"), "{}").unwrap();
        fs::write(root.join("project/notes.txt"), "x").unwrap();
        fs::write(root.join("node_modules/pkg/package.json"), "{").unwrap();

        let files = collect_json_files(&[
            root.to_path_buf(),
            root.join("project"),
            root.join("missing"),
        ]);

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("node_modules")));
    }

    #[test]
    fn test_check_paths_report() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        fs::write(root.join("good.json"), "[1, 2]").unwrap();
        fs::write(root.join("bad.json"), "[1, 2").unwrap();

        let report = check_paths(&[root.clone()]);

        assert_eq!(report.checked, 2);
        assert!(!report.is_ok());
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].path, root.join("bad.json"));
    }
}
