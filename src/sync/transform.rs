//! Normalization of exported translation files.
//!
//! Exports store each file as an array of `{key, original, translation, ...}`
//! records. The working tree keeps the flat `key → translation` mapping, so
//! arrays are folded into a mapping in place. Anything that is not an array
//! is left byte-for-byte untouched, which makes the pass idempotent.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::sync::file::is_managed;
use crate::sync::observer::{SyncEvent, SyncObserver};
use crate::sync::types::{SyncResult, TransformStats};

/// One record of an exported array.
#[derive(Debug, Deserialize)]
pub struct ExportedEntry {
    pub key: String,
    #[serde(default)]
    pub translation: Option<Value>,
}

impl ExportedEntry {
    /// Translation text with literal `\n` sequences turned into newlines.
    ///
    /// A missing or null translation becomes the empty string.
    #[must_use]
    pub fn translation_text(&self) -> String {
        let text = match &self.translation {
            None | Some(Value::Null) => return String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        text.replace("\\n", "\n")
    }
}

/// What [`normalize_file`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    /// An array was folded into a mapping with this many keys.
    Converted { entries: usize },
    /// The file was valid JSON but not an array.
    Unchanged,
    /// Nothing but whitespace and invisible characters.
    Empty,
}

fn is_leading_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{001F}' | '\u{FEFF}' | '\u{200B}'..='\u{200D}' | '\u{2060}'
    )
}

/// Strip control characters, BOM and zero-width characters from the start.
#[must_use]
pub fn strip_leading_invisible(text: &str) -> &str {
    text.trim_start_matches(is_leading_invisible)
}

/// Fold records into a mapping. Later duplicates win.
#[must_use]
pub fn fold_entries(entries: &[ExportedEntry]) -> Map<String, Value> {
    let mut map = Map::new();
    for entry in entries {
        map.insert(entry.key.clone(), Value::String(entry.translation_text()));
    }
    map
}

/// Normalize one file in place.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, holds an
/// array whose records lack a string `key`, or cannot be rewritten.
pub fn normalize_file(path: &Path) -> SyncResult<Normalized> {
    let raw = fs::read_to_string(path)?;
    let text = strip_leading_invisible(&raw).trim();
    if text.is_empty() {
        return Ok(Normalized::Empty);
    }

    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Ok(Normalized::Unchanged);
    };

    let entries: Vec<ExportedEntry> = serde_json::from_value(Value::Array(items))?;
    let map = fold_entries(&entries);
    let count = map.len();
    fs::write(path, serde_json::to_string_pretty(&Value::Object(map))?)?;

    Ok(Normalized::Converted { entries: count })
}

/// Normalize every managed file under `dir`.
///
/// Per-file failures are reported to the observer and counted; the pass
/// carries on with the next file.
///
/// # Errors
///
/// Returns an error only if the directory tree cannot be walked.
pub fn normalize_tree(dir: &Path, observer: &dyn SyncObserver) -> SyncResult<TransformStats> {
    let mut stats = TransformStats::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_managed(&entry.file_name().to_string_lossy()) {
            continue;
        }

        match normalize_file(entry.path()) {
            Ok(Normalized::Converted { .. }) => {
                stats.seen += 1;
                stats.converted += 1;
            }
            Ok(Normalized::Unchanged) => stats.seen += 1,
            Ok(Normalized::Empty) => {}
            Err(e) => {
                stats.failed += 1;
                observer.on_event(&SyncEvent::TransformFailed {
                    path: entry.path(),
                    error: &e.to_string(),
                });
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::observer::NoopObserver;
    use tempfile::TempDir;

    #[test]
    fn test_strip_leading_invisible() {
        assert_eq!(strip_leading_invisible("\u{FEFF}\u{200B}\n[1]"), "[1]");
        assert_eq!(strip_leading_invisible("\u{2060}{}"), "{}");
        assert_eq!(strip_leading_invisible("[\u{FEFF}]"), "[\u{FEFF}]");
    }

    #[test]
    fn test_array_is_folded_into_mapping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(
            &path,
            "\u{FEFF}[{\"key\":\"k1\",\"original\":\"Hi\",\"translation\":\"line1\\\\nline2\"},\
             {\"key\":\"k2\",\"original\":\"Bye\",\"translation\":null},\
             {\"key\":\"k3\",\"original\":\"Ok\"}]",
        )
        .unwrap();

        assert_eq!(
            normalize_file(&path).unwrap(),
            Normalized::Converted { entries: 3 }
        );

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"k1\": \"line1\\nline2\",\n  \"k2\": \"\",\n  \"k3\": \"\"\n}"
        );
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["k1"], "line1\nline2");
    }

    #[test]
    fn test_mapping_is_left_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        let original = "{ \"k\" :   \"v\" }\n";
        fs::write(&path, original).unwrap();

        assert_eq!(normalize_file(&path).unwrap(), Normalized::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, r#"[{"key":"k","translation":"v"}]"#).unwrap();

        normalize_file(&path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert_eq!(normalize_file(&path).unwrap(), Normalized::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_empty_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, "\u{FEFF}  \n").unwrap();
        assert_eq!(normalize_file(&path).unwrap(), Normalized::Empty);
    }

    #[test]
    fn test_tree_counts_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("ui")).unwrap();
        fs::write(root.join("a.json"), r#"[{"key":"k","translation":"v"}]"#).unwrap();
        fs::write(root.join("b.json"), "{not json").unwrap();
        fs::write(root.join("ui/c.json"), r#"{"k":"v"}"#).unwrap();
        fs::write(root.join("ui/d.json"), "").unwrap();
        fs::write(root.join("notes.txt"), "[1,2]").unwrap();

        let stats = normalize_tree(root, &NoopObserver).unwrap();

        assert_eq!(
            stats,
            TransformStats {
                seen: 2,
                converted: 1,
                failed: 1,
            }
        );
        assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "[1,2]");
    }
}
