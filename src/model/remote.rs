//! Remote-side records returned by the ParaTranz API.
//!
//! Field names follow the service's camelCase JSON. Counters the service
//! omits default to zero so older or partial responses still decode.

use serde::{Deserialize, Serialize};

/// A file in the remote project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteFile {
    pub id: u64,
    /// Path-qualified name, e.g. `ui/menu.json`.
    pub name: String,
    /// Content hash computed by the service.
    pub hash: String,
    pub total: u64,
    pub translated: u64,
    pub disputed: u64,
    pub checked: u64,
    pub reviewed: u64,
    pub hidden: u64,
    pub locked: u64,
    pub words: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub modified_at: Option<String>,
}

impl RemoteFile {
    /// Directory part of the name with a trailing slash, or empty at the root.
    #[must_use]
    pub fn dir_prefix(name: &str) -> &str {
        name.rfind('/').map_or("", |idx| &name[..=idx])
    }

    /// Base file name without its directory.
    #[must_use]
    pub fn base_name(name: &str) -> &str {
        name.rsplit('/').next().unwrap_or(name)
    }
}

/// Remote export descriptor.
///
/// `created_at` is treated as an opaque freshness token: a different value
/// means a different build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artifact {
    pub id: u64,
    pub created_at: Option<String>,
}

impl Artifact {
    /// Whether this artifact is newer than a previously observed one.
    ///
    /// An artifact without a timestamp is never considered new.
    #[must_use]
    pub fn is_newer_than(&self, previous: Option<&Artifact>) -> bool {
        match (&self.created_at, previous.and_then(|p| p.created_at.as_ref())) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(before)) => current != before,
        }
    }
}

/// Export job returned when a rebuild is triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportJob {
    pub id: u64,
    /// 0 pending, 1 running, 2 success, -1 failed.
    pub status: i32,
    pub finished_at: Option<String>,
}

/// A file body ready to be sent as a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}
