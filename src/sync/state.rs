//! Persisted sync state.
//!
//! One JSON document records, per project, the last artifact timestamp seen
//! and a fingerprint for every translation file uploaded so far:
//!
//! ```json
//! {
//!   "artifact": { "9588": "2024-05-01T10:00:00.000Z" },
//!   "localPush": { "9588": { "ui/menu.json": "3f2a…" } }
//! }
//! ```
//!
//! Fingerprints written by older versions are numeric modification times.
//! Both shapes are read; only uploads write the hash form.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::model::ProjectId;
use crate::sync::file::{LocalFile, atomic_write};
use crate::sync::hash::content_hash;
use crate::sync::types::SyncResult;

/// Change-detection token for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fingerprint {
    /// SHA256 hex digest of the file bytes at upload time.
    Hash(String),
    /// Legacy modification time in milliseconds.
    LegacyMtime(Number),
}

impl Fingerprint {
    /// Whether the probed file still matches this fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or stat'ed.
    pub fn is_unchanged(&self, probe: &mut FileProbe<'_>) -> io::Result<bool> {
        match self {
            Self::Hash(stored) => Ok(probe.hash()? == stored.as_str()),
            Self::LegacyMtime(stored) => {
                let stored = stored.as_f64().unwrap_or(0.0);
                Ok(probe.modified_ms()? <= stored)
            }
        }
    }
}

/// Lazily reads a local file so each fingerprint variant only pays for what
/// it inspects.
pub struct FileProbe<'a> {
    file: &'a LocalFile,
    content: Option<Vec<u8>>,
    hash: Option<String>,
}

impl<'a> FileProbe<'a> {
    #[must_use]
    pub fn new(file: &'a LocalFile) -> Self {
        Self {
            file,
            content: None,
            hash: None,
        }
    }

    fn load(&mut self) -> io::Result<&[u8]> {
        if self.content.is_none() {
            self.content = Some(self.file.read()?);
        }
        Ok(self.content.as_deref().unwrap_or_default())
    }

    /// Content hash of the file.
    pub fn hash(&mut self) -> io::Result<&str> {
        if self.hash.is_none() {
            let hash = content_hash(self.load()?);
            self.hash = Some(hash);
        }
        Ok(self.hash.as_deref().unwrap_or_default())
    }

    /// Modification time of the file in milliseconds.
    pub fn modified_ms(&self) -> io::Result<f64> {
        self.file.modified_ms()
    }

    /// Consume the probe, returning the file bytes and their hash.
    pub fn into_content(mut self) -> io::Result<(Vec<u8>, String)> {
        let hash = self.hash()?.to_string();
        let content = self.content.take().unwrap_or_default();
        Ok((content, hash))
    }
}

/// In-memory sync state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Project id → `createdAt` of the last artifact pulled.
    #[serde(default)]
    pub artifact: BTreeMap<String, String>,
    /// Project id → relative path → fingerprint at last upload.
    #[serde(default)]
    pub local_push: BTreeMap<String, BTreeMap<String, Fingerprint>>,
}

impl SyncState {
    /// Parse a state document.
    ///
    /// Documents without `artifact`/`localPush` keys are the legacy flat
    /// `projectId → createdAt` map and load as the artifact map.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or has the wrong shape.
    pub fn from_json(text: &str) -> SyncResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(map) if map.contains_key("artifact") || map.contains_key("localPush") => {
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            Value::Object(map) => {
                let artifact = map
                    .into_iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                    .collect();
                Ok(Self {
                    artifact,
                    local_push: BTreeMap::new(),
                })
            }
            _ => Ok(Self::default()),
        }
    }

    /// Serialize to the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> SyncResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Last artifact timestamp recorded for a project.
    #[must_use]
    pub fn last_artifact(&self, project: ProjectId) -> Option<&str> {
        self.artifact.get(&project.to_string()).map(String::as_str)
    }

    /// Record the artifact timestamp observed for a project.
    pub fn record_artifact(&mut self, project: ProjectId, created_at: &str) {
        self.artifact
            .insert(project.to_string(), created_at.to_string());
    }

    /// Fingerprints recorded for a project, if any.
    #[must_use]
    pub fn fingerprints(&self, project: ProjectId) -> Option<&BTreeMap<String, Fingerprint>> {
        self.local_push.get(&project.to_string())
    }

    /// Mutable fingerprints for a project, created on first use.
    pub fn fingerprints_mut(&mut self, project: ProjectId) -> &mut BTreeMap<String, Fingerprint> {
        self.local_push.entry(project.to_string()).or_default()
    }
}

/// Location of the persisted state document.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, falling back to an empty state.
    ///
    /// A missing, unreadable or malformed file means "no prior state".
    #[must_use]
    pub fn load(&self) -> SyncState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No sync state yet");
                return SyncState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Sync state unreadable, starting fresh");
                return SyncState::default();
            }
        };

        match SyncState::from_json(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Sync state malformed, starting fresh");
                SyncState::default()
            }
        }
    }

    /// Persist the state if it differs from what is on disk.
    ///
    /// Returns `true` if the file was written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, state: &SyncState) -> SyncResult<bool> {
        let next = state.to_json_pretty()?;
        if let Ok(previous) = fs::read_to_string(&self.path) {
            if previous == next {
                return Ok(false);
            }
        }
        atomic_write(&self.path, next.as_bytes())?;
        Ok(true)
    }
}
