//! Configuration management.
//!
//! This module discovers and loads `ptsync.json` and resolves it, together
//! with command-line flags and environment variables, into a [`Config`].
//!
//! # Lookup
//!
//! The first file found is used:
//! 1. `--config <path>` (or `$PTSYNC_CONFIG`, wired through clap)
//! 2. `./ptsync.json`
//! 3. `~/.ptsync/config.json`
//!
//! Running without any config file is valid; commands that need a token or
//! projects fail with a hint when those are missing.
//!
//! # Priority
//!
//! CLI flag > environment > file > default.

mod paths;

pub use paths::WorkPaths;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DEFAULT_API_BASE;
use crate::error::{Error, Result};
use crate::model::{Project, ProjectId};
use crate::sync::ExportOptions;

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ptsync.json";
/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PTSYNC_CONFIG";
/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "PARATRANZ_TOKEN";

pub const DEFAULT_STATE_FILE: &str = "paratransz-sync-data.json";
pub const DEFAULT_BASE_DIR: &str = "project";
pub const DEFAULT_SOURCE_LOCALE: &str = "en-US";

/// A project entry in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub id: ProjectId,
    /// Target locale directory name.
    pub locale: String,
}

/// On-disk shape of `ptsync.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub source_locale: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub tmp_dir: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub export_timeout_secs: Option<u64>,
    pub extract_timeout_secs: Option<u64>,
    pub projects: Vec<ProjectEntry>,
}

impl ConfigFile {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config JSON.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
    }
}

/// Values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    /// Token from `--token` or `$PARATRANZ_TOKEN`.
    pub token: Option<String>,
    pub base_dir: Option<PathBuf>,
    /// Restrict the run to these projects.
    pub projects: Vec<ProjectId>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from, if any.
    pub loaded_from: Option<PathBuf>,
    pub token: Option<String>,
    pub api_base: String,
    pub source_locale: String,
    pub paths: WorkPaths,
    pub state_file: PathBuf,
    pub export: ExportOptions,
    /// Target projects selected for this run, in config order.
    pub projects: Vec<Project>,
}

impl Config {
    /// Discover, read and resolve the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or invalid, or a
    /// `--project` filter names a project that is not configured.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let path = discover_config_path(overrides.config.as_deref());
        let file = match &path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config");
                ConfigFile::read(path)?
            }
            None => {
                debug!("No config file found, using defaults");
                ConfigFile::default()
            }
        };
        Self::resolve(file, overrides, path)
    }

    /// Merge a parsed file with command-line values.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid values or an unknown `--project` id.
    pub fn resolve(
        file: ConfigFile,
        overrides: &Overrides,
        loaded_from: Option<PathBuf>,
    ) -> Result<Self> {
        let defaults = ExportOptions::default();
        let export = ExportOptions {
            poll_interval: seconds("pollIntervalSecs", file.poll_interval_secs)?
                .unwrap_or(defaults.poll_interval),
            export_timeout: seconds("exportTimeoutSecs", file.export_timeout_secs)?
                .unwrap_or(defaults.export_timeout),
            extract_timeout: seconds("extractTimeoutSecs", file.extract_timeout_secs)?
                .unwrap_or(defaults.extract_timeout),
        };

        let mut seen = HashSet::new();
        for entry in &file.projects {
            if !seen.insert(entry.id) {
                return Err(Error::Config(format!("project {} is listed twice", entry.id)));
            }
            if entry.locale.trim().is_empty() {
                return Err(Error::Config(format!("project {} has an empty locale", entry.id)));
            }
        }

        for id in &overrides.projects {
            if !seen.contains(id) {
                return Err(Error::ProjectNotConfigured { id: *id });
            }
        }

        let projects = file
            .projects
            .iter()
            .filter(|p| overrides.projects.is_empty() || overrides.projects.contains(&p.id))
            .map(|p| Project::new(p.id, p.locale.clone()))
            .collect();

        let base_dir = overrides
            .base_dir
            .clone()
            .or(file.base_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));
        let tmp_dir = file.tmp_dir.unwrap_or_else(std::env::temp_dir);

        let token = overrides
            .token
            .clone()
            .or(file.token)
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            loaded_from,
            token,
            api_base: file.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            source_locale: file
                .source_locale
                .unwrap_or_else(|| DEFAULT_SOURCE_LOCALE.to_string()),
            paths: WorkPaths::new(tmp_dir, base_dir),
            state_file: file
                .state_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            export,
            projects,
        })
    }

    /// The API token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingToken`] if none was configured.
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::MissingToken)
    }

    /// The selected projects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoProjects`] if none are configured.
    pub fn require_projects(&self) -> Result<&[Project]> {
        if self.projects.is_empty() {
            return Err(Error::NoProjects);
        }
        Ok(&self.projects)
    }

    /// Directory holding the shared source files.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.paths.locale_dir(&self.source_locale)
    }
}

fn seconds(key: &str, value: Option<u64>) -> Result<Option<Duration>> {
    match value {
        Some(0) => Err(Error::Config(format!("{key} must be at least 1"))),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

/// Find the config file to use.
///
/// An explicit path is returned as-is so a missing file is reported rather
/// than silently replaced by defaults.
#[must_use]
pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    global_config_path().filter(|p| p.is_file())
}

/// `~/.ptsync/config.json`
#[must_use]
pub fn global_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ptsync").join("config.json"))
}
