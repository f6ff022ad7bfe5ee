//! Working directories used by a sync run.

use std::path::PathBuf;

use crate::model::ProjectId;

/// Resolved temp and working-tree roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    /// Where archives are downloaded and staged.
    pub tmp_dir: PathBuf,
    /// Root of the local working tree; one subdirectory per locale.
    pub base_dir: PathBuf,
}

impl WorkPaths {
    pub fn new(tmp_dir: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            base_dir: base_dir.into(),
        }
    }

    /// `<tmp>/project_<id>_artifact.zip`
    #[must_use]
    pub fn archive_path(&self, project: ProjectId) -> PathBuf {
        self.tmp_dir.join(format!("project_{project}_artifact.zip"))
    }

    /// `<tmp>/project_<id>_artifact`
    #[must_use]
    pub fn staging_dir(&self, project: ProjectId) -> PathBuf {
        self.tmp_dir.join(format!("project_{project}_artifact"))
    }

    /// `<base>/<locale>`
    #[must_use]
    pub fn locale_dir(&self, locale: &str) -> PathBuf {
        self.base_dir.join(locale)
    }
}
