//! Remote project API trait.
//!
//! Defines the contract the sync engine relies on. Uses async methods so
//! the HTTP client and test fakes share one interface.

use std::future::Future;
use std::path::Path;

use super::error::ApiResult;
use crate::model::{Artifact, ExportJob, FileUpload, ProjectId, RemoteFile};

/// Operations the sync engine needs from the remote project service.
pub trait ProjectApi: Send + Sync {
    /// Fetch the descriptor of the current export artifact.
    fn get_artifact(&self, project: ProjectId) -> impl Future<Output = ApiResult<Artifact>> + Send;

    /// Ask the service to rebuild the export artifact.
    fn trigger_export(&self, project: ProjectId) -> impl Future<Output = ApiResult<ExportJob>> + Send;

    /// Download the current artifact archive to `dest`, returning the byte count.
    fn download_artifact(
        &self,
        project: ProjectId,
        dest: &Path,
    ) -> impl Future<Output = ApiResult<u64>> + Send;

    /// List every file in the project.
    fn list_files(&self, project: ProjectId) -> impl Future<Output = ApiResult<Vec<RemoteFile>>> + Send;

    /// Create a file. `dir` is empty or ends in `/`.
    fn create_file(
        &self,
        project: ProjectId,
        dir: &str,
        upload: FileUpload,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Replace the source content of an existing file.
    fn update_file(
        &self,
        project: ProjectId,
        file_id: u64,
        upload: FileUpload,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Replace the translations of an existing file.
    fn update_translation(
        &self,
        project: ProjectId,
        file_id: u64,
        upload: FileUpload,
        force: bool,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Delete a file.
    fn delete_file(&self, project: ProjectId, file_id: u64) -> impl Future<Output = ApiResult<()>> + Send;
}
