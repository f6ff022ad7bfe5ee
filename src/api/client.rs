//! ParaTranz HTTP client.
//!
//! Thin binding of the project file and artifact endpoints. Every request
//! carries the bearer credential; any non-success status becomes
//! [`ApiError::Status`] with the response body attached.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::provider::ProjectApi;
use crate::model::{Artifact, ExportJob, FileUpload, ProjectId, RemoteFile};

/// Default API root.
pub const DEFAULT_API_BASE: &str = "https://paratranz.cn/api";

/// HTTP implementation of [`ProjectApi`].
pub struct ParaTranzClient {
    client: Client,
    base_url: String,
    authorization: String,
}

impl ParaTranzClient {
    /// Create a client for `base_url` authenticating with `token`.
    ///
    /// The token may be given bare or already prefixed with `Bearer `.
    pub fn new(base_url: impl Into<String>, token: &str) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            authorization: authorization_header(token),
        }
    }

    /// Get the base URL being used.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
    }

    /// Send a request and fail on any non-success status.
    async fn send(
        request: RequestBuilder,
        operation: &'static str,
        target: &str,
    ) -> ApiResult<Response> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            operation,
            target: target.to_string(),
            source,
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            operation,
            target: target.to_string(),
            status,
            body,
        })
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        operation: &'static str,
        target: &str,
    ) -> ApiResult<T> {
        let response = Self::send(request, operation, target).await?;
        response.json().await.map_err(|e| ApiError::Decode {
            operation,
            target: target.to_string(),
            message: e.to_string(),
        })
    }

    fn file_form(
        upload: FileUpload,
        operation: &'static str,
        target: &str,
    ) -> ApiResult<Form> {
        let part = Part::bytes(upload.content)
            .file_name(upload.file_name)
            .mime_str("application/json")
            .map_err(|source| ApiError::Network {
                operation,
                target: target.to_string(),
                source,
            })?;
        Ok(Form::new().part("file", part))
    }
}

/// Build the `Authorization` header value for a token.
fn authorization_header(token: &str) -> String {
    let token = token.trim();
    if token
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "))
    {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

fn project_target(project: ProjectId) -> String {
    format!("project {project}")
}

fn file_target(project: ProjectId, file_id: u64) -> String {
    format!("project {project} file {file_id}")
}

impl ProjectApi for ParaTranzClient {
    async fn get_artifact(&self, project: ProjectId) -> ApiResult<Artifact> {
        let target = project_target(project);
        Self::send_json(
            self.get(&format!("/projects/{project}/artifacts")),
            "getArtifact",
            &target,
        )
        .await
    }

    async fn trigger_export(&self, project: ProjectId) -> ApiResult<ExportJob> {
        let target = project_target(project);
        Self::send_json(
            self.post(&format!("/projects/{project}/artifacts")),
            "triggerExport",
            &target,
        )
        .await
    }

    async fn download_artifact(&self, project: ProjectId, dest: &Path) -> ApiResult<u64> {
        const OPERATION: &str = "downloadArtifact";
        let target = project_target(project);
        let mut response = Self::send(
            self.get(&format!("/projects/{project}/artifacts/download")),
            OPERATION,
            &target,
        )
        .await?;

        debug!(
            project = %project,
            url = %response.url(),
            length = ?response.content_length(),
            "Artifact download started"
        );

        let io_err = |source| ApiError::Io {
            operation: OPERATION,
            target: target.clone(),
            source,
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|source| ApiError::Network {
            operation: OPERATION,
            target: target.clone(),
            source,
        })? {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;

        Ok(written)
    }

    async fn list_files(&self, project: ProjectId) -> ApiResult<Vec<RemoteFile>> {
        let target = project_target(project);
        Self::send_json(
            self.get(&format!("/projects/{project}/files")),
            "listFiles",
            &target,
        )
        .await
    }

    async fn create_file(&self, project: ProjectId, dir: &str, upload: FileUpload) -> ApiResult<()> {
        const OPERATION: &str = "createFile";
        let target = format!("{} {}{}", project_target(project), dir, upload.file_name);
        let mut form = Self::file_form(upload, OPERATION, &target)?;
        if !dir.is_empty() {
            let dir = if dir.ends_with('/') {
                dir.to_string()
            } else {
                format!("{dir}/")
            };
            form = form.text("path", dir);
        }

        Self::send(
            self.post(&format!("/projects/{project}/files")).multipart(form),
            OPERATION,
            &target,
        )
        .await?;
        Ok(())
    }

    async fn update_file(&self, project: ProjectId, file_id: u64, upload: FileUpload) -> ApiResult<()> {
        const OPERATION: &str = "updateFile";
        let target = file_target(project, file_id);
        let form = Self::file_form(upload, OPERATION, &target)?;

        Self::send(
            self.post(&format!("/projects/{project}/files/{file_id}"))
                .multipart(form),
            OPERATION,
            &target,
        )
        .await?;
        Ok(())
    }

    async fn update_translation(
        &self,
        project: ProjectId,
        file_id: u64,
        upload: FileUpload,
        force: bool,
    ) -> ApiResult<()> {
        const OPERATION: &str = "updateFileTranslation";
        let target = file_target(project, file_id);
        let mut form = Self::file_form(upload, OPERATION, &target)?;
        if force {
            form = form.text("force", "true");
        }

        Self::send(
            self.post(&format!("/projects/{project}/files/{file_id}/translation"))
                .multipart(form),
            OPERATION,
            &target,
        )
        .await?;
        Ok(())
    }

    async fn delete_file(&self, project: ProjectId, file_id: u64) -> ApiResult<()> {
        let target = file_target(project, file_id);
        Self::send(
            self.delete(&format!("/projects/{project}/files/{file_id}")),
            "deleteFile",
            &target,
        )
        .await?;
        Ok(())
    }
}
