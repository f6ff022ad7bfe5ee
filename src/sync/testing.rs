//! In-memory test doubles for the sync engine.

use std::collections::{HashSet, VecDeque};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::api::{ApiError, ApiResult, ProjectApi};
use crate::model::{Artifact, ExportJob, FileUpload, ProjectId, RemoteFile};
use crate::sync::observer::{SyncEvent, SyncObserver};

/// A call received by [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetArtifact,
    TriggerExport,
    Download,
    ListFiles,
    Create { dir: String, name: String, content: Vec<u8> },
    Update { id: u64, name: String },
    UpdateTranslation { id: u64, name: String, force: bool },
    Delete { id: u64 },
}

/// One scripted `get_artifact` answer; `Err` carries an HTTP status.
pub type ArtifactStep = Result<Artifact, u16>;

#[derive(Default)]
struct FakeState {
    artifacts: VecDeque<ArtifactStep>,
    last_artifact: Option<ArtifactStep>,
    archive: Vec<u8>,
    files: Vec<RemoteFile>,
    fail_list: bool,
    failing: HashSet<String>,
    stall_after: Option<usize>,
    calls: Vec<Call>,
}

/// Scriptable [`ProjectApi`] that records every call.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

pub fn artifact(id: u64, created_at: &str) -> Artifact {
    Artifact {
        id,
        created_at: Some(created_at.to_string()),
    }
}

pub fn remote(id: u64, name: &str, hash: &str) -> RemoteFile {
    RemoteFile {
        id,
        name: name.to_string(),
        hash: hash.to_string(),
        ..RemoteFile::default()
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers for successive `get_artifact` calls. The last one repeats.
    pub fn with_artifacts(self, steps: impl IntoIterator<Item = ArtifactStep>) -> Self {
        self.lock().artifacts = steps.into_iter().collect();
        self
    }

    pub fn with_archive(self, bytes: Vec<u8>) -> Self {
        self.lock().archive = bytes;
        self
    }

    pub fn with_files(self, files: Vec<RemoteFile>) -> Self {
        self.lock().files = files;
        self
    }

    pub fn with_failing_list(self) -> Self {
        self.lock().fail_list = true;
        self
    }

    /// Make uploads of this base name fail with HTTP 500.
    pub fn failing_upload(self, name: &str) -> Self {
        self.lock().failing.insert(name.to_string());
        self
    }

    /// Answer this many `get_artifact` calls, then never resolve again.
    pub fn stalling_after(self, answered: usize) -> Self {
        self.lock().stall_after = Some(answered);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| matches(c)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn status(operation: &'static str, target: &str, status: u16) -> ApiError {
        ApiError::Status {
            operation,
            target: target.to_string(),
            status,
            body: String::new(),
        }
    }

    fn check_upload(&self, operation: &'static str, name: &str) -> ApiResult<()> {
        if self.lock().failing.contains(name) {
            return Err(Self::status(operation, name, 500));
        }
        Ok(())
    }

    /// Record a stalled `get_artifact` if the answer budget is spent.
    fn stalls(&self) -> bool {
        let mut state = self.lock();
        let Some(limit) = state.stall_after else {
            return false;
        };
        let answered = state.calls.iter().filter(|c| **c == Call::GetArtifact).count();
        if answered < limit {
            return false;
        }
        state.calls.push(Call::GetArtifact);
        true
    }

    fn next_artifact(&self) -> ApiResult<Artifact> {
        let mut state = self.lock();
        state.calls.push(Call::GetArtifact);
        let step = match state.artifacts.pop_front() {
            Some(step) => {
                state.last_artifact = Some(step.clone());
                step
            }
            None => state.last_artifact.clone().unwrap_or(Err(404)),
        };
        step.map_err(|status| Self::status("getArtifact", "project", status))
    }
}

impl ProjectApi for FakeApi {
    async fn get_artifact(&self, _project: ProjectId) -> ApiResult<Artifact> {
        if self.stalls() {
            std::future::pending::<()>().await;
        }
        self.next_artifact()
    }

    async fn trigger_export(&self, _project: ProjectId) -> ApiResult<ExportJob> {
        self.record(Call::TriggerExport);
        Ok(ExportJob::default())
    }

    async fn download_artifact(&self, _project: ProjectId, dest: &Path) -> ApiResult<u64> {
        self.record(Call::Download);
        let bytes = self.lock().archive.clone();
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(dest, &bytes).unwrap();
        Ok(bytes.len() as u64)
    }

    async fn list_files(&self, _project: ProjectId) -> ApiResult<Vec<RemoteFile>> {
        self.record(Call::ListFiles);
        let state = self.lock();
        if state.fail_list {
            return Err(Self::status("listFiles", "project", 503));
        }
        Ok(state.files.clone())
    }

    async fn create_file(&self, _project: ProjectId, dir: &str, upload: FileUpload) -> ApiResult<()> {
        self.check_upload("createFile", &upload.file_name)?;
        self.record(Call::Create {
            dir: dir.to_string(),
            name: upload.file_name,
            content: upload.content,
        });
        Ok(())
    }

    async fn update_file(&self, _project: ProjectId, file_id: u64, upload: FileUpload) -> ApiResult<()> {
        self.check_upload("updateFile", &upload.file_name)?;
        self.record(Call::Update {
            id: file_id,
            name: upload.file_name,
        });
        Ok(())
    }

    async fn update_translation(
        &self,
        _project: ProjectId,
        file_id: u64,
        upload: FileUpload,
        force: bool,
    ) -> ApiResult<()> {
        self.check_upload("updateFileTranslation", &upload.file_name)?;
        self.record(Call::UpdateTranslation {
            id: file_id,
            name: upload.file_name,
            force,
        });
        Ok(())
    }

    async fn delete_file(&self, _project: ProjectId, file_id: u64) -> ApiResult<()> {
        self.record(Call::Delete { id: file_id });
        Ok(())
    }
}

/// Observer that keeps the debug form of every event.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_event(&self, event: &SyncEvent<'_>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}

/// An item to place in a test archive.
pub enum ZipItem<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Write a zip archive containing `items`, in order.
pub fn build_zip(path: &Path, items: &[ZipItem<'_>]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for item in items {
        match item {
            ZipItem::Dir(name) => zip.add_directory(*name, options).unwrap(),
            ZipItem::File(name, bytes) => {
                zip.start_file(*name, options).unwrap();
                zip.write_all(bytes).unwrap();
            }
        }
    }
    zip.finish().unwrap();
}

/// Build an archive in memory.
pub fn zip_bytes(items: &[ZipItem<'_>]) -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("archive.zip");
    build_zip(&path, items);
    fs::read(path).unwrap()
}
