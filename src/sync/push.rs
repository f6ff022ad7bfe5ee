//! Incremental push of local files to the remote project.
//!
//! # Source files
//!
//! The source locale is authoritative. Every local file is created remotely
//! if missing and updated when its hash differs from the remote hash. Remote
//! `.json` files with no local counterpart are deleted; remote files with
//! any other extension are never touched.
//!
//! # Translations
//!
//! Translations are uploaded against existing remote files only. A file is
//! skipped when its fingerprint in [`SyncState`] still matches; after an
//! upload the fingerprint is replaced by the current content hash.
//!
//! Both operations are best-effort per file: a failed upload or delete is
//! reported and counted, and the pass moves on. A failed listing aborts.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::api::{ApiResult, ProjectApi};
use crate::model::{FileUpload, ProjectId, RemoteFile};
use crate::sync::file::{LocalFile, is_managed, list_managed_files};
use crate::sync::hash::{content_hash, matches_remote};
use crate::sync::observer::{SyncEvent, SyncObserver};
use crate::sync::state::{FileProbe, Fingerprint, SyncState};
use crate::sync::types::{SourcePushStats, SyncResult, TranslationPushStats};

enum SourceAction {
    Created,
    Updated,
}

/// Uploads local changes for one project at a time.
pub struct Pusher<'a, A: ProjectApi> {
    api: &'a A,
    observer: &'a dyn SyncObserver,
}

impl<'a, A: ProjectApi> Pusher<'a, A> {
    #[must_use]
    pub fn new(api: &'a A, observer: &'a dyn SyncObserver) -> Self {
        Self { api, observer }
    }

    /// Remote files keyed by path-qualified name.
    async fn remote_index(&self, project: ProjectId) -> ApiResult<BTreeMap<String, RemoteFile>> {
        let files = self.api.list_files(project).await?;
        Ok(files.into_iter().map(|f| (f.name.clone(), f)).collect())
    }

    fn fail(&self, project: ProjectId, name: &str, error: &dyn std::fmt::Display) {
        self.observer.on_event(&SyncEvent::FileFailed {
            project,
            name,
            error: &error.to_string(),
        });
    }

    /// Mirror the source locale at `source_root` to the remote project.
    ///
    /// # Errors
    ///
    /// Returns an error if the local tree or the remote listing cannot be
    /// read. Per-file failures are counted in the returned stats.
    pub async fn push_source_originals(
        &self,
        project: ProjectId,
        source_root: &Path,
    ) -> SyncResult<SourcePushStats> {
        let local = list_managed_files(source_root)?;
        let remote = self.remote_index(project).await?;
        let mut stats = SourcePushStats::default();

        for file in &local {
            let content = match file.read() {
                Ok(content) => content,
                Err(e) => {
                    stats.failed += 1;
                    self.fail(project, &file.relative, &e);
                    continue;
                }
            };

            let existing = remote.get(&file.relative);
            if let Some(existing) = existing {
                if matches_remote(&content_hash(&content), &existing.hash) {
                    stats.unchanged += 1;
                    continue;
                }
            }

            let upload = FileUpload::new(file.file_name(), content);
            let result = match existing {
                Some(existing) => self
                    .api
                    .update_file(project, existing.id, upload)
                    .await
                    .map(|()| SourceAction::Updated),
                None => self
                    .api
                    .create_file(project, RemoteFile::dir_prefix(&file.relative), upload)
                    .await
                    .map(|()| SourceAction::Created),
            };

            match result {
                Ok(SourceAction::Created) => {
                    stats.created += 1;
                    self.observer.on_event(&SyncEvent::SourceCreated {
                        project,
                        name: &file.relative,
                    });
                }
                Ok(SourceAction::Updated) => {
                    stats.updated += 1;
                    self.observer.on_event(&SyncEvent::SourceUpdated {
                        project,
                        name: &file.relative,
                    });
                }
                Err(e) => {
                    stats.failed += 1;
                    self.fail(project, &file.relative, &e);
                }
            }
        }

        let local_names: HashSet<&str> = local.iter().map(|f| f.relative.as_str()).collect();
        let stale = remote
            .values()
            .filter(|f| !local_names.contains(f.name.as_str()) && is_managed(&f.name));

        for file in stale {
            match self.api.delete_file(project, file.id).await {
                Ok(()) => {
                    stats.deleted += 1;
                    self.observer.on_event(&SyncEvent::SourceDeleted {
                        project,
                        name: &file.name,
                    });
                }
                Err(e) => {
                    stats.failed += 1;
                    self.fail(project, &file.name, &e);
                }
            }
        }

        Ok(stats)
    }

    /// Upload changed translations under `locale_root`.
    ///
    /// With `force` every file is uploaded and the service is asked to
    /// overwrite existing translations.
    ///
    /// # Errors
    ///
    /// Returns an error if the local tree or the remote listing cannot be
    /// read. Per-file failures are counted in the returned stats.
    pub async fn push_translations(
        &self,
        project: ProjectId,
        locale_root: &Path,
        state: &mut SyncState,
        force: bool,
    ) -> SyncResult<TranslationPushStats> {
        let local = list_managed_files(locale_root)?;
        let remote = self.remote_index(project).await?;
        let mut stats = TranslationPushStats {
            total: local.len(),
            ..TranslationPushStats::default()
        };

        for file in &local {
            let mut probe = FileProbe::new(file);

            if !force {
                let stored = state
                    .fingerprints(project)
                    .and_then(|prints| prints.get(&file.relative));
                if let Some(fingerprint) = stored {
                    match fingerprint.is_unchanged(&mut probe) {
                        Ok(true) => {
                            stats.unchanged += 1;
                            continue;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            stats.failed += 1;
                            self.fail(project, &file.relative, &e);
                            continue;
                        }
                    }
                }
            }

            let Some(existing) = remote.get(&file.relative) else {
                stats.missing_remote += 1;
                self.observer.on_event(&SyncEvent::MissingRemote {
                    project,
                    name: &file.relative,
                });
                continue;
            };

            match self.upload_translation(project, file, probe, existing.id, force).await {
                Ok(hash) => {
                    stats.uploaded += 1;
                    state
                        .fingerprints_mut(project)
                        .insert(file.relative.clone(), Fingerprint::Hash(hash));
                    self.observer.on_event(&SyncEvent::TranslationUploaded {
                        project,
                        name: &file.relative,
                    });
                }
                Err(e) => {
                    stats.failed += 1;
                    self.fail(project, &file.relative, &e);
                }
            }
        }

        stats.pruned = self.prune(project, &local, state);
        Ok(stats)
    }

    async fn upload_translation(
        &self,
        project: ProjectId,
        file: &LocalFile,
        probe: FileProbe<'_>,
        file_id: u64,
        force: bool,
    ) -> SyncResult<String> {
        let (content, hash) = probe.into_content()?;
        let upload = FileUpload::new(file.file_name(), content);
        self.api
            .update_translation(project, file_id, upload, force)
            .await?;
        Ok(hash)
    }

    /// Drop fingerprints of files that no longer exist locally.
    fn prune(&self, project: ProjectId, local: &[LocalFile], state: &mut SyncState) -> usize {
        let Some(prints) = state.local_push.get_mut(&project.to_string()) else {
            return 0;
        };
        let present: HashSet<&str> = local.iter().map(|f| f.relative.as_str()).collect();
        let gone: Vec<String> = prints
            .keys()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect();

        for name in &gone {
            prints.remove(name);
            self.observer
                .on_event(&SyncEvent::StatePruned { project, name });
        }
        gone.len()
    }
}
