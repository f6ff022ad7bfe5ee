//! Export download orchestration.
//!
//! Turns "give me the latest translations" into a locally extracted,
//! normalized file tree:
//!
//! 1. Optionally trigger a rebuild and poll until a new artifact appears
//! 2. Download the archive to `<tmp>/project_<id>_artifact.zip`
//! 3. Reset the staging directory and extract the `utf8` entries into it
//! 4. Normalize every exported file in place
//! 5. Mirror the result into `<base>/<locale>`
//!
//! # Freshness
//!
//! An artifact is new when its `createdAt` differs from the one observed
//! before the rebuild was triggered. The poll loop checks elapsed time
//! against a clock before every request, so a slow service cannot stretch
//! the bound by a full poll interval.

use std::path::Path;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

use crate::api::ProjectApi;
use crate::config::WorkPaths;
use crate::model::{Artifact, ProjectId};
use crate::sync::archive::{DEFAULT_EXTRACT_TIMEOUT, extract_with_timeout};
use crate::sync::file::{copy_tree, reset_dir};
use crate::sync::observer::{SyncEvent, SyncObserver};
use crate::sync::transform::normalize_tree;
use crate::sync::types::{ExportOutcome, PullOutcome, SyncError, SyncResult};

/// Timing bounds for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Delay between artifact polls.
    pub poll_interval: Duration,
    /// How long to wait for a triggered export to produce a new artifact.
    pub export_timeout: Duration,
    /// Bound for one archive extraction.
    pub extract_timeout: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            export_timeout: Duration::from_secs(120),
            extract_timeout: DEFAULT_EXTRACT_TIMEOUT,
        }
    }
}

/// Downloads and applies remote exports for one project at a time.
pub struct Exporter<'a, A: ProjectApi> {
    api: &'a A,
    paths: &'a WorkPaths,
    observer: &'a dyn SyncObserver,
    options: ExportOptions,
}

impl<'a, A: ProjectApi> Exporter<'a, A> {
    #[must_use]
    pub fn new(api: &'a A, paths: &'a WorkPaths, observer: &'a dyn SyncObserver) -> Self {
        Self {
            api,
            paths,
            observer,
            options: ExportOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Download the project's export and apply it.
    ///
    /// With `force_export` a rebuild is triggered first and this waits for
    /// it. With `target_locale` the result is copied into the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the export times out, a remote call fails, or the
    /// archive cannot be extracted.
    pub async fn download_latest(
        &self,
        project: ProjectId,
        force_export: bool,
        target_locale: Option<&str>,
    ) -> SyncResult<ExportOutcome> {
        let artifact = if force_export {
            self.wait_for_new_artifact(project).await?
        } else {
            // Read first: the recorded timestamp must not run ahead of the content.
            self.api.get_artifact(project).await?
        };
        self.fetch(project, artifact, target_locale).await
    }

    /// Download only if the current artifact differs from `last_seen`.
    ///
    /// # Errors
    ///
    /// Same as [`Exporter::download_latest`].
    pub async fn pull_if_changed(
        &self,
        project: ProjectId,
        target_locale: Option<&str>,
        last_seen: Option<&str>,
    ) -> SyncResult<PullOutcome> {
        let artifact = self.api.get_artifact(project).await?;

        if let (Some(current), Some(seen)) = (artifact.created_at.as_deref(), last_seen) {
            if current == seen {
                self.observer.on_event(&SyncEvent::ArtifactUnchanged {
                    project,
                    created_at: current,
                });
                return Ok(PullOutcome::Unchanged { artifact });
            }
        }

        let outcome = self.fetch(project, artifact, target_locale).await?;
        Ok(PullOutcome::Downloaded(outcome))
    }

    /// Trigger a rebuild and poll until a newer artifact is published.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ExportTimeout`] if nothing new appears within
    /// the export timeout, or the trigger error.
    pub async fn wait_for_new_artifact(&self, project: ProjectId) -> SyncResult<Artifact> {
        let before = match self.api.get_artifact(project).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                debug!(%project, error = %e, "No current artifact before export");
                None
            }
        };

        self.api.trigger_export(project).await?;
        self.observer
            .on_event(&SyncEvent::ExportTriggered { project });

        let timed_out = SyncError::ExportTimeout {
            project,
            timeout: self.options.export_timeout,
        };
        let start = Instant::now();
        loop {
            let remaining = self.options.export_timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(timed_out);
            }

            // A poll that never answers must not outlive the export bound.
            let Ok(polled) = timeout(remaining, self.api.get_artifact(project)).await else {
                return Err(timed_out);
            };

            match polled {
                Ok(artifact) if artifact.is_newer_than(before.as_ref()) => {
                    self.observer.on_event(&SyncEvent::ExportReady {
                        project,
                        created_at: artifact.created_at.as_deref().unwrap_or_default(),
                    });
                    return Ok(artifact);
                }
                Ok(_) => {}
                Err(e) => {
                    self.observer.on_event(&SyncEvent::ExportPollFailed {
                        project,
                        error: &e.to_string(),
                    });
                }
            }

            sleep(self.options.poll_interval).await;
        }
    }

    async fn fetch(
        &self,
        project: ProjectId,
        artifact: Artifact,
        target_locale: Option<&str>,
    ) -> SyncResult<ExportOutcome> {
        let archive_path = self.paths.archive_path(project);
        let staging_dir = self.paths.staging_dir(project);

        let archive_bytes = self.api.download_artifact(project, &archive_path).await?;
        self.observer.on_event(&SyncEvent::ArchiveDownloaded {
            project,
            path: &archive_path,
            bytes: archive_bytes,
        });

        reset_dir(&staging_dir)?;
        let extract = extract_with_timeout(
            archive_path.clone(),
            staging_dir.clone(),
            self.options.extract_timeout,
        )
        .await?;
        self.observer.on_event(&SyncEvent::Extracted {
            project,
            stats: &extract,
        });

        let transform = normalize_tree(&staging_dir, self.observer)?;
        self.observer.on_event(&SyncEvent::Transformed {
            project,
            stats: &transform,
        });

        let copied = match target_locale {
            Some(locale) => self.mirror(project, &staging_dir, locale)?,
            None => 0,
        };

        Ok(ExportOutcome {
            project,
            staging_dir,
            artifact,
            archive_bytes,
            extract,
            transform,
            copied,
        })
    }

    /// Copy `staging/<locale>` (or the whole staging tree) into the working tree.
    fn mirror(&self, project: ProjectId, staging_dir: &Path, locale: &str) -> SyncResult<usize> {
        let nested = staging_dir.join(locale);
        let from = if nested.is_dir() {
            nested
        } else {
            staging_dir.to_path_buf()
        };
        let to = self.paths.locale_dir(locale);

        let files = copy_tree(&from, &to)?;
        self.observer.on_event(&SyncEvent::TreeCopied {
            project,
            from: &from,
            to: &to,
            files,
        });
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::observer::NoopObserver;
    use crate::sync::testing::{Call, FakeApi, ZipItem, artifact, zip_bytes};
    use std::fs;
    use tempfile::TempDir;

    fn work_paths(dir: &TempDir) -> WorkPaths {
        WorkPaths::new(dir.path().join("tmp"), dir.path().join("project"))
    }

    fn export_archive() -> Vec<u8> {
        zip_bytes(&[
            ZipItem::Dir("utf8/"),
            ZipItem::Dir("utf8/zh-HANS/"),
            ZipItem::File(
                "utf8/zh-HANS/a.json",
                br#"[{"key":"hello","original":"Hello","translation":"ni hao"}]"#,
            ),
            ZipItem::File("utf8/zh-HANS/ui/b.json", br#"{"k":"v"}"#),
            ZipItem::File("raw/zh-HANS/a.json", b"raw"),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_created_at_changes() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new().with_artifacts([
            Ok(artifact(1, "t0")),
            Ok(artifact(1, "t0")),
            Ok(artifact(1, "t0")),
            Ok(artifact(2, "t1")),
        ]);
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let start = Instant::now();
        let fresh = exporter.wait_for_new_artifact(ProjectId(9588)).await.unwrap();

        assert_eq!(fresh.created_at.as_deref(), Some("t1"));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
        assert_eq!(api.count(|c| *c == Call::GetArtifact), 4);
        assert_eq!(api.calls()[1], Call::TriggerExport);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_extra_poll() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new().with_artifacts([Ok(artifact(1, "t0"))]);
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let start = Instant::now();
        let err = exporter
            .wait_for_new_artifact(ProjectId(9588))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::ExportTimeout { project: ProjectId(9588), .. }
        ));
        assert!(err.to_string().contains("9588"));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(120) && waited < Duration::from_secs(121));
        // One baseline read plus a poll at 0s, 3s, ... 117s
        assert_eq!(api.count(|c| *c == Call::GetArtifact), 41);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_poll_never_answers() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        // The baseline read answers; every later poll hangs.
        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(1, "t0"))])
            .stalling_after(1);
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let start = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(3600),
            exporter.wait_for_new_artifact(ProjectId(9797)),
        )
        .await
        .expect("export bound should fire before the outer guard");

        assert!(matches!(
            result,
            Err(SyncError::ExportTimeout { project: ProjectId(9797), .. })
        ));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(120) && waited < Duration::from_secs(121));
        assert_eq!(api.count(|c| *c == Call::GetArtifact), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_retries_poll_errors() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new().with_artifacts([Err(404), Err(500), Ok(artifact(5, "t5"))]);
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let fresh = exporter.wait_for_new_artifact(ProjectId(1)).await.unwrap();

        assert_eq!(fresh.id, 5);
        assert_eq!(api.count(|c| *c == Call::GetArtifact), 3);
    }

    #[tokio::test]
    async fn test_download_latest_mirrors_into_locale() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let staging = paths.staging_dir(ProjectId(9588));
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("stale.json"), "{}").unwrap();
        let locale_dir = paths.locale_dir("zh-HANS");
        fs::create_dir_all(&locale_dir).unwrap();
        fs::write(locale_dir.join("keep.json"), "{}").unwrap();

        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(3, "t3"))])
            .with_archive(export_archive());
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let outcome = exporter
            .download_latest(ProjectId(9588), false, Some("zh-HANS"))
            .await
            .unwrap();

        assert_eq!(outcome.artifact.created_at.as_deref(), Some("t3"));
        assert_eq!(outcome.extract.files_written, 2);
        assert_eq!(outcome.transform.converted, 1);
        assert_eq!(outcome.copied, 2);
        assert!(!staging.join("stale.json").exists());
        assert!(!api.calls().contains(&Call::TriggerExport));

        let a = fs::read_to_string(locale_dir.join("a.json")).unwrap();
        assert_eq!(a, "{\n  \"hello\": \"ni hao\"\n}");
        assert_eq!(
            fs::read_to_string(locale_dir.join("ui/b.json")).unwrap(),
            r#"{"k":"v"}"#
        );
        assert!(locale_dir.join("keep.json").exists());
        assert!(paths.archive_path(ProjectId(9588)).is_file());
    }

    #[tokio::test]
    async fn test_download_latest_copies_whole_tree_without_locale_folder() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(1, "t1"))])
            .with_archive(zip_bytes(&[ZipItem::File("utf8/a.json", b"{}")]));
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let outcome = exporter
            .download_latest(ProjectId(9797), false, Some("fr-FR"))
            .await
            .unwrap();

        assert_eq!(outcome.copied, 1);
        assert!(paths.locale_dir("fr-FR").join("a.json").is_file());
    }

    #[tokio::test]
    async fn test_forced_download_triggers_export() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(1, "t0")), Ok(artifact(2, "t1"))])
            .with_archive(export_archive());
        let exporter = Exporter::new(&api, &paths, &NoopObserver).with_options(ExportOptions {
            poll_interval: Duration::from_millis(1),
            ..ExportOptions::default()
        });

        let outcome = exporter
            .download_latest(ProjectId(9588), true, None)
            .await
            .unwrap();

        assert_eq!(outcome.artifact.id, 2);
        assert_eq!(outcome.copied, 0);
        assert_eq!(
            api.calls(),
            vec![
                Call::GetArtifact,
                Call::TriggerExport,
                Call::GetArtifact,
                Call::Download
            ]
        );
    }

    #[tokio::test]
    async fn test_unforced_download_reads_artifact_first() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(3, "t3")), Ok(artifact(4, "t4"))])
            .with_archive(export_archive());
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let outcome = exporter
            .download_latest(ProjectId(9588), false, None)
            .await
            .unwrap();

        assert_eq!(outcome.artifact.created_at.as_deref(), Some("t3"));
        assert_eq!(api.calls(), vec![Call::GetArtifact, Call::Download]);
    }

    #[tokio::test]
    async fn test_pull_if_changed_skips_known_artifact() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new().with_artifacts([Ok(artifact(1, "t1"))]);
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let outcome = exporter
            .pull_if_changed(ProjectId(9588), Some("zh-HANS"), Some("t1"))
            .await
            .unwrap();

        assert!(matches!(outcome, PullOutcome::Unchanged { .. }));
        assert!(!api.calls().contains(&Call::Download));
    }

    #[tokio::test]
    async fn test_pull_if_changed_downloads_new_artifact() {
        let dir = TempDir::new().unwrap();
        let paths = work_paths(&dir);
        let api = FakeApi::new()
            .with_artifacts([Ok(artifact(2, "t2"))])
            .with_archive(export_archive());
        let exporter = Exporter::new(&api, &paths, &NoopObserver);

        let outcome = exporter
            .pull_if_changed(ProjectId(9588), Some("zh-HANS"), Some("t1"))
            .await
            .unwrap();

        assert!(matches!(outcome, PullOutcome::Downloaded(_)));
        assert_eq!(outcome.artifact().created_at.as_deref(), Some("t2"));
        assert!(paths.locale_dir("zh-HANS").join("a.json").is_file());
    }
}
