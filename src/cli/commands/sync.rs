//! Sync command implementation.
//!
//! For each selected project, in config order:
//!
//! 1. push the shared source locale
//! 2. push changed translations (fingerprints read from and written to state)
//! 3. save state
//! 4. pull the latest export into the project's locale directory
//! 5. record the artifact timestamp and save state again
//!
//! A project that fails is logged and skipped; the command fails at the end
//! if any project did.

use colored::Colorize;
use serde::Serialize;

use super::{client, finish, print_json, record_failure, runtime};
use crate::api::ProjectApi;
use crate::config::Config;
use crate::error::Result;
use crate::model::{Project, ProjectId};
use crate::sync::{
    ExportOutcome, Exporter, Pusher, SourcePushStats, StateStore, SyncObserver, SyncState,
    TracingObserver, TranslationPushStats,
};

/// Flags for one sync run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub force_translations: bool,
    pub skip_export: bool,
}

/// What happened to one project.
#[derive(Debug, Serialize)]
pub struct ProjectReport {
    pub project: ProjectId,
    pub locale: String,
    pub source: SourcePushStats,
    pub translations: TranslationPushStats,
    pub export: ExportOutcome,
}

#[derive(Serialize)]
struct SyncOutput<'a> {
    success: bool,
    projects: &'a [ProjectReport],
    failed: &'a [ProjectId],
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, or
/// [`Error::ProjectsFailed`](crate::error::Error::ProjectsFailed) if any
/// project could not be synced.
pub fn execute(config: &Config, options: SyncOptions, json: bool) -> Result<()> {
    let projects = config.require_projects()?;
    let client = client(config)?;
    let store = StateStore::new(&config.state_file);

    let rt = runtime()?;
    let (reports, failed) =
        rt.block_on(sync_all(&client, config, projects, &store, &TracingObserver, options));

    if json {
        print_json(&SyncOutput {
            success: failed.is_empty(),
            projects: &reports,
            failed: &failed,
        })?;
    } else {
        print_reports(&reports);
    }

    finish(failed)
}

/// Sync every project, collecting reports and the ids that failed.
pub async fn sync_all<A: ProjectApi>(
    api: &A,
    config: &Config,
    projects: &[Project],
    store: &StateStore,
    observer: &dyn SyncObserver,
    options: SyncOptions,
) -> (Vec<ProjectReport>, Vec<ProjectId>) {
    let mut state = store.load();
    let mut reports = Vec::new();
    let mut failed = Vec::new();

    for project in projects {
        match sync_project(api, config, project, store, &mut state, observer, options).await {
            Ok(report) => reports.push(report),
            Err(err) => record_failure(&mut failed, project.id, &err),
        }
    }

    (reports, failed)
}

/// Push then pull one project.
///
/// # Errors
///
/// Returns the first error that aborts this project's pass.
pub async fn sync_project<A: ProjectApi>(
    api: &A,
    config: &Config,
    project: &Project,
    store: &StateStore,
    state: &mut SyncState,
    observer: &dyn SyncObserver,
    options: SyncOptions,
) -> Result<ProjectReport> {
    let pusher = Pusher::new(api, observer);
    let source = pusher
        .push_source_originals(project.id, &config.source_dir())
        .await?;
    let translations = pusher
        .push_translations(
            project.id,
            &config.paths.locale_dir(&project.locale),
            state,
            options.force_translations,
        )
        .await?;
    store.save(state)?;

    let exporter = Exporter::new(api, &config.paths, observer).with_options(config.export);
    let export = exporter
        .download_latest(project.id, !options.skip_export, Some(&project.locale))
        .await?;
    if let Some(created_at) = export.artifact.created_at.as_deref() {
        state.record_artifact(project.id, created_at);
    }
    store.save(state)?;

    Ok(ProjectReport {
        project: project.id,
        locale: project.locale.clone(),
        source,
        translations,
        export,
    })
}

fn print_reports(reports: &[ProjectReport]) {
    for report in reports {
        println!(
            "{} {} ({})",
            "Synced project".green().bold(),
            report.project,
            report.locale
        );
        println!(
            "  Source:       {} created, {} updated, {} deleted, {} unchanged",
            report.source.created,
            report.source.updated,
            report.source.deleted,
            report.source.unchanged
        );
        println!(
            "  Translations: {} uploaded, {} unchanged, {} missing remotely",
            report.translations.uploaded,
            report.translations.unchanged,
            report.translations.missing_remote
        );
        println!(
            "  Export:       {} files copied (artifact {})",
            report.export.copied,
            report.export.artifact.created_at.as_deref().unwrap_or("-")
        );
        let failures = report.source.failed + report.translations.failed;
        if failures > 0 {
            println!("  {} {failures} file(s) failed, see log above", "Warning:".yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, Overrides, ProjectEntry};
    use crate::sync::NoopObserver;
    use crate::sync::testing::{Call, FakeApi, ZipItem, artifact, remote, zip_bytes};
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        let file = ConfigFile {
            token: Some("t".into()),
            base_dir: Some(dir.path().join("project")),
            tmp_dir: Some(dir.path().join("tmp")),
            state_file: Some(dir.path().join("state.json")),
            projects: vec![
                ProjectEntry {
                    id: ProjectId(9588),
                    locale: "zh-HANS".into(),
                },
                ProjectEntry {
                    id: ProjectId(9797),
                    locale: "fr-FR".into(),
                },
            ],
            ..ConfigFile::default()
        };
        Config::resolve(file, &Overrides::default(), None).unwrap()
    }

    fn archive() -> Vec<u8> {
        zip_bytes(&[
            ZipItem::Dir("utf8/"),
            ZipItem::File(
                "utf8/fr-FR/menu.json",
                br#"[{"key":"k","original":"Menu","translation":"Carte"}]"#,
            ),
        ])
    }

    #[tokio::test]
    async fn test_failed_project_does_not_stop_the_next() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let source = config.source_dir();
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("menu.json"), r#"{"k":"Menu"}"#).unwrap();
        // zh-HANS is missing, so 9588 fails at the translation push.
        let fr = config.paths.locale_dir("fr-FR");
        fs::create_dir_all(&fr).unwrap();
        fs::write(fr.join("menu.json"), r#"{"k":"Carte"}"#).unwrap();

        let api = FakeApi::new()
            .with_files(vec![remote(1, "menu.json", "")])
            .with_artifacts([Ok(artifact(4, "t4"))])
            .with_archive(archive());
        let store = StateStore::new(&config.state_file);
        let options = SyncOptions {
            skip_export: true,
            ..SyncOptions::default()
        };

        let (reports, failed) =
            sync_all(&api, &config, &config.projects, &store, &NoopObserver, options).await;

        assert_eq!(failed, vec![ProjectId(9588)]);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.project, ProjectId(9797));
        assert_eq!(report.translations.uploaded, 1);
        assert_eq!(report.export.copied, 1);
        assert!(!api.calls().contains(&Call::TriggerExport));

        let state = store.load();
        assert_eq!(state.last_artifact(ProjectId(9797)), Some("t4"));
        assert_eq!(state.last_artifact(ProjectId(9588)), None);
        assert!(
            state
                .fingerprints(ProjectId(9797))
                .is_some_and(|prints| prints.contains_key("menu.json"))
        );
        assert_eq!(
            fs::read_to_string(fr.join("menu.json")).unwrap(),
            "{\n  \"k\": \"Carte\"\n}"
        );
    }
}
