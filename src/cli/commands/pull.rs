//! Pull command implementation.

use serde::Serialize;

use super::{client, finish, print_json, record_failure, runtime};
use crate::api::ProjectApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Project, ProjectId};
use crate::sync::{
    Exporter, PullOutcome, StateStore, SyncObserver, SyncResult, SyncState, TracingObserver,
};

/// How a pull decides whether to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullMode {
    /// Trigger a fresh export and wait for it.
    Export,
    /// Download whatever artifact is current.
    Current,
    /// Download the current artifact only if it was not pulled before.
    IfChanged,
}

impl PullMode {
    #[must_use]
    pub const fn from_flags(skip_export: bool, if_changed: bool) -> Self {
        if if_changed {
            Self::IfChanged
        } else if skip_export {
            Self::Current
        } else {
            Self::Export
        }
    }
}

#[derive(Serialize)]
struct PullOutput<'a> {
    success: bool,
    projects: &'a [(ProjectId, PullOutcome)],
    failed: &'a [ProjectId],
}

/// Execute the pull command.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or any project failed.
pub fn execute(config: &Config, mode: PullMode, json: bool) -> Result<()> {
    let projects = config.require_projects()?;
    let client = client(config)?;
    let store = StateStore::new(&config.state_file);
    let mut state = store.load();

    let rt = runtime()?;
    let mut results = Vec::new();
    let mut failed = Vec::new();

    rt.block_on(async {
        for project in projects {
            let outcome =
                pull_project(&client, config, project, &mut state, &TracingObserver, mode)
                    .await
                    .and_then(|outcome| store.save(&state).map(|_| outcome));
            match outcome {
                Ok(outcome) => results.push((project.id, outcome)),
                Err(err) => record_failure(&mut failed, project.id, &Error::from(err)),
            }
        }
    });

    if json {
        print_json(&PullOutput {
            success: failed.is_empty(),
            projects: &results,
            failed: &failed,
        })?;
    } else {
        for (project, outcome) in &results {
            let created_at = outcome.artifact().created_at.as_deref().unwrap_or("-");
            match outcome {
                PullOutcome::Unchanged { .. } => {
                    println!("Project {project}: up to date (artifact {created_at})");
                }
                PullOutcome::Downloaded(export) => println!(
                    "Project {project}: {} files copied (artifact {created_at})",
                    export.copied
                ),
            }
        }
    }

    finish(failed)
}

/// Pull one project and record the artifact it observed.
///
/// # Errors
///
/// Returns the export, download or extraction error.
pub async fn pull_project<A: ProjectApi>(
    api: &A,
    config: &Config,
    project: &Project,
    state: &mut SyncState,
    observer: &dyn SyncObserver,
    mode: PullMode,
) -> SyncResult<PullOutcome> {
    let exporter = Exporter::new(api, &config.paths, observer).with_options(config.export);
    let locale = Some(project.locale.as_str());

    let outcome = match mode {
        PullMode::IfChanged => {
            exporter
                .pull_if_changed(project.id, locale, state.last_artifact(project.id))
                .await?
        }
        PullMode::Current | PullMode::Export => PullOutcome::Downloaded(
            exporter
                .download_latest(project.id, mode == PullMode::Export, locale)
                .await?,
        ),
    };

    if let Some(created_at) = outcome.artifact().created_at.as_deref() {
        state.record_artifact(project.id, created_at);
    }
    Ok(outcome)
}
