//! Push command implementations.

use serde::Serialize;

use super::{client, finish, print_json, record_failure, runtime};
use crate::cli::PushCommands;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::ProjectId;
use crate::sync::{Pusher, SourcePushStats, StateStore, TracingObserver, TranslationPushStats};

#[derive(Serialize)]
struct PushOutput<'a, T> {
    success: bool,
    projects: &'a [(ProjectId, T)],
    failed: &'a [ProjectId],
}

/// Execute push commands.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or any project failed.
pub fn execute(command: &PushCommands, config: &Config, json: bool) -> Result<()> {
    match command {
        PushCommands::Source => source(config, json),
        PushCommands::Translations { force } => translations(config, *force, json),
    }
}

fn source(config: &Config, json: bool) -> Result<()> {
    let projects = config.require_projects()?;
    let client = client(config)?;
    let pusher = Pusher::new(&client, &TracingObserver);
    let source_dir = config.source_dir();

    let rt = runtime()?;
    let mut results: Vec<(ProjectId, SourcePushStats)> = Vec::new();
    let mut failed = Vec::new();

    rt.block_on(async {
        for project in projects {
            match pusher.push_source_originals(project.id, &source_dir).await {
                Ok(stats) => results.push((project.id, stats)),
                Err(err) => record_failure(&mut failed, project.id, &Error::from(err)),
            }
        }
    });

    if json {
        print_json(&PushOutput {
            success: failed.is_empty(),
            projects: &results,
            failed: &failed,
        })?;
    } else {
        for (project, stats) in &results {
            if stats.changes() == 0 && stats.failed == 0 {
                println!("Project {project}: source up to date ({} files)", stats.unchanged);
                continue;
            }
            println!(
                "Project {project}: {} created, {} updated, {} deleted, {} unchanged, {} failed",
                stats.created, stats.updated, stats.deleted, stats.unchanged, stats.failed
            );
        }
    }

    finish(failed)
}

fn translations(config: &Config, force: bool, json: bool) -> Result<()> {
    let projects = config.require_projects()?;
    let client = client(config)?;
    let pusher = Pusher::new(&client, &TracingObserver);
    let store = StateStore::new(&config.state_file);
    let mut state = store.load();

    let rt = runtime()?;
    let mut results: Vec<(ProjectId, TranslationPushStats)> = Vec::new();
    let mut failed = Vec::new();

    rt.block_on(async {
        for project in projects {
            let locale_dir = config.paths.locale_dir(&project.locale);
            let outcome = pusher
                .push_translations(project.id, &locale_dir, &mut state, force)
                .await
                .and_then(|stats| store.save(&state).map(|_| stats));
            match outcome {
                Ok(stats) => results.push((project.id, stats)),
                Err(err) => record_failure(&mut failed, project.id, &Error::from(err)),
            }
        }
    });

    if json {
        print_json(&PushOutput {
            success: failed.is_empty(),
            projects: &results,
            failed: &failed,
        })?;
    } else {
        for (project, stats) in &results {
            println!(
                "Project {project}: {} of {} uploaded, {} unchanged, {} missing remotely, {} failed",
                stats.uploaded, stats.total, stats.unchanged, stats.missing_remote, stats.failed
            );
        }
    }

    finish(failed)
}
