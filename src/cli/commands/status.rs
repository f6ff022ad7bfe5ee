//! Status command implementation.

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::sync::{ProjectStatus, StateStore, print_status, project_status};

#[derive(Serialize)]
struct StatusOutput<'a> {
    config: Option<String>,
    state_file: String,
    projects: &'a [ProjectStatus],
}

/// Execute the status command. Never touches the network.
///
/// # Errors
///
/// Returns an error if no projects are configured or a locale directory
/// cannot be read.
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let projects = config.require_projects()?;
    let store = StateStore::new(&config.state_file);
    let state = store.load();

    let statuses = projects
        .iter()
        .map(|project| project_status(project, &config.paths, &state))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if json {
        let output = StatusOutput {
            config: config.loaded_from.as_ref().map(|p| p.display().to_string()),
            state_file: store.path().display().to_string(),
            projects: &statuses,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_status(&statuses);
    }

    Ok(())
}
