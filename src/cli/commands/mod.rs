//! Command implementations.
//!
//! Network commands share one shape: resolve the selected projects, build a
//! client, then drive the sync engine on a runtime created here. Projects are
//! processed one after another and a failure in one does not stop the rest.

pub mod check;
pub mod completions;
pub mod pull;
pub mod push;
pub mod status;
pub mod sync;
pub mod version;

use tokio::runtime::Runtime;
use tracing::error;

use crate::api::ParaTranzClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::ProjectId;

/// Create the async runtime for a network command.
fn runtime() -> Result<Runtime> {
    Ok(Runtime::new()?)
}

fn client(config: &Config) -> Result<ParaTranzClient> {
    Ok(ParaTranzClient::new(
        config.api_base.clone(),
        config.require_token()?,
    ))
}

/// Log a per-project failure and remember the project.
fn record_failure(failed: &mut Vec<ProjectId>, project: ProjectId, err: &Error) {
    error!(project = %project, error = %err, "Project failed");
    failed.push(project);
}

/// Turn the collected failures into the command result.
fn finish(failed: Vec<ProjectId>) -> Result<()> {
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::ProjectsFailed { failed })
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reports_failed_projects() {
        assert!(finish(Vec::new()).is_ok());

        let err = finish(vec![ProjectId(9797)]).unwrap_err();
        assert!(matches!(err, Error::ProjectsFailed { ref failed } if failed == &[ProjectId(9797)]));
    }
}
