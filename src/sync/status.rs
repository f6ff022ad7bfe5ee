//! Offline sync status.
//!
//! Reports, per configured project, what the next run would do without
//! touching the network: the last artifact pulled, how many files carry a
//! fingerprint, and which local translations would be uploaded.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::config::WorkPaths;
use crate::model::{Project, ProjectId};
use crate::sync::file::list_managed_files;
use crate::sync::state::{FileProbe, SyncState};
use crate::sync::types::SyncResult;

/// Status of one project's target locale.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
    pub project: ProjectId,
    pub locale: String,
    pub locale_dir: PathBuf,
    /// Whether the locale directory exists.
    pub locale_present: bool,
    /// `createdAt` of the last artifact pulled.
    pub last_artifact: Option<String>,
    /// Files with a stored fingerprint.
    pub tracked: usize,
    /// Managed files under the locale directory.
    pub local_files: usize,
    /// Files a translation push would upload.
    pub pending: Vec<String>,
    /// Size of the last downloaded archive, if still on disk.
    pub archive_size: Option<u64>,
}

/// Compute the status of one project.
///
/// # Errors
///
/// Returns an error if the locale directory exists but cannot be walked.
pub fn project_status(
    project: &Project,
    paths: &WorkPaths,
    state: &SyncState,
) -> SyncResult<ProjectStatus> {
    let locale_dir = paths.locale_dir(&project.locale);
    let locale_present = locale_dir.is_dir();
    let prints = state.fingerprints(project.id);

    let mut local_files = 0;
    let mut pending = Vec::new();
    if locale_present {
        for file in list_managed_files(&locale_dir)? {
            local_files += 1;
            let unchanged = prints
                .and_then(|p| p.get(&file.relative))
                .is_some_and(|fp| fp.is_unchanged(&mut FileProbe::new(&file)).unwrap_or(false));
            if !unchanged {
                pending.push(file.relative);
            }
        }
    }

    let archive_size = std::fs::metadata(paths.archive_path(project.id))
        .ok()
        .map(|m| m.len());

    Ok(ProjectStatus {
        project: project.id,
        locale: project.locale.clone(),
        locale_dir,
        locale_present,
        last_artifact: state.last_artifact(project.id).map(str::to_string),
        tracked: prints.map_or(0, |p| p.len()),
        local_files,
        pending,
        archive_size,
    })
}

/// Print project statuses to stdout in a human-readable format.
pub fn print_status(statuses: &[ProjectStatus]) {
    println!("{}", "Sync Status".bold().underline());
    println!();

    for status in statuses {
        println!(
            "{} {} ({})",
            "Project".blue().bold(),
            status.project,
            status.locale
        );

        match &status.last_artifact {
            Some(created_at) => match format_age(created_at, Utc::now()) {
                Some(age) => println!("  Last artifact: {created_at} ({age})"),
                None => println!("  Last artifact: {created_at}"),
            },
            None => println!("  Last artifact: {}", "never pulled".dimmed()),
        }
        if let Some(size) = status.archive_size {
            println!("  Archive:       {}", format_size(size));
        }

        if !status.locale_present {
            println!(
                "  {} {}",
                "Locale directory missing:".yellow(),
                status.locale_dir.display()
            );
            println!();
            continue;
        }

        println!("  Local files:   {}", status.local_files);
        println!("  Tracked:       {}", status.tracked);

        if status.pending.is_empty() {
            println!("  {}", "No pending translation uploads.".green());
        } else {
            println!(
                "  {}: {}",
                "Pending upload".yellow().bold(),
                status.pending.len()
            );
            for name in &status.pending {
                println!("    {name}");
            }
            println!(
                "  {}",
                "Run 'ptsync push translations' to upload them.".dimmed()
            );
        }
        println!();
    }
}

/// Age of an RFC 3339 timestamp relative to `now`, e.g. `3h ago`.
///
/// Returns `None` for timestamps that do not parse; the artifact's
/// `createdAt` is otherwise treated as opaque.
fn format_age(created_at: &str, now: DateTime<Utc>) -> Option<String> {
    let then = DateTime::parse_from_rfc3339(created_at).ok()?;
    let secs = now.signed_duration_since(then).num_seconds().max(0);
    Some(match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    })
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
