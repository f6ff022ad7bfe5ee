//! Check command implementation.

use std::path::PathBuf;

use colored::Colorize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::validate::check_paths;

/// Validate every JSON file under `paths` (default: the base directory).
///
/// # Errors
///
/// Returns [`Error::InvalidJson`] if any file fails to parse.
pub fn execute(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let roots = if paths.is_empty() {
        vec![config.paths.base_dir.clone()]
    } else {
        paths.to_vec()
    };

    let report = check_paths(&roots);

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        for invalid in &report.invalid {
            eprintln!(
                "{} {}: {}",
                "[JSON INVALID]".red().bold(),
                invalid.path.display(),
                invalid.message
            );
        }
        if report.is_ok() {
            println!("All JSON valid. {} files checked.", report.checked);
        }
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(Error::InvalidJson {
            invalid: report.invalid.len(),
            checked: report.checked,
        })
    }
}
