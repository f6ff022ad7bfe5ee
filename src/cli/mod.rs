//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{CONFIG_ENV, Overrides, TOKEN_ENV};
use crate::model::ProjectId;

pub mod commands;

/// ptsync - keep a local translation tree in sync with ParaTranz
#[derive(Parser, Debug)]
#[command(name = "ptsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./ptsync.json, then ~/.ptsync/config.json)
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// ParaTranz API token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Root of the local translation tree (default: project)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Only process this project (repeatable)
    #[arg(long = "project", value_name = "ID", global = true)]
    pub projects: Vec<ProjectId>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// Configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            token: self.token.clone(),
            base_dir: self.base_dir.clone(),
            projects: self.projects.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Push sources and translations, then pull a fresh export, per project
    Sync {
        /// Upload every translation file and overwrite remote translations
        #[arg(long)]
        force_translations: bool,

        /// Download the current artifact instead of triggering a new export
        #[arg(long)]
        skip_export: bool,
    },

    /// Upload local changes
    Push {
        #[command(subcommand)]
        command: PushCommands,
    },

    /// Download the latest export into the local tree
    Pull {
        /// Download the current artifact instead of triggering a new export
        #[arg(long)]
        skip_export: bool,

        /// Skip projects whose current artifact was already pulled (never triggers an export)
        #[arg(long, conflicts_with = "skip_export")]
        if_changed: bool,
    },

    /// Show what the next push would upload (offline)
    Status,

    /// Validate JSON files
    Check {
        /// Directories to scan (default: the base directory)
        paths: Vec<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum PushCommands {
    /// Mirror the source locale to every configured project
    Source,

    /// Upload changed translation files
    Translations {
        /// Upload every file and overwrite remote translations
        #[arg(long)]
        force: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
