//! ptsync CLI entry point.

use clap::Parser;
use ptsync::cli::commands;
use ptsync::cli::commands::pull::PullMode;
use ptsync::cli::commands::sync::SyncOptions;
use ptsync::cli::{Cli, Commands};
use ptsync::config::Config;
use ptsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let json = cli.json;

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn,ptsync=info"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper_util=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    // Commands that work without a config
    match &cli.command {
        Commands::Version => return commands::version::execute(json),
        Commands::Completions { shell } => return commands::completions::execute(shell),
        _ => {}
    }

    let config = Config::load(&cli.overrides())?;

    match &cli.command {
        Commands::Sync {
            force_translations,
            skip_export,
        } => commands::sync::execute(
            &config,
            SyncOptions {
                force_translations: *force_translations,
                skip_export: *skip_export,
            },
            json,
        ),

        Commands::Push { command } => commands::push::execute(command, &config, json),

        Commands::Pull {
            skip_export,
            if_changed,
        } => commands::pull::execute(
            &config,
            PullMode::from_flags(*skip_export, *if_changed),
            json,
        ),

        Commands::Status => commands::status::execute(&config, json),

        Commands::Check { paths } => commands::check::execute(&config, paths, json),

        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}
