//! depdoc - dependency maintenance diagnosis
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use depdoc::cli::{Cli, Commands};
use depdoc::config::{Config, ConfigManager};
use depdoc::error::{DepdocError, DepdocResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DepdocResult<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| DepdocError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    log_config_source(cli.no_local, local_config_path);

    match cli.command {
        Commands::Diagnose(args) => {
            let summary = depdoc::cli::commands::diagnose(args, &config).await?;
            if summary.exit_failure() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::PackageManagers => depdoc::cli::commands::package_managers(&config).await?,
        Commands::Cache(args) => depdoc::cli::commands::cache(args, &config).await?,
        Commands::Config(args) => {
            depdoc::cli::commands::config(args, &config, &config_manager).await?
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr.
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("depdoc=warn"),
        1 => EnvFilter::new("depdoc=info"),
        _ => EnvFilter::new("depdoc=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

fn log_config_source(no_local: bool, local: Option<PathBuf>) {
    if no_local {
        debug!("Local config discovery disabled (--no-local)");
    } else if let Some(path) = local {
        debug!("Found local config: {}", path.display());
    }
}
