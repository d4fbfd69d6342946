//! CLI argument definitions using clap derive

use crate::report::ReportFormat;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// depdoc - find unmaintained dependencies
///
/// Looks up where each declared library's source code lives and reports
/// libraries whose repository is archived or has had no recent commits.
#[derive(Parser, Debug)]
#[command(name = "depdoc")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEPDOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .depdoc.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose the maintenance state of declared dependencies
    Diagnose(DiagnoseArgs),

    /// List supported package managers
    PackageManagers,

    /// Inspect or reset the source URL cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the diagnose command
#[derive(Parser, Debug)]
pub struct DiagnoseArgs {
    /// Package manager whose registry resolves the libraries
    #[arg(short, long = "package")]
    pub package_manager: String,

    /// Dependency list file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Libraries to ignore (repeatable or space-separated)
    #[arg(short, long, value_delimiter = ' ')]
    pub ignores: Vec<String>,

    /// Max years without a commit (default: from config)
    #[arg(short, long = "year")]
    pub years: Option<u32>,

    /// Exit non-zero if warnings exist
    #[arg(long)]
    pub strict: bool,

    /// Resolve every library through its registry
    #[arg(long)]
    pub disable_cache: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache file path
    Path,

    /// Show cached source URLs
    Show {
        /// Only this package manager
        #[arg(short, long = "package")]
        package_manager: Option<String>,
    },

    /// Delete the cache file
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
