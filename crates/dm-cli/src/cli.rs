//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dirmirror - directory reports and list-store mirroring
#[derive(Parser, Debug)]
#[command(name = "dm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: dirmirror.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Target tenant from the config's `targets` (or DM_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter dirmirror.yml
    Init(InitArgs),

    /// Enterprise applications with assigned groups, signing certificate
    /// expiry and provisioning status
    Apps(ReportArgs),

    /// Guest users with their home address, last sign-in and groups
    Guests(ReportArgs),

    /// Managed (Intune) applications with their assignments
    IntuneApps(ReportArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write the config into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Arguments shared by the report commands
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output format on stdout
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Write records to this file instead (.csv or .json)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Client-side filter expression, e.g. "accountEnabled eq true"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Reconcile the records into the pipeline's configured sink
    #[arg(long)]
    pub sync: bool,

    /// With --sync, print the plan without writing
    #[arg(long, requires = "sync")]
    pub dry_run: bool,
}

/// Report output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON array of records
    Json,
    /// CSV with a header row
    Csv,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
