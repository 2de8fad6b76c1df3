//! CLI argument parsing module for autoup

use clap::{Parser, Subcommand};

/// Auto-update client for a dependency monitoring service
#[derive(Parser, Debug, Clone)]
#[command(
    name = "autoup",
    version,
    about = "Test and apply dependency update sets proposed by the monitoring service"
)]
pub struct CliArgs {
    /// Project slug (overrides AUTOUP_PROJECT_SLUG and .autoup.toml)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Fetch candidate update sets, test each against the local tree and
    /// report results; originals are always restored
    Run {
        /// Test suite command (falls back to AUTOUP_TESTSUITE)
        #[arg(trailing_var_arg = true)]
        testsuite: Vec<String>,
    },

    /// Write the best known update set into the working tree and keep it
    Apply,
}
