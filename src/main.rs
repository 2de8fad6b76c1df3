//! autoup - auto-update client CLI
//!
//! Fetches dependency update sets from the monitoring service, tests them
//! against the local working tree and reports the outcome, or applies the
//! best known update set in place.

use autoup::api::{HttpApi, MonitorApi};
use autoup::cli::{CliArgs, CliCommand};
use autoup::config::{self, Config};
use autoup::error::ConfigError;
use autoup::orchestrator::Orchestrator;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = Config::load(Path::new("."))?;
    let slug = config.resolve_slug(args.project.as_deref())?;

    let revision = config::current_revision().ok_or(ConfigError::MissingRevision)?;
    let branch = config::current_branch().unwrap_or_default();

    if args.verbose {
        eprintln!("autoup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Endpoint: {}", config.api_endpoint);
        eprintln!("Project: {}", slug);
        eprintln!("Revision: {}", revision);
    }

    let api = HttpApi::new(&config.api_endpoint, &config.api_key)?
        .with_context(revision.clone(), branch);

    // Validate the slug server-side before touching anything locally
    let project = api.fetch_project(&slug).await?;
    let project_slug = if project.slug.is_empty() {
        slug
    } else {
        project.slug
    };

    let orchestrator = Orchestrator::with_defaults(Box::new(api)).quiet(args.quiet);

    match args.command {
        CliCommand::Run { testsuite } => {
            let testsuite = config.resolve_testsuite(&testsuite)?;
            let report = orchestrator
                .run(&project_slug, &revision, &testsuite)
                .await?;

            if !args.quiet {
                println!(
                    "Attempted {} update set(s): {} passed, {} failed",
                    report.attempted, report.passed, report.failed
                );
            }
        }
        CliCommand::Apply => {
            orchestrator.apply_best(&project_slug, &revision).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
