//! Update-set orchestration: fetch, apply, test, report, restore
//!
//! This module drives the auto-update cycle:
//! - Fetch a candidate update set from the monitoring service
//! - Apply installers and updaters across all ecosystems, fail-fast
//! - Run the user's test suite against the patched tree
//! - Report a structured pass/fail result back to the service
//! - Restore the original files
//!
//! Runs are strictly sequential: the orchestrator mutates dependency files
//! in the working directory in place, so only one run may execute per
//! working directory at a time.

use crate::api::MonitorApi;
use crate::command::CommandRunner;
use crate::domain::{DependencyFile, FileLedger, UpdateSet, UpdateSetResult, UpdateState};
use crate::error::AppError;
use crate::installer::InstallerRegistry;
use crate::progress::Progress;
use crate::updater::UpdaterRegistry;
use colored::Colorize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Wall-clock budget for one `run` invocation
pub const MAX_RUN_DURATION: Duration = Duration::from_secs(60 * 60);

/// Coordinates update-set attempts against the local working tree
pub struct Orchestrator {
    api: Box<dyn MonitorApi>,
    installers: InstallerRegistry,
    updaters: UpdaterRegistry,
    runner: CommandRunner,
    quiet: bool,
}

/// Tally of one `run` invocation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Update sets fetched and attempted
    pub attempted: usize,
    /// Attempts whose test suite passed
    pub passed: usize,
    /// Attempts that failed to apply or failed their tests
    pub failed: usize,
}

impl Orchestrator {
    /// Create an orchestrator with explicit registries
    pub fn new(
        api: Box<dyn MonitorApi>,
        installers: InstallerRegistry,
        updaters: UpdaterRegistry,
    ) -> Self {
        Self {
            api,
            installers,
            updaters,
            runner: CommandRunner::from_env(),
            quiet: false,
        }
    }

    /// Create an orchestrator with the stock installer/updater tables
    pub fn with_defaults(api: Box<dyn MonitorApi>) -> Self {
        Self::new(
            api,
            InstallerRegistry::with_defaults(),
            UpdaterRegistry::with_defaults(),
        )
    }

    /// Silence progress display and per-set status lines
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Iterate candidate update sets: apply, test, report, restore
    ///
    /// Stops when the service has no more candidates or the time budget is
    /// exhausted. Infeasible sets and failing test suites are reported to
    /// the service and the loop continues; any other failure restores the
    /// tree and aborts the run.
    pub async fn run(
        &self,
        project_slug: &str,
        revision: &str,
        testsuite: &str,
    ) -> Result<RunReport, AppError> {
        let started = Instant::now();
        let mut report = RunReport::default();

        loop {
            if started.elapsed() >= MAX_RUN_DURATION {
                self.say("Time budget exhausted, stopping");
                break;
            }

            let mut progress = Progress::new(!self.quiet);
            progress.spinner("Fetching next update set...");
            let fetched = self.api.next_update_set(project_slug, revision).await;
            progress.finish_and_clear();

            let Some(update_set) = fetched? else {
                break;
            };
            if update_set.is_empty() {
                break;
            }

            self.say(&format!(
                "Update set #{}: {} changes across {} ecosystem(s)",
                update_set.id,
                update_set.change_count(),
                update_set.ecosystems().len()
            ));
            report.attempted += 1;

            let mut ledger = FileLedger::new();
            let state = match self.apply_update_set(&update_set, &mut ledger) {
                Ok(()) => match self.run_testsuite(testsuite) {
                    Ok(true) => UpdateState::Success,
                    Ok(false) => UpdateState::Failed,
                    Err(e) => {
                        self.restore(&ledger);
                        return Err(e);
                    }
                },
                // Infeasible sets are a verdict to report, not a crash
                Err(e) if e.is_update_set_failure() => UpdateState::Failed,
                Err(e) => {
                    self.restore(&ledger);
                    return Err(e);
                }
            };

            let result = match state {
                UpdateState::Success => UpdateSetResult::success(
                    update_set.id,
                    project_slug,
                    ledger.updated().to_vec(),
                ),
                UpdateState::Failed => UpdateSetResult::failed(update_set.id, project_slug),
            };

            let pushed = self.api.push_update_result(revision, &result).await;

            // The run flow never leaves the tree patched, whatever happened
            self.restore(&ledger);
            pushed?;

            match state {
                UpdateState::Success => {
                    report.passed += 1;
                    self.say(&format!("update set #{} passed", update_set.id).green());
                }
                UpdateState::Failed => {
                    report.failed += 1;
                    self.say(&format!("update set #{} failed", update_set.id).red());
                }
            }
        }

        Ok(report)
    }

    /// Write the service's best known update file set into the working tree
    ///
    /// Current files are snapshotted first; a failed write restores them
    /// all. On success the patched files are kept in place.
    pub async fn apply_best(
        &self,
        project_slug: &str,
        revision: &str,
    ) -> Result<Vec<DependencyFile>, AppError> {
        let mut progress = Progress::new(!self.quiet);
        progress.spinner("Fetching best update set...");
        let fetched = self.api.best_update_files(project_slug, revision).await;
        progress.finish_and_clear();
        let files = fetched?;

        if files.is_empty() {
            self.say("No update available");
            return Ok(files);
        }

        let mut ledger = FileLedger::new();
        for file in &files {
            // Files new to the tree have nothing to snapshot
            if let Ok(original) = DependencyFile::read(&file.path) {
                ledger.record_original(original);
            }
            if let Err(e) = file.write() {
                self.restore(&ledger);
                return Err(AppError::File(e));
            }
            self.say(&format!("Patched {}", file.path));
        }

        self.say(&format!("Applied {} file(s)", files.len()).green());
        Ok(files)
    }

    /// Apply every ecosystem group of the set, fail-fast, in sorted order
    fn apply_update_set(
        &self,
        update_set: &UpdateSet,
        ledger: &mut FileLedger,
    ) -> Result<(), AppError> {
        // Resolve every implementation up front so an unknown ecosystem
        // fails before any file is touched
        for ecosystem in update_set.ecosystems() {
            if update_set
                .requirement_updates
                .get(ecosystem)
                .is_some_and(|u| !u.is_empty())
            {
                self.installers.get(ecosystem)?;
            }
            if update_set.version_updates.contains_key(ecosystem) {
                self.updaters.get(ecosystem)?;
            }
        }

        for ecosystem in update_set.ecosystems() {
            if let Some(updates) = update_set.requirement_updates.get(ecosystem) {
                if !updates.is_empty() {
                    self.installers.get(ecosystem)?.install(updates, ledger)?;
                }
            }
            // Updaters run even with no explicit targets: the update command
            // may rewrite the lock file regardless
            if let Some(updates) = update_set.version_updates.get(ecosystem) {
                self.updaters.get(ecosystem)?.update(updates, ledger)?;
            }
        }
        Ok(())
    }

    /// Run the user's test suite; Ok(false) is a failing suite, not an error
    fn run_testsuite(&self, testsuite: &str) -> Result<bool, AppError> {
        self.say(&format!("Running test suite: {}", testsuite));
        self.runner
            .run_streaming(testsuite, Path::new("."))
            .map_err(|e| AppError::Testsuite {
                command: testsuite.to_string(),
                source: e,
            })
    }

    /// Best-effort rollback of every snapshotted original
    fn restore(&self, ledger: &FileLedger) {
        if ledger.originals().is_empty() {
            return;
        }
        self.say("Restoring original files");
        if let Err(e) = ledger.restore_originals() {
            eprintln!("{}", format!("warning: {}", e).yellow());
        }
    }

    fn say(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}
