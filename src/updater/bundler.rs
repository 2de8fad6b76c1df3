//! Bundler (Rubygem) version updater

use super::Updater;
use crate::classify::{OutputAction, OutputClassifier};
use crate::command::{split_command, CommandRunner};
use crate::config::ENV_BUNDLE_UPDATE_CMD;
use crate::domain::{DependencyFile, FileLedger, VersionUpdate};
use crate::error::UpdateError;

/// Default update command for ruby bundles
pub const BUNDLE_UPDATE_CMD: &str = "bundle update";

/// Default lock file rewritten by the update command
pub const GEMFILE_LOCK: &str = "Gemfile.lock";

/// Updater for the "Rubygem" ecosystem
///
/// Runs `bundle update <packages>` (or the AUTOUP_BUNDLE_UPDATE_CMD
/// override). The lock file is snapshotted before the command runs even when
/// no package is explicitly targeted: bundler may rewrite it as a side
/// effect regardless.
pub struct BundlerUpdater {
    runner: CommandRunner,
    classifier: OutputClassifier,
    update_command: Option<String>,
    lock_path: String,
}

impl BundlerUpdater {
    /// Create the stock bundler updater
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::from_env(),
            classifier: OutputClassifier::bundler(),
            update_command: None,
            lock_path: GEMFILE_LOCK.to_string(),
        }
    }

    /// Pin the update command, bypassing the environment (for tests)
    pub fn with_update_command(mut self, command: impl Into<String>) -> Self {
        self.update_command = Some(command.into());
        self
    }

    /// Use a different lock file path (for tests)
    pub fn with_lock_path(mut self, path: impl Into<String>) -> Self {
        self.lock_path = path.into();
        self
    }

    fn update_command(&self) -> String {
        if let Some(command) = &self.update_command {
            return command.clone();
        }
        std::env::var(ENV_BUNDLE_UPDATE_CMD)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| BUNDLE_UPDATE_CMD.to_string())
    }
}

impl Default for BundlerUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl Updater for BundlerUpdater {
    fn ecosystem(&self) -> &str {
        "Rubygem"
    }

    fn update(
        &self,
        updates: &[VersionUpdate],
        ledger: &mut FileLedger,
    ) -> Result<(), UpdateError> {
        // The lock file is about to be rewritten, save it for restoration
        let mut lock = DependencyFile::read(&self.lock_path)?;
        ledger.record_original(lock.clone());

        let mut parts =
            split_command(&self.update_command()).map_err(|e| UpdateError::Spawn {
                command: self.update_command(),
                source: e,
            })?;
        for update in updates {
            println!(
                "Updating dependency {} ({} => {})",
                update.package.name, update.old_version, update.target_version
            );
            parts.push(update.package.name.clone());
        }

        let command = parts.join(" ");
        println!("Executing update command: {}", command);
        let output = self
            .runner
            .run_parts(&parts, &lock.workdir())
            .map_err(|e| UpdateError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        if !output.success {
            let combined = output.combined();
            // An incompatible version set is a verdict on the update set
            // itself, to be reported rather than raised
            if self.classifier.classify(&combined) == Some(OutputAction::Infeasible) {
                return Err(UpdateError::CantUpdate);
            }
            return Err(UpdateError::CommandFailed {
                command,
                output: combined,
            });
        }

        lock.refresh()?;
        ledger.record_updated(lock);
        Ok(())
    }
}
