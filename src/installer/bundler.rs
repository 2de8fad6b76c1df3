//! Bundler (Rubygem) requirement installer

use super::{patch_requirement, Installer};
use crate::classify::{OutputAction, OutputClassifier};
use crate::command::CommandRunner;
use crate::config::ENV_BUNDLE_INSTALL_CMD;
use crate::domain::{FileLedger, RequirementUpdate};
use crate::error::InstallError;
use std::path::Path;

/// Default install command for ruby bundles
pub const BUNDLE_INSTALL_CMD: &str = "bundle install";

/// Installer for the "Rubygem" ecosystem
///
/// Patches Gemfile-style manifests and runs `bundle install` (or the
/// AUTOUP_BUNDLE_INSTALL_CMD override) in the directory of the patched
/// files. Two bundler failure modes get special handling: a suggested
/// remediation command is retried once, and the incompatible-versions
/// message marks the update set as infeasible.
pub struct BundlerInstaller {
    runner: CommandRunner,
    classifier: OutputClassifier,
    install_command: Option<String>,
}

impl BundlerInstaller {
    /// Create the stock bundler installer
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::from_env(),
            classifier: OutputClassifier::bundler(),
            install_command: None,
        }
    }

    /// Pin the install command, bypassing the environment (for tests)
    pub fn with_install_command(mut self, command: impl Into<String>) -> Self {
        self.install_command = Some(command.into());
        self
    }

    fn install_command(&self) -> String {
        if let Some(command) = &self.install_command {
            return command.clone();
        }
        std::env::var(ENV_BUNDLE_INSTALL_CMD)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| BUNDLE_INSTALL_CMD.to_string())
    }

    fn run_install(&self, workdir: &Path) -> Result<(), InstallError> {
        let command = self.install_command();
        println!("Running {}", command);
        let output = self
            .runner
            .run(&command, workdir)
            .map_err(|e| InstallError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        if output.success {
            return Ok(());
        }

        let combined = output.combined();
        match self.classifier.classify(&combined) {
            Some(OutputAction::RetryWith(remedy)) => {
                // Sometimes the bundle itself needs updating first
                println!("Running {}", remedy);
                let retried = self
                    .runner
                    .run(&remedy, workdir)
                    .map_err(|_| InstallError::CantInstall)?;
                if retried.success {
                    Ok(())
                } else {
                    Err(InstallError::CantInstall)
                }
            }
            Some(OutputAction::Infeasible) => Err(InstallError::CantInstall),
            None => Err(InstallError::CommandFailed {
                command,
                output: combined,
            }),
        }
    }
}

impl Default for BundlerInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl Installer for BundlerInstaller {
    fn ecosystem(&self) -> &str {
        "Rubygem"
    }

    fn install(
        &self,
        updates: &[RequirementUpdate],
        ledger: &mut FileLedger,
    ) -> Result<(), InstallError> {
        if updates.is_empty() {
            return Ok(());
        }

        for update in updates {
            patch_requirement(update, ledger)?;
        }

        let workdir = updates[0].file.workdir();
        self.run_install(&workdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{content_sha1, DependencyFile};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::process::{Command, Stdio};
    use tempfile::TempDir;

    fn patch_tool_available() -> bool {
        Command::new("patch")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Write an executable script into `dir` and return its absolute path
    fn write_script(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    /// A Gemfile on disk plus the requirement update patching it
    fn gemfile_update(dir: &TempDir) -> RequirementUpdate {
        let path = dir.path().join("Gemfile").to_str().unwrap().to_string();
        let original = "gem \"rails\", \"3.0.0\"\n";
        fs::write(&path, original).unwrap();
        RequirementUpdate {
            file: DependencyFile {
                path: path.clone(),
                sha: content_sha1(original.as_bytes()),
                content: String::new(),
            },
            patch: format!(
                "--- {p}\n+++ {p}\n@@ -1 +1 @@\n-gem \"rails\", \"3.0.0\"\n+gem \"rails\", \"4.0.0\"\n",
                p = path
            ),
        }
    }

    #[test]
    fn test_ecosystem_name() {
        assert_eq!(BundlerInstaller::new().ecosystem(), "Rubygem");
    }

    #[test]
    fn test_empty_updates_is_noop() {
        let installer = BundlerInstaller::new().with_install_command("false");
        let mut ledger = FileLedger::new();
        installer.install(&[], &mut ledger).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_install_patches_and_runs_command() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let update = gemfile_update(&dir);
        let installer = BundlerInstaller::new().with_install_command("true");

        let mut ledger = FileLedger::new();
        installer.install(&[update.clone()], &mut ledger).unwrap();

        assert_eq!(ledger.originals().len(), 1);
        assert!(ledger.originals()[0].content.contains("3.0.0"));
        assert_eq!(ledger.updated().len(), 1);
        assert!(ledger.updated()[0].content.contains("4.0.0"));
        assert!(fs::read_to_string(&update.file.path)
            .unwrap()
            .contains("4.0.0"));
    }

    #[test]
    fn test_fingerprint_mismatch_aborts_before_patching() {
        let dir = TempDir::new().unwrap();
        let mut update = gemfile_update(&dir);
        update.file.sha = "0000000000000000000000000000000000000000".to_string();
        let installer = BundlerInstaller::new().with_install_command("true");

        let mut ledger = FileLedger::new();
        let err = installer.install(&[update.clone()], &mut ledger).unwrap_err();
        assert!(matches!(err, InstallError::File(_)));
        // Nothing recorded, nothing changed on disk
        assert!(ledger.is_empty());
        assert!(fs::read_to_string(&update.file.path)
            .unwrap()
            .contains("3.0.0"));
    }

    #[test]
    fn test_retry_suggestion_runs_remediation_once() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let update = gemfile_update(&dir);
        // The install command fails suggesting a remediation; the remediation
        // leaves a marker so the retry can be observed.
        let marker = dir.path().join("retried");
        let script = write_script(
            &dir,
            "install.sh",
            &format!("echo 'Try running `touch {}`'\nexit 1", marker.display()),
        );
        let installer = BundlerInstaller::new().with_install_command(script);

        let mut ledger = FileLedger::new();
        installer.install(&[update], &mut ledger).unwrap();
        assert!(marker.exists());
    }

    #[test]
    fn test_failed_retry_yields_generic_error() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let update = gemfile_update(&dir);
        let script = write_script(
            &dir,
            "install.sh",
            "echo 'Try running `false`'\nexit 1",
        );
        let installer = BundlerInstaller::new().with_install_command(script);

        let mut ledger = FileLedger::new();
        let err = installer.install(&[update], &mut ledger).unwrap_err();
        assert!(matches!(err, InstallError::CantInstall));
    }

    #[test]
    fn test_incompatible_versions_is_infeasible_without_retry() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let update = gemfile_update(&dir);
        let script = write_script(
            &dir,
            "install.sh",
            "echo 'Bundler could not find compatible versions for gem \"rails\"'\nexit 1",
        );
        let installer = BundlerInstaller::new().with_install_command(script);

        let mut ledger = FileLedger::new();
        let err = installer.install(&[update], &mut ledger).unwrap_err();
        assert!(matches!(err, InstallError::CantInstall));
    }

    #[test]
    fn test_unclassified_failure_surfaces_output() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let update = gemfile_update(&dir);
        let script = write_script(&dir, "install.sh", "echo 'segmentation fault'\nexit 2");
        let installer = BundlerInstaller::new().with_install_command(script);

        let mut ledger = FileLedger::new();
        let err = installer.install(&[update], &mut ledger).unwrap_err();
        match err {
            InstallError::CommandFailed { output, .. } => {
                assert!(output.contains("segmentation fault"));
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }
}
