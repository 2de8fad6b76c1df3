//! Requirement installers, one per package ecosystem
//!
//! An installer applies a set of requirement (version-constraint) patches
//! to manifest files, then runs the ecosystem's install command. The
//! registry maps ecosystem names to installer implementations and is
//! injected into the orchestrator, so tests can swap implementations
//! without global state.

mod bundler;

pub use bundler::BundlerInstaller;

use crate::domain::{FileLedger, RequirementUpdate};
use crate::error::{ConfigError, FileError, InstallError};
use std::collections::BTreeMap;

/// Applies requirement patches and runs the ecosystem install step
pub trait Installer: Send + Sync {
    /// Ecosystem name this installer handles (e.g. "Rubygem")
    fn ecosystem(&self) -> &str;

    /// Apply all requirement updates, recording snapshots in the ledger
    fn install(
        &self,
        updates: &[RequirementUpdate],
        ledger: &mut FileLedger,
    ) -> Result<(), InstallError>;
}

/// Verify, snapshot and patch one requirement update's file
///
/// Aborts on the first fingerprint mismatch or patch failure; the pre-patch
/// snapshot recorded in the ledger is what rollback later restores. Common
/// to installers of every ecosystem.
pub fn patch_requirement(
    update: &RequirementUpdate,
    ledger: &mut FileLedger,
) -> Result<(), FileError> {
    let mut file = update.file.clone();
    file.check_sha()?;
    file.refresh()?;
    ledger.record_original(file.clone());
    println!("Patching {}", file.path);
    file.patch(&update.patch)?;
    ledger.record_updated(file);
    Ok(())
}

/// Ecosystem-name → installer table
pub struct InstallerRegistry {
    table: BTreeMap<String, Box<dyn Installer>>,
}

impl InstallerRegistry {
    /// Create a registry with no installers
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Create a registry with the stock installers
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(BundlerInstaller::new()));
        registry
    }

    /// Register an installer under its ecosystem name
    pub fn register(&mut self, installer: Box<dyn Installer>) {
        self.table
            .insert(installer.ecosystem().to_string(), installer);
    }

    /// Resolve an installer; unknown names are a configuration error
    pub fn get(&self, ecosystem: &str) -> Result<&dyn Installer, ConfigError> {
        self.table
            .get(ecosystem)
            .map(Box::as_ref)
            .ok_or_else(|| ConfigError::NoInstaller {
                ecosystem: ecosystem.to_string(),
            })
    }

    /// True when an installer is registered for the ecosystem
    pub fn contains(&self, ecosystem: &str) -> bool {
        self.table.contains_key(ecosystem)
    }

    /// Registered ecosystem names, sorted
    pub fn ecosystems(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }
}

impl Default for InstallerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
