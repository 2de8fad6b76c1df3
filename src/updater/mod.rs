//! Version updaters, one per package ecosystem
//!
//! An updater bumps resolved/locked versions by running the ecosystem's
//! update command against the target packages. Original lock files are
//! snapshotted into the ledger before any change so a failed attempt can be
//! rolled back; updated lock files are recorded afterwards for reporting.

mod bundler;

pub use bundler::BundlerUpdater;

use crate::domain::{FileLedger, VersionUpdate};
use crate::error::{ConfigError, UpdateError};
use std::collections::BTreeMap;

/// Applies version bumps and runs the ecosystem update step
pub trait Updater: Send + Sync {
    /// Ecosystem name this updater handles (e.g. "Rubygem")
    fn ecosystem(&self) -> &str;

    /// Apply all version updates, recording snapshots in the ledger
    fn update(
        &self,
        updates: &[VersionUpdate],
        ledger: &mut FileLedger,
    ) -> Result<(), UpdateError>;
}

/// Ecosystem-name → updater table
pub struct UpdaterRegistry {
    table: BTreeMap<String, Box<dyn Updater>>,
}

impl UpdaterRegistry {
    /// Create a registry with no updaters
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Create a registry with the stock updaters
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(BundlerUpdater::new()));
        registry
    }

    /// Register an updater under its ecosystem name
    pub fn register(&mut self, updater: Box<dyn Updater>) {
        self.table.insert(updater.ecosystem().to_string(), updater);
    }

    /// Resolve an updater; unknown names are a configuration error
    pub fn get(&self, ecosystem: &str) -> Result<&dyn Updater, ConfigError> {
        self.table
            .get(ecosystem)
            .map(Box::as_ref)
            .ok_or_else(|| ConfigError::NoUpdater {
                ecosystem: ecosystem.to_string(),
            })
    }

    /// True when an updater is registered for the ecosystem
    pub fn contains(&self, ecosystem: &str) -> bool {
        self.table.contains_key(ecosystem)
    }

    /// Registered ecosystem names, sorted
    pub fn ecosystems(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }
}

impl Default for UpdaterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopUpdater {
        name: &'static str,
    }

    impl Updater for NoopUpdater {
        fn ecosystem(&self) -> &str {
            self.name
        }

        fn update(
            &self,
            _updates: &[VersionUpdate],
            _ledger: &mut FileLedger,
        ) -> Result<(), UpdateError> {
            Ok(())
        }
    }

    #[test]
    fn test_defaults_cover_rubygem() {
        let registry = UpdaterRegistry::with_defaults();
        assert!(registry.contains("Rubygem"));
        assert!(registry.get("Rubygem").is_ok());
    }

    #[test]
    fn test_unknown_ecosystem_is_config_error() {
        let registry = UpdaterRegistry::with_defaults();
        let err = registry.get("Packagist").err().unwrap();
        assert!(matches!(err, ConfigError::NoUpdater { .. }));
        assert!(format!("{}", err).contains("Packagist"));
    }

    #[test]
    fn test_register_custom_updater() {
        let mut registry = UpdaterRegistry::empty();
        registry.register(Box::new(NoopUpdater {
            name: "fakePackage",
        }));
        assert!(registry.contains("fakePackage"));
        assert_eq!(registry.ecosystems(), vec!["fakePackage"]);
    }
}
