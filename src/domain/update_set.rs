//! Server-proposed update sets and their results
//!
//! An update set bundles requirement (version-constraint) patches and
//! version bumps across one or more ecosystems, keyed by ecosystem name.
//! The maps are BTreeMaps so iteration order is deterministic regardless of
//! the order the server emitted the keys in.

use super::{DependencyFile, Package};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single requirement (version-constraint) change for one file
///
/// `file` identifies the pre-patch expected state (path + fingerprint, no
/// content); `patch` is the unified diff transforming it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementUpdate {
    pub file: DependencyFile,
    pub patch: String,
}

/// A single resolved-version bump for one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionUpdate {
    #[serde(rename = "Package")]
    pub package: Package,
    pub old_version: String,
    pub target_version: String,
}

/// A server-proposed bundle of changes, tied to a project revision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSet {
    pub id: u64,

    #[serde(default)]
    pub requirement_updates: BTreeMap<String, Vec<RequirementUpdate>>,

    #[serde(default)]
    pub version_updates: BTreeMap<String, Vec<VersionUpdate>>,
}

impl UpdateSet {
    /// Sorted union of the ecosystem names appearing in either map
    pub fn ecosystems(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .requirement_updates
            .keys()
            .chain(self.version_updates.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// True when the set carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.requirement_updates.values().all(Vec::is_empty)
            && self.version_updates.values().all(Vec::is_empty)
    }

    /// Total number of individual changes in the set
    pub fn change_count(&self) -> usize {
        let reqs: usize = self.requirement_updates.values().map(Vec::len).sum();
        let vers: usize = self.version_updates.values().map(Vec::len).sum();
        reqs + vers
    }
}

/// Outcome of testing an update set against the local tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateState {
    /// Test suite passed against the patched tree
    Success,
    /// Update could not be applied or the test suite failed
    Failed,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateState::Success => write!(f, "success"),
            UpdateState::Failed => write!(f, "failed"),
        }
    }
}

/// Result pushed back to the server after one update set attempt
///
/// `dependency_files` holds the final patched file set, only populated on
/// success; the id and slug address the server resource and are not part of
/// the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSetResult {
    #[serde(skip)]
    pub update_set_id: u64,

    #[serde(skip)]
    pub project_slug: String,

    pub state: UpdateState,

    pub dependency_files: Vec<DependencyFile>,
}

impl UpdateSetResult {
    /// Build a success result carrying the patched files
    pub fn success(
        update_set_id: u64,
        project_slug: impl Into<String>,
        dependency_files: Vec<DependencyFile>,
    ) -> Self {
        Self {
            update_set_id,
            project_slug: project_slug.into(),
            state: UpdateState::Success,
            dependency_files,
        }
    }

    /// Build a failed result (no files reported)
    pub fn failed(update_set_id: u64, project_slug: impl Into<String>) -> Self {
        Self {
            update_set_id,
            project_slug: project_slug.into(),
            state: UpdateState::Failed,
            dependency_files: Vec::new(),
        }
    }
}
