//! Accumulator for files touched during one update attempt
//!
//! Originals are snapshots taken before any change, kept for restoration;
//! updated files carry the post-change content reported to the server on
//! success. The orchestrator owns one ledger per attempt and hands it to
//! installers/updaters as an explicit &mut borrow, so a failure partway
//! through still leaves every snapshot reachable for rollback.

use super::DependencyFile;
use crate::error::FileError;

/// Pre/post-change file bookkeeping for one update attempt
#[derive(Debug, Default)]
pub struct FileLedger {
    originals: Vec<DependencyFile>,
    updated: Vec<DependencyFile>,
}

impl FileLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pre-change snapshot (content as it was on disk)
    pub fn record_original(&mut self, file: DependencyFile) {
        self.originals.push(file);
    }

    /// Record a post-change file (content after patch/update)
    pub fn record_updated(&mut self, file: DependencyFile) {
        self.updated.push(file);
    }

    /// Snapshots taken so far, in recording order
    pub fn originals(&self) -> &[DependencyFile] {
        &self.originals
    }

    /// Updated files recorded so far, in recording order
    pub fn updated(&self) -> &[DependencyFile] {
        &self.updated
    }

    /// True when no file has been touched yet
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty() && self.updated.is_empty()
    }

    /// Consume the ledger, keeping only the updated file set
    pub fn into_updated(self) -> Vec<DependencyFile> {
        self.updated
    }

    /// Write every recorded original back to disk
    ///
    /// Best-effort: a failed write never stops the remaining restores, since
    /// leaving the tree half-patched is strictly worse. All failures are
    /// collected into a single error.
    pub fn restore_originals(&self) -> Result<(), FileError> {
        let mut failures = Vec::new();
        for file in &self.originals {
            if let Err(e) = file.write() {
                failures.push(format!("{}: {}", file.path, e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FileError::RestoreFailed { failures })
        }
    }
}
