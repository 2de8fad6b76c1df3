//! Core domain models for autoup
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency file representation with content fingerprinting
//! - Package identity and project metadata
//! - Server-proposed update sets and attempt results
//! - The file ledger tracking pre/post-change snapshots for rollback

mod dependency_file;
mod ledger;
mod package;
mod project;
mod update_set;

pub use dependency_file::{content_sha1, file_sha1, DependencyFile};
pub use ledger::FileLedger;
pub use package::Package;
pub use project::Project;
pub use update_set::{RequirementUpdate, UpdateSet, UpdateSetResult, UpdateState, VersionUpdate};
