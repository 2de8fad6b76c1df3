//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: Issues with CLI/environment/file configuration
//! - FileError: Dependency file IO, fingerprint and patch failures
//! - InstallError: Requirement installation failures
//! - UpdateError: Version update failures
//! - ApiError: Issues communicating with the monitoring service

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency file related errors
    #[error(transparent)]
    File(#[from] FileError),

    /// Requirement installation errors
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Version update errors
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// Monitoring service API errors
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Test suite command could not be run at all
    #[error("failed to run test suite `{command}`: {source}")]
    Testsuite {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// True when the error is a known negative outcome of an update attempt
    /// (infeasible update set), to be reported to the server as a failed
    /// attempt instead of aborting the run.
    pub fn is_update_set_failure(&self) -> bool {
        matches!(
            self,
            AppError::Install(InstallError::CantInstall) | AppError::Update(UpdateError::CantUpdate)
        )
    }
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No project slug given via flag, environment or config file
    #[error("project slug required: pass --project, set AUTOUP_PROJECT_SLUG or add project_slug to .autoup.toml")]
    MissingProjectSlug,

    /// No test suite command given via arguments or environment
    #[error("test suite required: pass it as arguments or set AUTOUP_TESTSUITE")]
    MissingTestSuite,

    /// Current revision could not be determined
    #[error("revision required: run inside a git repository or set AUTOUP_REVISION")]
    MissingRevision,

    /// Config file exists but cannot be parsed
    #[error("failed to parse config file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    /// No installer registered for a package type
    #[error("can't find installer for package type: {ecosystem}")]
    NoInstaller { ecosystem: String },

    /// No updater registered for a package type
    #[error("can't find updater for package type: {ecosystem}")]
    NoUpdater { ecosystem: String },
}

/// Errors related to dependency file operations
#[derive(Error, Debug)]
pub enum FileError {
    /// Failed to read a dependency file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a dependency file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// On-disk content does not match the expected fingerprint
    #[error("{path}: file signature doesn't match (expected: {expected}, got: {actual})")]
    ShaMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The external patch tool could not be started
    #[error("failed to run patch command: {source}")]
    PatchCommand {
        #[source]
        source: std::io::Error,
    },

    /// The external patch tool exited non-zero
    #[error("failed to patch {path}:\n{output}")]
    PatchFailed { path: PathBuf, output: String },

    /// One or more original files could not be restored
    #[error("failed to restore files: {}", failures.join("; "))]
    RestoreFailed { failures: Vec<String> },
}

/// Errors raised while installing requirement updates
#[derive(Error, Debug)]
pub enum InstallError {
    /// Generic failure signalling the update set can't be installed
    #[error("can't install requirements")]
    CantInstall,

    /// Install command exited non-zero with unclassified output
    #[error("install command `{command}` failed:\n{output}")]
    CommandFailed { command: String, output: String },

    /// Install command could not be spawned
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying dependency file failure (fingerprint or patch)
    #[error(transparent)]
    File(#[from] FileError),
}

/// Errors raised while applying version updates
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Generic failure signalling the update set versions can't be resolved
    #[error("can't update versions")]
    CantUpdate,

    /// Update command exited non-zero with unclassified output
    #[error("update command `{command}` failed:\n{output}")]
    CommandFailed { command: String, output: String },

    /// Update command could not be spawned
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying dependency file failure
    #[error(transparent)]
    File(#[from] FileError),
}

/// Errors related to monitoring service communication
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network request failed
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Server answered with a non-success status
    #[error("server error: {message} (status={status})")]
    Server { status: u16, message: String },

    /// Response body could not be decoded
    #[error("invalid response from server: {message}")]
    InvalidResponse { message: String },
}

impl FileError {
    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a new ShaMismatch error
    pub fn sha_mismatch(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        FileError::ShaMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl ApiError {
    /// Creates a new Network error
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new Server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ApiError::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        ApiError::InvalidResponse {
            message: message.into(),
        }
    }
}
