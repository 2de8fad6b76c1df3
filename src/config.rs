//! Configuration loading and environment handling
//!
//! Settings come from the project-local `.autoup.toml` file and from
//! environment variables; the environment always overrides the file. The
//! project slug additionally accepts an explicit CLI value, which beats
//! both.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Project-local config file name
pub const CONFIG_FILE_NAME: &str = ".autoup.toml";

/// Default API endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.autoup.dev/v1";

pub const ENV_API_ENDPOINT: &str = "AUTOUP_API_ENDPOINT";
pub const ENV_TOKEN: &str = "AUTOUP_TOKEN";
pub const ENV_PROJECT_SLUG: &str = "AUTOUP_PROJECT_SLUG";
pub const ENV_TESTSUITE: &str = "AUTOUP_TESTSUITE";
pub const ENV_REVISION: &str = "AUTOUP_REVISION";
pub const ENV_BRANCH: &str = "AUTOUP_BRANCH";
pub const ENV_BUNDLE_INSTALL_CMD: &str = "AUTOUP_BUNDLE_INSTALL_CMD";
pub const ENV_BUNDLE_UPDATE_CMD: &str = "AUTOUP_BUNDLE_UPDATE_CMD";

/// Shape of `.autoup.toml`
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api_endpoint: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    project_slug: Option<String>,
    #[serde(default)]
    testsuite: Option<String>,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API endpoint, with trailing slash trimmed
    pub api_endpoint: String,
    /// API token used for authentication
    pub api_key: String,
    /// Project slug from config file or environment (CLI flag beats both)
    pub project_slug: Option<String>,
    /// Test suite command from config file or environment
    pub testsuite: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            project_slug: None,
            testsuite: None,
        }
    }
}

impl Config {
    /// Load configuration from `dir`'s config file, then overlay environment
    ///
    /// A missing config file is not an error; a present but unparsable one
    /// is, so typos don't silently fall back to defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let path = dir.join(CONFIG_FILE_NAME);
        if let Ok(raw) = std::fs::read_to_string(&path) {
            let file: ConfigFile =
                toml::from_str(&raw).map_err(|e| ConfigError::InvalidConfigFile {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            if let Some(endpoint) = file.api_endpoint {
                config.api_endpoint = endpoint;
            }
            if let Some(key) = file.api_key {
                config.api_key = key;
            }
            config.project_slug = file.project_slug.filter(|s| !s.is_empty());
            config.testsuite = file.testsuite.filter(|s| !s.is_empty());
        }

        // Environment overrides the config file
        if let Some(endpoint) = env_nonempty(ENV_API_ENDPOINT) {
            config.api_endpoint = endpoint;
        }
        if let Some(key) = env_nonempty(ENV_TOKEN) {
            config.api_key = key;
        }
        if let Some(slug) = env_nonempty(ENV_PROJECT_SLUG) {
            config.project_slug = Some(slug);
        }
        if let Some(testsuite) = env_nonempty(ENV_TESTSUITE) {
            config.testsuite = Some(testsuite);
        }

        config.api_endpoint = config.api_endpoint.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Resolve the project slug: explicit value > environment > config file
    pub fn resolve_slug(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        if let Some(slug) = explicit.filter(|s| !s.is_empty()) {
            return Ok(slug.to_string());
        }
        self.project_slug
            .clone()
            .ok_or(ConfigError::MissingProjectSlug)
    }

    /// Resolve the test suite command: explicit arguments > environment/file
    pub fn resolve_testsuite(&self, args: &[String]) -> Result<String, ConfigError> {
        if !args.is_empty() {
            return Ok(args.join(" "));
        }
        self.testsuite.clone().ok_or(ConfigError::MissingTestSuite)
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Current commit sha, from AUTOUP_REVISION or `git rev-parse`
pub fn current_revision() -> Option<String> {
    env_nonempty(ENV_REVISION).or_else(|| git_output(&["rev-parse", "--verify", "HEAD"]))
}

/// Current branch name, from AUTOUP_BRANCH or `git rev-parse`
pub fn current_branch() -> Option<String> {
    env_nonempty(ENV_BRANCH).or_else(|| git_output(&["rev-parse", "--abbrev-ref", "HEAD"]))
}

/// Path of the config file under `dir`
pub fn config_file_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}
