//! Monitoring service API surface
//!
//! The orchestrator consumes the service through the `MonitorApi` trait so
//! tests can substitute a scripted client; `HttpApi` is the real reqwest
//! implementation.

mod client;

pub use client::HttpApi;

use crate::domain::{DependencyFile, Project, UpdateSet, UpdateSetResult};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::Deserialize;

/// Buckets returned when pushing local dependency files
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushedFiles {
    #[serde(default)]
    pub added: Vec<DependencyFile>,
    #[serde(default)]
    pub updated: Vec<DependencyFile>,
    #[serde(default)]
    pub unchanged: Vec<DependencyFile>,
    #[serde(default)]
    pub unsupported: Vec<DependencyFile>,
}

/// Typed remote calls against the monitoring service
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// Best known update file set for a project revision (full contents)
    async fn best_update_files(
        &self,
        project_slug: &str,
        revision: &str,
    ) -> Result<Vec<DependencyFile>, ApiError>;

    /// Next candidate update set to test; None when the server has no more
    async fn next_update_set(
        &self,
        project_slug: &str,
        revision: &str,
    ) -> Result<Option<UpdateSet>, ApiError>;

    /// Report the outcome of one update set attempt
    async fn push_update_result(
        &self,
        revision: &str,
        result: &UpdateSetResult,
    ) -> Result<(), ApiError>;

    /// Fetch a project by slug
    async fn fetch_project(&self, slug: &str) -> Result<Project, ApiError>;

    /// Push local dependency files for a project
    async fn push_dependency_files(
        &self,
        project_slug: &str,
        files: &[DependencyFile],
    ) -> Result<PushedFiles, ApiError>;
}
