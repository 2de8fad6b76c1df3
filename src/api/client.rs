//! HTTP implementation of the monitoring service API
//!
//! Requests authenticate with basic auth ("x" + API token) and carry the
//! client version, revision and branch as headers. Transient failures
//! (network errors, 429) are retried with exponential backoff.

use super::{MonitorApi, PushedFiles};
use crate::domain::{DependencyFile, Project, UpdateSet, UpdateSetResult};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("autoup/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// Error body shape for non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// reqwest-backed monitoring service client
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: String,
    key: String,
    revision: String,
    branch: String,
}

impl HttpApi {
    /// Create a client against `endpoint` authenticating with `key`
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| ApiError::network("client", e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            revision: String::new(),
            branch: String::new(),
        })
    }

    /// Attach revision/branch context sent as request headers
    pub fn with_context(mut self, revision: impl Into<String>, branch: impl Into<String>) -> Self {
        self.revision = revision.into();
        self.branch = branch.into();
        self
    }

    /// Endpoint the client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, uri: &str) -> String {
        format!("{}{}", self.endpoint, uri)
    }

    fn request(&self, method: Method, uri: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(uri))
            .basic_auth("x", Some(&self.key))
            .header("X-Client-Version", env!("CARGO_PKG_VERSION"));
        if !self.revision.is_empty() {
            builder = builder.header("X-Revision", &self.revision);
        }
        if !self.branch.is_empty() {
            builder = builder.header("X-Branch", &self.branch);
        }
        builder
    }

    /// Send with retries on network errors and 429 responses
    async fn send(&self, builder: RequestBuilder, uri: &str) -> Result<Response, ApiError> {
        let mut delay = BASE_DELAY_MS;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let Some(cloned) = builder.try_clone() else {
                // Non-clonable request body: single attempt
                return builder
                    .send()
                    .await
                    .map_err(|e| ApiError::network(self.url(uri), e.to_string()));
            };

            match cloned.send().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS
                        && attempt < MAX_RETRIES
                    {
                        last_error = Some(ApiError::server(429, "rate limited"));
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(ApiError::network(self.url(uri), e.to_string()));
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::network(self.url(uri), "unknown error".to_string())))
    }

    /// Surface a non-success response as a server error with its message
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        };
        Err(ApiError::server(status.as_u16(), message))
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl MonitorApi for HttpApi {
    async fn best_update_files(
        &self,
        project_slug: &str,
        revision: &str,
    ) -> Result<Vec<DependencyFile>, ApiError> {
        let uri = format!(
            "/projects/{}/revisions/{}/auto_update_steps/best",
            project_slug, revision
        );
        let response = self.send(self.request(Method::GET, &uri), &uri).await?;
        let response = Self::check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        Self::decode(response).await
    }

    async fn next_update_set(
        &self,
        project_slug: &str,
        revision: &str,
    ) -> Result<Option<UpdateSet>, ApiError> {
        let uri = format!(
            "/projects/{}/revisions/{}/auto_update_steps/next",
            project_slug, revision
        );
        let response = self.send(self.request(Method::POST, &uri), &uri).await?;

        // No candidate left is a normal end-of-run signal, not an error
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let set: UpdateSet = Self::decode(response).await?;
        if set.id == 0 {
            return Ok(None);
        }
        Ok(Some(set))
    }

    async fn push_update_result(
        &self,
        revision: &str,
        result: &UpdateSetResult,
    ) -> Result<(), ApiError> {
        let uri = format!(
            "/projects/{}/revisions/{}/auto_update_steps/{}",
            result.project_slug, revision, result.update_set_id
        );
        let builder = self.request(Method::PATCH, &uri).json(result);
        let response = self.send(builder, &uri).await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn fetch_project(&self, slug: &str) -> Result<Project, ApiError> {
        let uri = format!("/projects/{}", slug);
        let response = self.send(self.request(Method::GET, &uri), &uri).await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn push_dependency_files(
        &self,
        project_slug: &str,
        files: &[DependencyFile],
    ) -> Result<PushedFiles, ApiError> {
        let uri = format!("/projects/{}/dependency_files", project_slug);
        let builder = self.request(Method::POST, &uri).json(files);
        let response = self.send(builder, &uri).await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }
}
