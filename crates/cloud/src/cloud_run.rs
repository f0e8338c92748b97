//! REST client for the Cloud Run Admin API v2 `jobs.run` call.
//!
//! `POST /v2/{job}:run` returns a long-running operation whose metadata is
//! the new execution. When configured to await the execution, the client
//! polls `GET /v2/{operation}` until the execution name shows up or the
//! operation is done, all within one overall timeout. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use golfrun_core::job::JobResource;
use serde::{Deserialize, Serialize};

use crate::error::CloudError;
use crate::runner::{JobRunner, RunOutcome};
use crate::token::AccessTokenProvider;

/// Public Cloud Run Admin API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://run.googleapis.com";

/// Timeout for a single HTTP round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Behaviour of [`CloudRunClient`].
#[derive(Debug, Clone)]
pub struct CloudRunConfig {
    /// API base URL without trailing path, e.g. `https://run.googleapis.com`.
    pub endpoint: String,
    /// Wait for the execution resource to exist before returning.
    pub await_execution: bool,
    /// Delay between operation polls while awaiting the execution.
    pub poll_interval: Duration,
    /// Upper bound for the whole `run_job` call, polling included.
    pub run_timeout: Duration,
}

impl Default for CloudRunConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            await_execution: true,
            poll_interval: Duration::from_millis(500),
            run_timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunJobRequest<'a> {
    overrides: Overrides<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Overrides<'a> {
    container_overrides: Vec<ContainerOverride<'a>>,
}

#[derive(Debug, Serialize)]
struct ContainerOverride<'a> {
    args: &'a [String],
}

/// The subset of `google.longrunning.Operation` this client reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    /// For `jobs.run` this is the `Execution` being created.
    #[serde(default)]
    pub metadata: Option<ResourceRef>,
    /// Populated once the operation is done successfully.
    #[serde(default)]
    pub response: Option<ResourceRef>,
    #[serde(default)]
    pub error: Option<OperationStatus>,
}

/// Any API resource, reduced to its name.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// `google.rpc.Status`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// Execution name from the response or, failing that, the metadata.
    pub fn execution_name(&self) -> Option<&str> {
        resource_name(self.response.as_ref()).or_else(|| resource_name(self.metadata.as_ref()))
    }

    fn check_error(&self) -> Result<(), CloudError> {
        match &self.error {
            Some(status) if status.code != 0 => Err(CloudError::Operation {
                operation: self.name.clone(),
                code: status.code,
                message: status.message.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Outcome once the execution is known or the operation is done;
    /// `None` while still waiting.
    pub fn settled(&self) -> Result<Option<RunOutcome>, CloudError> {
        self.check_error()?;
        if let Some(name) = self.execution_name() {
            return Ok(Some(RunOutcome::Execution {
                name: name.to_string(),
            }));
        }
        if self.done {
            return Ok(Some(RunOutcome::Pending {
                operation: self.name.clone(),
                execution: None,
            }));
        }
        Ok(None)
    }

    /// Outcome without waiting: whatever the first acknowledgment carries.
    pub fn acknowledged(&self) -> Result<RunOutcome, CloudError> {
        self.check_error()?;
        Ok(RunOutcome::Pending {
            operation: self.name.clone(),
            execution: self.execution_name().map(str::to_string),
        })
    }
}

fn resource_name(resource: Option<&ResourceRef>) -> Option<&str> {
    resource
        .and_then(|r| r.name.as_deref())
        .filter(|n| !n.is_empty())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Cloud Run Jobs client. Built once at startup and shared.
pub struct CloudRunClient {
    client: reqwest::Client,
    tokens: AccessTokenProvider,
    config: CloudRunConfig,
}

impl CloudRunClient {
    pub fn new(config: CloudRunConfig, tokens: AccessTokenProvider) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, config, tokens))
    }

    /// Build a client whose token provider shares the same HTTP client.
    ///
    /// A fixed `access_token` is used as-is; otherwise tokens come from the
    /// instance metadata server.
    pub fn from_config(
        config: CloudRunConfig,
        access_token: Option<String>,
    ) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let tokens = match access_token {
            Some(token) => AccessTokenProvider::fixed(token),
            None => AccessTokenProvider::metadata_server(client.clone()),
        };
        Ok(Self::with_client(client, config, tokens))
    }

    /// Reuse an existing [`reqwest::Client`] (e.g. the one backing the
    /// token provider).
    pub fn with_client(
        client: reqwest::Client,
        config: CloudRunConfig,
        tokens: AccessTokenProvider,
    ) -> Self {
        Self {
            client,
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &CloudRunConfig {
        &self.config
    }

    /// Issue `POST /v2/{job}:run` with the argument override.
    pub async fn start_run(
        &self,
        job: &JobResource,
        args: &[String],
    ) -> Result<Operation, CloudError> {
        let body = RunJobRequest {
            overrides: Overrides {
                container_overrides: vec![ContainerOverride { args }],
            },
        };
        let token = self.tokens.token().await?;

        let response = self
            .client
            .post(format!("{}/v2/{job}:run", self.base_url()))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    /// Issue `GET /v2/{operation}`.
    pub async fn get_operation(&self, name: &str) -> Result<Operation, CloudError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .get(format!("{}/v2/{name}", self.base_url()))
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    async fn run_and_resolve(
        &self,
        job: &JobResource,
        args: &[String],
    ) -> Result<RunOutcome, CloudError> {
        let mut operation = self.start_run(job, args).await?;
        tracing::info!(job = %job, operation = %operation.name, "Job run requested");

        if !self.config.await_execution {
            return operation.acknowledged();
        }

        loop {
            if let Some(outcome) = operation.settled()? {
                return Ok(outcome);
            }
            tracing::debug!(operation = %operation.name, "Waiting for execution to be created");
            tokio::time::sleep(self.config.poll_interval).await;
            operation = self.get_operation(&operation.name).await?;
        }
    }

    fn base_url(&self) -> &str {
        self.config.endpoint.trim_end_matches('/')
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`CloudError::Api`] with the status and
    /// body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CloudError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CloudError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_operation(response: reqwest::Response) -> Result<Operation, CloudError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| CloudError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl JobRunner for CloudRunClient {
    async fn run_job(&self, job: &JobResource, args: &[String]) -> Result<RunOutcome, CloudError> {
        let limit = self.config.run_timeout;
        tokio::time::timeout(limit, self.run_and_resolve(job, args))
            .await
            .map_err(|_| CloudError::Timeout(limit))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
