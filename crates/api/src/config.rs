use std::time::Duration;

use golfrun_cloud::cloud_run::DEFAULT_ENDPOINT;
use golfrun_cloud::CloudRunConfig;
use golfrun_core::error::CoreError;
use golfrun_core::job::{JobResource, DEFAULT_JOB_NAME, DEFAULT_REGION};

/// The job every dispatch targets.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// GCP project id. Required for dispatch but not for startup, so a
    /// misconfigured deployment still answers health checks.
    pub project_id: Option<String>,
    /// Region hosting the job (default: `asia-southeast1`).
    pub region: String,
    /// Registered job name (default: `golf-analyzer-job`).
    pub job_name: String,
}

impl JobConfig {
    /// Resolve the fully-qualified job resource, failing with a
    /// configuration error when the project id is missing.
    pub fn resource(&self) -> Result<JobResource, CoreError> {
        JobResource::from_config(self.project_id.as_deref(), &self.region, &self.job_name)
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for Cloud Run except `PROJECT_ID`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Target job.
    pub job: JobConfig,
    /// Bound on one outbound run call, polling included (default: `30`).
    pub run_timeout_secs: u64,
    /// Wait for the execution resource before answering (default: `true`).
    pub await_execution: bool,
    /// Cloud Run Admin API base URL.
    pub cloud_run_endpoint: String,
    /// Fixed OAuth access token; when unset the metadata server is used.
    pub access_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                      |
    /// |-----------------------------|------------------------------|
    /// | `HOST`                      | `0.0.0.0`                    |
    /// | `PORT`                      | `8080`                       |
    /// | `CORS_ORIGINS`              | (none)                       |
    /// | `REQUEST_TIMEOUT_SECS`      | `60`                         |
    /// | `PROJECT_ID`                | (none)                       |
    /// | `REGION`                    | `asia-southeast1`            |
    /// | `JOB_NAME`                  | `golf-analyzer-job`          |
    /// | `RUN_TIMEOUT_SECS`          | `30`                         |
    /// | `AWAIT_EXECUTION`           | `true`                       |
    /// | `CLOUD_RUN_ENDPOINT`        | `https://run.googleapis.com` |
    /// | `GOOGLE_OAUTH_ACCESS_TOKEN` | (none)                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let job = JobConfig {
            project_id: non_empty_var("PROJECT_ID"),
            region: non_empty_var("REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            job_name: non_empty_var("JOB_NAME").unwrap_or_else(|| DEFAULT_JOB_NAME.into()),
        };

        let run_timeout_secs: u64 = std::env::var("RUN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("RUN_TIMEOUT_SECS must be a valid u64");

        let await_execution = std::env::var("AWAIT_EXECUTION")
            .map(|v| parse_flag(&v).expect("AWAIT_EXECUTION must be true or false"))
            .unwrap_or(true);

        let cloud_run_endpoint =
            non_empty_var("CLOUD_RUN_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into());

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            job,
            run_timeout_secs,
            await_execution,
            cloud_run_endpoint,
            access_token: non_empty_var("GOOGLE_OAUTH_ACCESS_TOKEN"),
        };
        config
            .check_timeouts()
            .unwrap_or_else(|e| panic!("Invalid timeout configuration: {e}"));
        config
    }

    /// The request timeout must outlast the outbound run bound, otherwise
    /// a run the API already accepted is cut off before it is reported.
    pub fn check_timeouts(&self) -> Result<(), CoreError> {
        if self.request_timeout_secs <= self.run_timeout_secs {
            return Err(CoreError::Configuration(format!(
                "REQUEST_TIMEOUT_SECS ({}) must be greater than RUN_TIMEOUT_SECS ({})",
                self.request_timeout_secs, self.run_timeout_secs
            )));
        }
        Ok(())
    }

    /// Settings for the outbound Cloud Run client.
    pub fn cloud_run_config(&self) -> CloudRunConfig {
        CloudRunConfig {
            endpoint: self.cloud_run_endpoint.clone(),
            await_execution: self.await_execution,
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            ..CloudRunConfig::default()
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no` in any case.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn job_config_without_project_is_configuration_error() {
        let job = JobConfig {
            project_id: None,
            region: DEFAULT_REGION.into(),
            job_name: DEFAULT_JOB_NAME.into(),
        };
        assert!(matches!(job.resource(), Err(CoreError::Configuration(_))));
    }

    fn server_config(request_timeout_secs: u64, run_timeout_secs: u64) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs,
            job: JobConfig {
                project_id: Some("acme".into()),
                region: DEFAULT_REGION.into(),
                job_name: DEFAULT_JOB_NAME.into(),
            },
            run_timeout_secs,
            await_execution: true,
            cloud_run_endpoint: DEFAULT_ENDPOINT.into(),
            access_token: None,
        }
    }

    #[test]
    fn request_timeout_must_exceed_run_timeout() {
        assert!(server_config(60, 30).check_timeouts().is_ok());

        for (request, run) in [(30, 30), (10, 30)] {
            let err = server_config(request, run).check_timeouts().unwrap_err();
            let CoreError::Configuration(msg) = err else {
                panic!("{request}/{run} should be a configuration error");
            };
            assert!(msg.contains("RUN_TIMEOUT_SECS"), "{msg}");
        }
    }

    #[test]
    fn job_config_resolves_resource() {
        let job = JobConfig {
            project_id: Some("acme".into()),
            region: DEFAULT_REGION.into(),
            job_name: DEFAULT_JOB_NAME.into(),
        };
        assert_eq!(
            job.resource().unwrap().to_string(),
            "projects/acme/locations/asia-southeast1/jobs/golf-analyzer-job"
        );
    }
}
