//! Fully-qualified job resource names.

use std::fmt;

use crate::error::CoreError;

/// Default region when `REGION` is not configured.
pub const DEFAULT_REGION: &str = "asia-southeast1";

/// Default job name when `JOB_NAME` is not configured.
pub const DEFAULT_JOB_NAME: &str = "golf-analyzer-job";

/// A pre-registered job definition addressed by project, region and name.
///
/// Renders as `projects/{project}/locations/{region}/jobs/{job}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResource {
    pub project: String,
    pub region: String,
    pub job: String,
}

impl JobResource {
    /// Build a resource name from deployment configuration.
    ///
    /// A missing or blank project id is a configuration error; the region
    /// and job name always have defaults upstream so they are only checked
    /// for blankness.
    pub fn from_config(
        project: Option<&str>,
        region: &str,
        job: &str,
    ) -> Result<Self, CoreError> {
        let project = project
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::Configuration("PROJECT_ID missing".to_string()))?;

        if region.trim().is_empty() {
            return Err(CoreError::Configuration("REGION is empty".to_string()));
        }
        if job.trim().is_empty() {
            return Err(CoreError::Configuration("JOB_NAME is empty".to_string()));
        }

        Ok(Self {
            project: project.to_string(),
            region: region.trim().to_string(),
            job: job.trim().to_string(),
        })
    }
}

impl fmt::Display for JobResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/jobs/{}",
            self.project, self.region, self.job
        )
    }
}
