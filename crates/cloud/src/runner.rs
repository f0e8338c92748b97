//! The job runner seam and the shape of its result.

use async_trait::async_trait;
use golfrun_core::job::JobResource;

use crate::error::CloudError;

/// What the execution service reported back for a single run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The execution resource exists; `name` is its full resource name.
    Execution { name: String },
    /// Only the operation was acknowledged. Its metadata may already carry
    /// the execution name.
    Pending {
        operation: String,
        execution: Option<String>,
    },
}

impl RunOutcome {
    /// The identifier reported to callers.
    ///
    /// Prefers the materialized execution, then the execution named in the
    /// operation metadata, then the operation name itself.
    pub fn execution_id(&self) -> &str {
        match self {
            RunOutcome::Execution { name } => name,
            RunOutcome::Pending {
                execution: Some(name),
                ..
            } => name,
            RunOutcome::Pending {
                operation,
                execution: None,
            } => operation,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, RunOutcome::Execution { .. })
    }
}

/// Triggers one execution of a registered job.
///
/// Implementations make exactly one run request per call and never retry.
/// A single instance is built at startup and shared across requests.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run `job` with `args` replacing the container's default arguments.
    async fn run_job(&self, job: &JobResource, args: &[String]) -> Result<RunOutcome, CloudError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_wins() {
        let outcome = RunOutcome::Execution {
            name: "projects/p/locations/r/jobs/j/executions/j-abc".into(),
        };
        assert_eq!(
            outcome.execution_id(),
            "projects/p/locations/r/jobs/j/executions/j-abc"
        );
        assert!(outcome.is_confirmed());
    }

    #[test]
    fn pending_prefers_metadata_execution() {
        let outcome = RunOutcome::Pending {
            operation: "projects/p/locations/r/operations/op-1".into(),
            execution: Some("projects/p/locations/r/jobs/j/executions/j-xyz".into()),
        };
        assert_eq!(
            outcome.execution_id(),
            "projects/p/locations/r/jobs/j/executions/j-xyz"
        );
        assert!(!outcome.is_confirmed());
    }

    #[test]
    fn pending_falls_back_to_operation() {
        let outcome = RunOutcome::Pending {
            operation: "projects/p/locations/r/operations/op-1".into(),
            execution: None,
        };
        assert_eq!(
            outcome.execution_id(),
            "projects/p/locations/r/operations/op-1"
        );
    }
}
