//! Collaborator ports on the orchestrator: the completion callback every
//! invocation must resolve through exactly once, and the pipeline-start
//! API the router drives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::errors::PipegateError;
use crate::job::OutputVariables;

/// Transport-level failure talking to the orchestrator.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OrchestratorError {
    /// The error message.
    pub message: String,
}

impl OrchestratorError {
    /// Creates a new orchestrator error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The orchestrator's success/failure callback surface.
///
/// This is the single completion signal the orchestrator has: an
/// invocation that never calls it leaves the stage hung, and one that
/// calls it twice leaves the stage in an undefined state. Use
/// [`JobCompletion`] to make both impossible at the type level.
#[async_trait]
pub trait CompletionReporter: Send + Sync {
    /// Reports the job as succeeded, handing back its output variables.
    async fn report_success(
        &self,
        job_id: &str,
        variables: OutputVariables,
    ) -> Result<(), OrchestratorError>;

    /// Reports the job as failed with a human-readable message.
    async fn report_failure(&self, job_id: &str, message: &str) -> Result<(), OrchestratorError>;
}

/// A single execution-scoped variable attached at pipeline start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionVariable {
    /// Variable name as downstream stages interpolate it.
    pub name: String,
    /// Variable value.
    pub value: String,
}

impl ExecutionVariable {
    /// Creates a new execution variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A request to start one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartExecutionRequest {
    /// The target pipeline definition to start.
    pub pipeline_name: String,
    /// Execution-scoped variables visible to every downstream stage.
    pub variables: Vec<ExecutionVariable>,
    /// Per-call idempotency token. Tokens are per-call, not per-semantic-
    /// intent, so a retried start can produce a duplicate execution.
    pub client_request_token: String,
}

/// The orchestrator's start-execution API.
#[async_trait]
pub trait PipelineStarter: Send + Sync {
    /// Starts an execution of the named pipeline, returning its id.
    async fn start_execution(
        &self,
        request: StartExecutionRequest,
    ) -> Result<String, OrchestratorError>;
}

/// Move-only handle binding one invocation to its terminal report.
///
/// `succeed` and `fail` consume the handle, so a second report does not
/// compile. Handlers construct exactly one per invocation and resolve it
/// on every branch — skip, execute, or error.
pub struct JobCompletion {
    reporter: Arc<dyn CompletionReporter>,
    job_id: String,
}

impl std::fmt::Debug for JobCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCompletion")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

impl JobCompletion {
    /// Binds a reporter to one job id.
    #[must_use]
    pub fn new(reporter: Arc<dyn CompletionReporter>, job_id: impl Into<String>) -> Self {
        Self {
            reporter,
            job_id: job_id.into(),
        }
    }

    /// Returns the job id this handle reports for.
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Reports success with the invocation's output variables.
    ///
    /// # Errors
    ///
    /// Returns `Report` if the callback transport fails. The handle is
    /// consumed either way; no second attempt is made.
    pub async fn succeed(self, variables: OutputVariables) -> Result<(), PipegateError> {
        self.reporter
            .report_success(&self.job_id, variables)
            .await
            .map_err(|e| PipegateError::Report {
                job_id: self.job_id,
                reason: e.to_string(),
            })
    }

    /// Reports failure with a terminal message.
    ///
    /// # Errors
    ///
    /// Returns `Report` if the callback transport fails.
    pub async fn fail(self, message: &str) -> Result<(), PipegateError> {
        self.reporter
            .report_failure(&self.job_id, message)
            .await
            .map_err(|e| PipegateError::Report {
                job_id: self.job_id,
                reason: e.to_string(),
            })
    }
}
