//! The stage worker: consumes a previously-computed gate decision and
//! either no-ops or performs the stage's placeholder work.
//!
//! Runs as the second action of a gated stage (after the gate evaluator)
//! or as the sole action of a non-gated stage, in which case no
//! `gate_decision` parameter arrives and the worker always executes.

mod work;

pub use work::{WorkProfile, WorkTarget};

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::{GateDecision, StageWorkResult};
use crate::errors::PipegateError;
use crate::job::{JobDescriptor, OutputVariables};
use crate::orchestrator::{CompletionReporter, JobCompletion};

/// Sentinel echoed when a parameter was not interpolated.
const UNKNOWN: &str = "?";

/// Per-invocation worker state.
///
/// The only legal paths are `Received → Skipped` and
/// `Received → Executing → Completed`. There is no retry-in-place: a
/// failed execution surfaces as one terminal failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Invocation received, gate decision not yet applied.
    Received,
    /// Placeholder work is running.
    Executing,
    /// Terminal: the gate decision was skip.
    Skipped,
    /// Terminal: the work ran to completion.
    Completed,
}

impl WorkerState {
    /// Returns true if `next` is a legal successor of this state.
    #[must_use]
    pub fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Skipped)
                | (Self::Received, Self::Executing)
                | (Self::Executing, Self::Completed)
        )
    }

    /// Returns true if this state is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Completed)
    }
}

/// Executes (or skips) the work of one pipeline stage.
pub struct StageWorker {
    reporter: Arc<dyn CompletionReporter>,
}

impl StageWorker {
    /// Creates a stage worker over the shared reporter.
    #[must_use]
    pub fn new(reporter: Arc<dyn CompletionReporter>) -> Self {
        Self { reporter }
    }

    /// Handles one worker invocation, resolving its completion callback
    /// exactly once on the skip, execute, and malformed-input paths.
    ///
    /// # Errors
    ///
    /// Returns `Report` only if the completion callback itself fails.
    pub async fn handle(&self, job: &JobDescriptor) -> Result<(), PipegateError> {
        let completion = JobCompletion::new(self.reporter.clone(), &job.job_id);

        match self.run(job).await {
            Ok(variables) => completion.succeed(variables).await,
            Err(err) => {
                warn!(job_id = %job.job_id, error = %err, "worker invocation failed");
                completion.fail(&err.to_string()).await
            }
        }
    }

    /// Applies the gate decision and performs the stage work if required.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if `stage_name` is absent and
    /// `InvalidParameter` if a present `gate_decision` is neither
    /// `proceed` nor `skip` — a corrupted decision is never defaulted.
    pub async fn run(&self, job: &JobDescriptor) -> Result<OutputVariables, PipegateError> {
        let stage_name = job.require_str("stage_name")?;
        let app_name = job.optional_str("app_name").unwrap_or(UNKNOWN);
        let pipeline_version = job.optional_str("pipeline_version").unwrap_or(UNKNOWN);

        // Absent means the stage is not gated and always executes.
        let decision = match job.optional_str("gate_decision") {
            Some(raw) => raw.parse::<GateDecision>()?,
            None => GateDecision::Proceed,
        };

        let state = WorkerState::Received;
        let started_at = chrono::Utc::now();

        if decision == GateDecision::Skip {
            debug_assert!(state.allows(WorkerState::Skipped));
            info!(
                stage = stage_name,
                app = app_name,
                pipeline = pipeline_version,
                "stage skipped by gate"
            );
            let result = StageWorkResult::skipped(stage_name, started_at);
            return Ok(Self::variables(&result, pipeline_version));
        }

        debug_assert!(state.allows(WorkerState::Executing));
        info!(
            stage = stage_name,
            app = app_name,
            pipeline = pipeline_version,
            "stage executing"
        );

        let result = execute_work(stage_name, started_at).await;
        debug_assert!(WorkerState::Executing.allows(WorkerState::Completed));

        Ok(Self::variables(&result, pipeline_version))
    }

    fn variables(result: &StageWorkResult, pipeline_version: &str) -> OutputVariables {
        let mut variables = OutputVariables::new()
            .with("gate_result", result.status.to_string())
            .with("stage_name", result.stage.clone())
            .with("pipeline_version", pipeline_version);
        if let Some(tool) = &result.tool {
            variables.set("tool", tool.clone());
        }
        if let Some(outcome) = &result.outcome {
            variables.set("result", outcome.clone());
        }
        variables
    }
}

/// Runs the placeholder work for a stage and produces its terminal result.
///
/// Real tool integrations would live behind this seam; here each profile
/// logs what its tool would produce and simulates a short duration.
async fn execute_work(stage_name: &str, started_at: chrono::DateTime<chrono::Utc>) -> StageWorkResult {
    let profile = WorkProfile::for_target(&WorkTarget::parse(stage_name));

    info!(tool = %profile.tool, "{}", profile.action);
    tokio::time::sleep(Duration::from_millis(profile.duration_ms)).await;
    info!(tool = %profile.tool, "{}", profile.outcome);

    StageWorkResult::executed(stage_name, profile.tool, profile.outcome, started_at)
}
