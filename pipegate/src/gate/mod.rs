//! The gate evaluator: computes the proceed/skip decision for one gated
//! stage and emits it as an output variable for the stage worker to
//! consume.
//!
//! Runs as the first action of a gated stage. The decision is derived
//! data: the worker receives it verbatim and never recomputes it.

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{GateDecision, RequiredStages, StageName};
use crate::errors::PipegateError;
use crate::flags::{DecisionContext, FlagProvider, FLAG_REQUIRED_STAGES};
use crate::job::{JobDescriptor, OutputVariables};
use crate::orchestrator::{CompletionReporter, JobCompletion};

/// Sentinel echoed when the invocation carries no pipeline version.
const UNKNOWN_VERSION: &str = "?";

/// Computes the proceed/skip decision for one stage.
pub struct GateEvaluator {
    flags: Arc<dyn FlagProvider>,
    reporter: Arc<dyn CompletionReporter>,
}

impl GateEvaluator {
    /// Creates a gate evaluator over the shared provider and reporter.
    #[must_use]
    pub fn new(flags: Arc<dyn FlagProvider>, reporter: Arc<dyn CompletionReporter>) -> Self {
        Self { flags, reporter }
    }

    /// Handles one gate invocation, resolving its completion callback
    /// exactly once on both the decision and the malformed-input path.
    ///
    /// # Errors
    ///
    /// Returns `Report` only if the completion callback itself fails;
    /// evaluation errors are reported as failed completions, not
    /// propagated.
    pub async fn handle(&self, job: &JobDescriptor) -> Result<(), PipegateError> {
        let completion = JobCompletion::new(self.reporter.clone(), &job.job_id);

        match self.evaluate(job).await {
            Ok(variables) => completion.succeed(variables).await,
            Err(err) => {
                warn!(job_id = %job.job_id, error = %err, "gate invocation failed");
                completion.fail(&err.to_string()).await
            }
        }
    }

    /// Evaluates the gate for one job, returning the output variables.
    ///
    /// Pure given a flag snapshot: the same (app, stage, flag state)
    /// always yields the same decision.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter`/`InvalidParameter` on malformed input.
    pub async fn evaluate(&self, job: &JobDescriptor) -> Result<OutputVariables, PipegateError> {
        let stage_name: StageName = job.require_str("stage_name")?.parse()?;
        let app_name = job.require_str("app_name")?;
        let pipeline_version = job.optional_str("pipeline_version").unwrap_or(UNKNOWN_VERSION);

        let context = DecisionContext::builder(app_name)
            .app_name(app_name)
            .stage_name(stage_name.as_str())
            .pipeline_version(pipeline_version)
            .build()?;

        // A warm process may hold stale targeting rules from a previous
        // invocation, so freshness is forced every time.
        if let Err(err) = self.flags.sync(&context).await {
            warn!(app = app_name, error = %err, "flag sync failed; evaluating degraded");
        }

        let fail_open = serde_json::to_value(RequiredStages::all())?;
        let value = self
            .flags
            .evaluate(FLAG_REQUIRED_STAGES, &context, fail_open)
            .await;
        let required = RequiredStages::from_flag_value(&value, RequiredStages::all());

        let decision = if required.contains(stage_name) {
            GateDecision::Proceed
        } else {
            GateDecision::Skip
        };
        info!(
            stage = %stage_name,
            app = app_name,
            pipeline = pipeline_version,
            %decision,
            "gate decision"
        );

        Ok(OutputVariables::new()
            .with("gate_decision", decision.to_string())
            .with("stage_name", stage_name.as_str())
            .with("pipeline_version", pipeline_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryFlagProvider, RecordingReporter};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gate_job(stage: &str) -> JobDescriptor {
        JobDescriptor::new("gate-job")
            .with_parameter("stage_name", stage)
            .with_parameter("app_name", "drug-research-portal")
            .with_parameter("pipeline_version", "v1")
    }

    fn evaluator(
        flags: Arc<InMemoryFlagProvider>,
        reporter: Arc<RecordingReporter>,
    ) -> GateEvaluator {
        GateEvaluator::new(flags, reporter)
    }

    #[tokio::test]
    async fn test_ungated_stage_is_skipped() {
        let flags = Arc::new(InMemoryFlagProvider::new().with_flag(
            FLAG_REQUIRED_STAGES,
            json!(["source", "build", "deploy"]),
        ));
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter.clone());

        gate.handle(&gate_job("sast")).await.unwrap();

        let vars = reporter.last_success("gate-job").unwrap();
        assert_eq!(vars.get("gate_decision"), Some("skip"));
        assert_eq!(vars.get("stage_name"), Some("sast"));
        assert_eq!(vars.get("pipeline_version"), Some("v1"));
    }

    #[tokio::test]
    async fn test_required_stage_proceeds() {
        let flags = Arc::new(InMemoryFlagProvider::new().with_flag(
            FLAG_REQUIRED_STAGES,
            json!(["source", "build", "deploy"]),
        ));
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter.clone());

        gate.handle(&gate_job("build")).await.unwrap();

        let vars = reporter.last_success("gate-job").unwrap();
        assert_eq!(vars.get("gate_decision"), Some("proceed"));
    }

    #[tokio::test]
    async fn test_unset_flag_fails_open_to_all_required() {
        let flags = Arc::new(InMemoryFlagProvider::new());
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter.clone());

        gate.handle(&gate_job("sca")).await.unwrap();

        let vars = reporter.last_success("gate-job").unwrap();
        assert_eq!(vars.get("gate_decision"), Some("proceed"));
    }

    #[tokio::test]
    async fn test_missing_stage_name_reports_failure() {
        let flags = Arc::new(InMemoryFlagProvider::new());
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter.clone());

        let job = JobDescriptor::new("gate-job").with_parameter("app_name", "portal");
        gate.handle(&job).await.unwrap();

        assert_eq!(reporter.success_count("gate-job"), 0);
        assert_eq!(reporter.failure_count("gate-job"), 1);
    }

    #[tokio::test]
    async fn test_unknown_stage_name_reports_failure() {
        let flags = Arc::new(InMemoryFlagProvider::new());
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter.clone());

        gate.handle(&gate_job("canary-bake")).await.unwrap();

        assert_eq!(reporter.failure_count("gate-job"), 1);
    }

    #[tokio::test]
    async fn test_sync_is_forced_per_invocation() {
        let flags = Arc::new(InMemoryFlagProvider::new());
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags.clone(), reporter);

        gate.handle(&gate_job("build")).await.unwrap();
        gate.handle(&gate_job("deploy")).await.unwrap();

        assert_eq!(flags.sync_count(), 2);
    }

    #[tokio::test]
    async fn test_decision_is_deterministic_for_fixed_snapshot() {
        let flags = Arc::new(
            InMemoryFlagProvider::new()
                .with_flag(FLAG_REQUIRED_STAGES, json!(["unit-test", "deploy"])),
        );
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter);

        let first = gate.evaluate(&gate_job("unit-test")).await.unwrap();
        let second = gate.evaluate(&gate_job("unit-test")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get("gate_decision"), Some("proceed"));
    }

    #[tokio::test]
    async fn test_closed_mapping_is_total() {
        let flags = Arc::new(
            InMemoryFlagProvider::new().with_flag(FLAG_REQUIRED_STAGES, json!(["build"])),
        );
        let reporter = Arc::new(RecordingReporter::new());
        let gate = evaluator(flags, reporter);

        for stage in StageName::ALL {
            let vars = gate.evaluate(&gate_job(stage.as_str())).await.unwrap();
            let decision = vars.get("gate_decision").unwrap();
            assert!(decision == "proceed" || decision == "skip");
        }
    }
}
