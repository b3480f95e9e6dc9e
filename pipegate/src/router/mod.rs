//! The pipeline router: decides which pipeline variant to execute for a
//! trigger and starts that variant's execution with routing metadata
//! attached as execution-scoped variables.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::core::{PipelineVariant, RoutingDecision};
use crate::errors::PipegateError;
use crate::flags::{DecisionContext, FlagProvider, FLAG_PIPELINE_VERSION};
use crate::job::{JobDescriptor, OutputVariables};
use crate::orchestrator::{
    CompletionReporter, ExecutionVariable, JobCompletion, PipelineStarter, StartExecutionRequest,
};

/// Sentinel revision meaning "latest".
const LATEST_REVISION: &str = "HEAD";

/// Static table mapping each pipeline variant to a target pipeline name.
///
/// The mapping is exhaustive over the variant enum; unknown flag values
/// never reach it because they fail closed to `V1` at parse time.
#[derive(Debug, Clone)]
pub struct VariantTable {
    v1_name: String,
    v2_name: String,
}

impl VariantTable {
    /// Builds the table from configuration.
    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            v1_name: config.pipeline_v1_name.clone(),
            v2_name: config.pipeline_v2_name.clone(),
        }
    }

    /// Resolves a variant to its target pipeline name.
    #[must_use]
    pub fn resolve(&self, variant: PipelineVariant) -> &str {
        match variant {
            PipelineVariant::V1 => &self.v1_name,
            PipelineVariant::V2 => &self.v2_name,
        }
    }
}

/// Routes one pipeline trigger to a variant and starts its execution.
pub struct Router {
    flags: Arc<dyn FlagProvider>,
    starter: Arc<dyn PipelineStarter>,
    reporter: Arc<dyn CompletionReporter>,
    table: VariantTable,
}

impl Router {
    /// Creates a router over the shared provider, starter, and reporter.
    #[must_use]
    pub fn new(
        flags: Arc<dyn FlagProvider>,
        starter: Arc<dyn PipelineStarter>,
        reporter: Arc<dyn CompletionReporter>,
        table: VariantTable,
    ) -> Self {
        Self {
            flags,
            starter,
            reporter,
            table,
        }
    }

    /// Handles one routing invocation, resolving its completion callback
    /// exactly once whether routing succeeded or failed.
    ///
    /// # Errors
    ///
    /// Returns `Report` only if the completion callback itself fails.
    pub async fn handle(&self, job: &JobDescriptor) -> Result<(), PipegateError> {
        let completion = JobCompletion::new(self.reporter.clone(), &job.job_id);

        match self.route(job).await {
            Ok(decision) => {
                let variables = OutputVariables::new()
                    .with("app", decision.app_name)
                    .with("pipeline_version", decision.variant.to_string())
                    .with("pipeline_name", decision.target_name)
                    .with("execution_id", decision.execution_id);
                completion.succeed(variables).await
            }
            Err(err) => {
                warn!(job_id = %job.job_id, error = %err, "router invocation failed");
                completion.fail(&err.to_string()).await
            }
        }
    }

    /// Computes the routing decision and starts the selected pipeline.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` on malformed input and `StartFailed` if
    /// the orchestrator refuses the start request. No retry happens here.
    pub async fn route(&self, job: &JobDescriptor) -> Result<RoutingDecision, PipegateError> {
        let app_name = job.require_str("app_name")?;
        let revision = job.optional_str("revision").unwrap_or(LATEST_REVISION);

        info!(app = app_name, revision, "routing pipeline trigger");

        let context = DecisionContext::builder(app_name)
            .app_name(app_name)
            .build()?;

        if let Err(err) = self.flags.sync(&context).await {
            warn!(app = app_name, error = %err, "flag sync failed; evaluating degraded");
        }

        // Fail open to the stable variant.
        let value = self
            .flags
            .evaluate(
                FLAG_PIPELINE_VERSION,
                &context,
                serde_json::Value::String("v1".to_string()),
            )
            .await;
        let variant = PipelineVariant::from_flag_value(&value);
        let target_name = self.table.resolve(variant).to_string();

        info!(app = app_name, %variant, target = %target_name, "routing decision");

        let request = StartExecutionRequest {
            pipeline_name: target_name.clone(),
            variables: vec![
                ExecutionVariable::new("APP_NAME", app_name),
                ExecutionVariable::new("PIPELINE_VERSION", variant.to_string()),
            ],
            client_request_token: request_token(app_name),
        };

        let execution_id = self
            .starter
            .start_execution(request)
            .await
            .map_err(|e| PipegateError::StartFailed {
                pipeline_name: target_name.clone(),
                reason: e.to_string(),
            })?;

        info!(app = app_name, execution_id = %execution_id, "pipeline execution started");

        Ok(RoutingDecision {
            app_name: app_name.to_string(),
            variant,
            target_name,
            execution_id,
        })
    }
}

/// Builds the per-call client request token.
///
/// The random component is fresh per call, so a retried invocation starts
/// a distinct execution. Duplicate executions for one semantic trigger are
/// an accepted limitation of per-call tokens.
fn request_token(app_name: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{app_name}-{}", &nonce[..12])
}
