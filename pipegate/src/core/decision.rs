//! Gate and routing decision types, and the terminal stage work result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PipegateError;

/// The proceed/skip verdict for one pipeline stage in one execution.
///
/// Produced once by the gate evaluator and transported verbatim to the
/// stage worker through the orchestrator's variable store. Parsing is
/// strict: anything other than `proceed` or `skip` fails loudly instead of
/// silently defaulting, since a corrupted decision in the variable channel
/// must never be mistaken for a real verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    /// The stage is required and its work must run.
    Proceed,
    /// The stage is not required; the worker no-ops.
    Skip,
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for GateDecision {
    type Err = PipegateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proceed" => Ok(Self::Proceed),
            "skip" => Ok(Self::Skip),
            other => Err(PipegateError::invalid_parameter(
                "gate_decision",
                other,
                "proceed or skip",
            )),
        }
    }
}

/// Which pipeline variant (target definition) to execute for a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVariant {
    /// The stable pipeline definition.
    V1,
    /// The patched pipeline definition.
    V2,
}

impl PipelineVariant {
    /// Resolves a flag value to a variant, failing closed to `V1`.
    ///
    /// An unknown or non-string flag value must never start an undefined
    /// target, so anything unrecognized maps to the stable variant.
    #[must_use]
    pub fn from_flag_value(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some("v1") => Self::V1,
            Some("v2") => Self::V2,
            other => {
                tracing::warn!(?other, "unknown pipeline-version value; failing closed to v1");
                Self::V1
            }
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

impl Default for PipelineVariant {
    fn default() -> Self {
        Self::V1
    }
}

/// The routing verdict for one pipeline trigger.
///
/// Immutable for the lifetime of the execution it started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The application the trigger was for.
    pub app_name: String,
    /// The selected pipeline variant.
    pub variant: PipelineVariant,
    /// The resolved target pipeline name.
    pub target_name: String,
    /// The execution id returned by the orchestrator.
    pub execution_id: String,
}

/// Whether a stage's work actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    /// The placeholder work ran to completion.
    Executed,
    /// The gate decision was skip; no work ran.
    Skipped,
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed => write!(f, "executed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Terminal result of one stage worker invocation.
///
/// Write-once: emitting it completes the invocation, and reporting an
/// outcome twice is a protocol violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageWorkResult {
    /// The stage name as received (may be outside the closed enumeration).
    pub stage: String,
    /// Whether the work ran or was skipped.
    pub status: WorkStatus,
    /// The tool that (notionally) ran, when executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// The tool's outcome line, when executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// When the invocation was received.
    pub started_at: DateTime<Utc>,
    /// When the invocation reached its terminal state.
    pub finished_at: DateTime<Utc>,
}

impl StageWorkResult {
    /// Creates an executed result.
    #[must_use]
    pub fn executed(
        stage: impl Into<String>,
        tool: impl Into<String>,
        outcome: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stage: stage.into(),
            status: WorkStatus::Executed,
            tool: Some(tool.into()),
            outcome: Some(outcome.into()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Creates a skipped result. No tool ran and no outcome exists.
    #[must_use]
    pub fn skipped(stage: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            stage: stage.into(),
            status: WorkStatus::Skipped,
            tool: None,
            outcome: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Returns the wall-clock duration of the invocation in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
