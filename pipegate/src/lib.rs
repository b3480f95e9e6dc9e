//! # Pipegate
//!
//! A flag-gated staged-execution protocol for multi-stage delivery
//! pipelines. Each stage's participation (run vs. skip) and each
//! execution's pipeline variant (stable vs. patched) are decided by
//! querying an external feature-flag service, and the decisions are
//! propagated exactly-once across independently-invoked pipeline steps.
//!
//! The crate provides three invocation handlers sharing process-lifetime
//! collaborator handles:
//!
//! - **`Router`**: evaluates the `pipeline-version` flag and starts the
//!   selected pipeline variant with routing metadata attached as
//!   execution-scoped variables.
//! - **`GateEvaluator`**: evaluates the `pipeline-required-stages` flag
//!   and emits a proceed/skip decision as an output variable.
//! - **`StageWorker`**: consumes the transported gate decision and either
//!   no-ops or performs the stage's placeholder work.
//!
//! Every invocation resolves through the orchestrator's completion
//! callback exactly once; [`orchestrator::JobCompletion`] makes a double
//! report unrepresentable.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pipegate::prelude::*;
//!
//! let runtime = Runtime::new(config, flags, reporter, starter)?;
//! let gate = runtime.gate_evaluator();
//! gate.handle(&job).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod flags;
pub mod gate;
pub mod job;
pub mod orchestrator;
pub mod router;
pub mod runtime;
pub mod testing;
pub mod worker;

#[cfg(test)]
mod protocol_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::core::{
        GateDecision, PipelineVariant, RequiredStages, RoutingDecision, StageName,
        StageWorkResult, WorkStatus,
    };
    pub use crate::errors::{FlagSyncError, PipegateError, StartupError};
    pub use crate::flags::{
        ContextKind, DecisionContext, FlagProvider, SecretSource, FLAG_PIPELINE_VERSION,
        FLAG_REQUIRED_STAGES,
    };
    pub use crate::gate::GateEvaluator;
    pub use crate::job::{JobDescriptor, OutputVariables};
    pub use crate::orchestrator::{
        CompletionReporter, ExecutionVariable, JobCompletion, OrchestratorError, PipelineStarter,
        StartExecutionRequest,
    };
    pub use crate::router::{Router, VariantTable};
    pub use crate::runtime::Runtime;
    pub use crate::worker::{StageWorker, WorkProfile, WorkTarget, WorkerState};
}
