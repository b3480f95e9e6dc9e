//! Process-lifetime wiring.
//!
//! The flag client and orchestrator handles are constructed once at
//! startup and shared by reference into every invocation handler. If the
//! flag provider never initialized, construction aborts: the process
//! refuses all work rather than serving defaults for every decision.

use std::sync::Arc;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::errors::{PipegateError, StartupError};
use crate::flags::FlagProvider;
use crate::gate::GateEvaluator;
use crate::orchestrator::{CompletionReporter, PipelineStarter};
use crate::router::{Router, VariantTable};
use crate::worker::StageWorker;

/// The explicitly-owned bundle of process-lifetime handles.
pub struct Runtime {
    config: RuntimeConfig,
    flags: Arc<dyn FlagProvider>,
    reporter: Arc<dyn CompletionReporter>,
    starter: Arc<dyn PipelineStarter>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Wires the runtime from already-constructed collaborator handles.
    ///
    /// # Errors
    ///
    /// Returns `Startup` if the flag provider is not initialized. This is
    /// a hard abort, never a per-call fallback: a half-initialized flag
    /// client would silently default every decision in the fleet.
    pub fn new(
        config: RuntimeConfig,
        flags: Arc<dyn FlagProvider>,
        reporter: Arc<dyn CompletionReporter>,
        starter: Arc<dyn PipelineStarter>,
    ) -> Result<Self, PipegateError> {
        if !flags.is_initialized() {
            return Err(StartupError::new("flag client failed to initialize").into());
        }
        info!(region = %config.region, "runtime initialized");
        Ok(Self {
            config,
            flags,
            reporter,
            starter,
        })
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builds a gate evaluator sharing this runtime's handles.
    #[must_use]
    pub fn gate_evaluator(&self) -> GateEvaluator {
        GateEvaluator::new(self.flags.clone(), self.reporter.clone())
    }

    /// Builds a router sharing this runtime's handles.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new(
            self.flags.clone(),
            self.starter.clone(),
            self.reporter.clone(),
            VariantTable::from_config(&self.config),
        )
    }

    /// Builds a stage worker sharing this runtime's handles.
    #[must_use]
    pub fn stage_worker(&self) -> StageWorker {
        StageWorker::new(self.reporter.clone())
    }
}

/// Installs the global tracing subscriber with env-filter support.
///
/// Call once from the embedding binary's entry point. Subsequent calls
/// are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
