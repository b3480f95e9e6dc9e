//! The flag provider port.

use async_trait::async_trait;

use crate::errors::{FlagSyncError, StartupError};
use crate::flags::DecisionContext;

/// Name of the flag listing the stages required for an application.
pub const FLAG_REQUIRED_STAGES: &str = "pipeline-required-stages";

/// Name of the flag selecting the pipeline variant for an application.
pub const FLAG_PIPELINE_VERSION: &str = "pipeline-version";

/// Port over the external dynamic-flag service.
///
/// The provider handle is process-lifetime shared state: constructed once
/// at startup, read-only afterwards, safe for concurrent use. Each
/// invocation must still call [`sync`](Self::sync) before evaluating — the
/// hosting runtime may reuse a warm process, and a prior invocation's sync
/// does not guarantee freshness for the current one's targeting rules.
#[async_trait]
pub trait FlagProvider: Send + Sync {
    /// Returns true once the provider completed its one-time
    /// initialization. A provider that never initialized is fatal at
    /// startup; it must not serve defaults for every decision.
    fn is_initialized(&self) -> bool;

    /// Forces retrieval of the latest flag/targeting rules for `context`.
    ///
    /// # Errors
    ///
    /// Returns `FlagSyncError` if the service cannot be reached. Callers
    /// log the failure and continue: the subsequent evaluation degrades to
    /// its default rather than failing the invocation.
    async fn sync(&self, context: &DecisionContext) -> Result<(), FlagSyncError>;

    /// Evaluates `flag_name` for `context`.
    ///
    /// Fail-open: if the flag is absent, disabled, or the service errors,
    /// the caller's `default` is returned. The caller chooses a safe,
    /// conservative default (all stages required; the stable variant).
    async fn evaluate(
        &self,
        flag_name: &str,
        context: &DecisionContext,
        default: serde_json::Value,
    ) -> serde_json::Value;
}

/// Port over the secret store holding the flag-service SDK key.
///
/// Retrieval happens once, during process startup, by whatever constructs
/// the concrete [`FlagProvider`]; this crate only defines the boundary.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetches the SDK key stored under `secret_name`.
    ///
    /// # Errors
    ///
    /// Returns `StartupError` if the secret is missing or unreadable.
    /// Startup errors are fatal: the process refuses work instead of
    /// connecting with no credentials.
    async fn fetch_sdk_key(&self, secret_name: &str) -> Result<String, StartupError>;
}
