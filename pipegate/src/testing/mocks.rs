//! In-memory implementations of the collaborator ports, with call
//! recording for exactly-once assertions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{FlagSyncError, StartupError};
use crate::flags::{DecisionContext, FlagProvider, SecretSource};
use crate::job::OutputVariables;
use crate::orchestrator::{
    CompletionReporter, OrchestratorError, PipelineStarter, StartExecutionRequest,
};

/// A flag provider backed by an in-memory flag map.
///
/// Counts sync calls and can be configured to error on sync or serve the
/// default for every evaluation, exercising the degraded paths.
pub struct InMemoryFlagProvider {
    flags: Mutex<HashMap<String, serde_json::Value>>,
    sync_count: Mutex<usize>,
    initialized: bool,
    sync_fails: bool,
    evaluation_fails: bool,
}

impl InMemoryFlagProvider {
    /// Creates an initialized provider with no flags defined.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: Mutex::new(HashMap::new()),
            sync_count: Mutex::new(0),
            initialized: true,
            sync_fails: false,
            evaluation_fails: false,
        }
    }

    /// Creates a provider that never finished initialization.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::new()
        }
    }

    /// Defines a flag value.
    #[must_use]
    pub fn with_flag(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.flags.lock().insert(name.into(), value);
        self
    }

    /// Makes every sync call fail.
    #[must_use]
    pub fn with_sync_errors(mut self) -> Self {
        self.sync_fails = true;
        self
    }

    /// Makes every evaluation error, falling back to the default.
    #[must_use]
    pub fn with_evaluation_errors(mut self) -> Self {
        self.evaluation_fails = true;
        self
    }

    /// Replaces a flag value after construction, simulating a targeting
    /// change between invocations.
    pub fn set_flag(&self, name: impl Into<String>, value: serde_json::Value) {
        self.flags.lock().insert(name.into(), value);
    }

    /// Returns how many times sync was called.
    #[must_use]
    pub fn sync_count(&self) -> usize {
        *self.sync_count.lock()
    }
}

impl Default for InMemoryFlagProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagProvider for InMemoryFlagProvider {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn sync(&self, _context: &DecisionContext) -> Result<(), FlagSyncError> {
        *self.sync_count.lock() += 1;
        if self.sync_fails {
            return Err(FlagSyncError::new("flag service unreachable"));
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        flag_name: &str,
        _context: &DecisionContext,
        default: serde_json::Value,
    ) -> serde_json::Value {
        if self.evaluation_fails {
            return default;
        }
        self.flags.lock().get(flag_name).cloned().unwrap_or(default)
    }
}

/// A completion reporter that records every callback per job id.
///
/// `success_count` + `failure_count` per job is the exactly-once check.
pub struct RecordingReporter {
    successes: Mutex<HashMap<String, Vec<OutputVariables>>>,
    failures: Mutex<HashMap<String, Vec<String>>>,
    fail_transport: bool,
}

impl RecordingReporter {
    /// Creates a reporter whose callbacks always land.
    #[must_use]
    pub fn new() -> Self {
        Self {
            successes: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            fail_transport: false,
        }
    }

    /// Creates a reporter whose callbacks fail at the transport level.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_transport: true,
            ..Self::new()
        }
    }

    /// Number of success reports recorded for a job.
    #[must_use]
    pub fn success_count(&self, job_id: &str) -> usize {
        self.successes.lock().get(job_id).map_or(0, Vec::len)
    }

    /// Number of failure reports recorded for a job.
    #[must_use]
    pub fn failure_count(&self, job_id: &str) -> usize {
        self.failures.lock().get(job_id).map_or(0, Vec::len)
    }

    /// Total terminal reports for a job across both callbacks.
    #[must_use]
    pub fn total_reports(&self, job_id: &str) -> usize {
        self.success_count(job_id) + self.failure_count(job_id)
    }

    /// The variables from the most recent success report for a job.
    #[must_use]
    pub fn last_success(&self, job_id: &str) -> Option<OutputVariables> {
        self.successes
            .lock()
            .get(job_id)
            .and_then(|reports| reports.last().cloned())
    }

    /// The message from the most recent failure report for a job.
    #[must_use]
    pub fn last_failure(&self, job_id: &str) -> Option<String> {
        self.failures
            .lock()
            .get(job_id)
            .and_then(|reports| reports.last().cloned())
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionReporter for RecordingReporter {
    async fn report_success(
        &self,
        job_id: &str,
        variables: OutputVariables,
    ) -> Result<(), OrchestratorError> {
        if self.fail_transport {
            return Err(OrchestratorError::new("callback transport failed"));
        }
        self.successes
            .lock()
            .entry(job_id.to_string())
            .or_default()
            .push(variables);
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<(), OrchestratorError> {
        if self.fail_transport {
            return Err(OrchestratorError::new("callback transport failed"));
        }
        self.failures
            .lock()
            .entry(job_id.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }
}

/// A pipeline starter that records start requests and mints execution
/// ids, or refuses every request when configured to fail.
pub struct FakePipelineStarter {
    requests: Mutex<Vec<StartExecutionRequest>>,
    fail: bool,
}

impl FakePipelineStarter {
    /// Creates a starter that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Creates a starter that refuses every request.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Returns every start request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<StartExecutionRequest> {
        self.requests.lock().clone()
    }
}

impl Default for FakePipelineStarter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStarter for FakePipelineStarter {
    async fn start_execution(
        &self,
        request: StartExecutionRequest,
    ) -> Result<String, OrchestratorError> {
        if self.fail {
            return Err(OrchestratorError::new("start_pipeline_execution throttled"));
        }
        self.requests.lock().push(request);
        Ok(Uuid::new_v4().to_string())
    }
}

/// A secret source serving a fixed SDK key.
pub struct StaticSecretSource {
    key: Option<String>,
}

impl StaticSecretSource {
    /// Creates a source holding the given key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    /// Creates a source with no key, so every fetch fails.
    #[must_use]
    pub fn empty() -> Self {
        Self { key: None }
    }
}

#[async_trait]
impl SecretSource for StaticSecretSource {
    async fn fetch_sdk_key(&self, secret_name: &str) -> Result<String, StartupError> {
        self.key.clone().ok_or_else(|| {
            StartupError::new(format!("secret {secret_name} not found"))
        })
    }
}
