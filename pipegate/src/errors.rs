//! Error types for the pipegate protocol.
//!
//! The taxonomy separates fatal startup failures, malformed invocation
//! input, and downstream orchestrator failures. Degraded flag evaluations
//! are deliberately *not* errors: they recover to caller-supplied defaults
//! inside the provider and surface only as warnings.

use thiserror::Error;

/// The main error type for pipegate operations.
#[derive(Debug, Error)]
pub enum PipegateError {
    /// The process-lifetime flag client failed to initialize. The process
    /// must refuse all work rather than silently defaulting every decision.
    #[error("{0}")]
    Startup(#[from] StartupError),

    /// A required invocation parameter was absent.
    #[error("missing required parameter: {name}")]
    MissingParameter {
        /// The parameter name that was expected.
        name: String,
    },

    /// An invocation parameter was present but unparseable.
    #[error("invalid value {value:?} for parameter {name}: expected {expected}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// The raw value that failed to parse.
        value: String,
        /// What the parameter should have looked like.
        expected: String,
    },

    /// The orchestrator refused or failed to start the target pipeline.
    /// Reported as a terminal failure; retry policy belongs to the caller.
    #[error("failed to start pipeline {pipeline_name}: {reason}")]
    StartFailed {
        /// The target pipeline that could not be started.
        pipeline_name: String,
        /// The orchestrator's reason.
        reason: String,
    },

    /// The completion callback itself failed to go through.
    #[error("completion report for job {job_id} failed: {reason}")]
    Report {
        /// The job whose terminal report did not land.
        job_id: String,
        /// The transport-level reason.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised when process startup cannot complete.
///
/// Raising this is a hard abort: a half-initialized flag client must never
/// fall back to defaults for every decision.
#[derive(Debug, Clone, Error)]
#[error("startup failed: {message}")]
pub struct StartupError {
    /// The error message.
    pub message: String,
}

impl StartupError {
    /// Creates a new startup error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error raised when a forced flag sync cannot reach the flag service.
///
/// Sync failures degrade the invocation (evaluation falls back to the
/// caller's default) instead of failing it.
#[derive(Debug, Clone, Error)]
#[error("flag sync failed: {message}")]
pub struct FlagSyncError {
    /// The error message.
    pub message: String,
}

impl FlagSyncError {
    /// Creates a new sync error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl PipegateError {
    /// Returns true if this error must surface as a failed completion
    /// report rather than being recovered locally.
    #[must_use]
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::InvalidParameter { .. }
                | Self::StartFailed { .. }
                | Self::Serialization(_)
        )
    }

    /// Convenience constructor for a missing parameter.
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Convenience constructor for an invalid parameter.
    #[must_use]
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}
