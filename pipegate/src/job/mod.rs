//! Invocation job descriptors and output variables.
//!
//! Every component receives a job descriptor (a job id plus a free-form
//! parameter map) and resolves by handing a mapping of named string
//! variables back to the orchestrator, which interpolates them into later
//! pipeline steps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::PipegateError;

/// One invocation's input: a job identifier and its parameter map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// The orchestrator-assigned job id, used to address the completion
    /// callback for this invocation.
    pub job_id: String,
    /// Free-form parameters set per-action in the pipeline definition.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

impl JobDescriptor {
    /// Creates a job descriptor with no parameters.
    #[must_use]
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            parameters: HashMap::new(),
        }
    }

    /// Adds a string parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .insert(name.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Returns a required string parameter.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if the key is absent, or
    /// `InvalidParameter` if present but not a string. Both are reported
    /// to the orchestrator as failed completions, never as silent skips.
    pub fn require_str(&self, name: &str) -> Result<&str, PipegateError> {
        let value = self
            .parameters
            .get(name)
            .ok_or_else(|| PipegateError::missing_parameter(name))?;
        value.as_str().ok_or_else(|| {
            PipegateError::invalid_parameter(name, value.to_string(), "a string")
        })
    }

    /// Returns an optional string parameter, ignoring non-string values.
    #[must_use]
    pub fn optional_str(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(serde_json::Value::as_str)
    }
}

/// The named string variables an invocation resolves with.
///
/// Keys are the names later steps interpolate; values are always strings
/// because the orchestrator's variable channel is string-typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputVariables(HashMap<String, String>);

impl OutputVariables {
    /// Creates an empty variable map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Gets a variable by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}
