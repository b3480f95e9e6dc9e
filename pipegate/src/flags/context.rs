//! The identity and parameters a flag is evaluated under.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PipegateError;

/// The kind of subject a decision context targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// An application being delivered through the pipeline.
    Application,
}

impl Default for ContextKind {
    fn default() -> Self {
        Self::Application
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
        }
    }
}

/// The subject and parameters under which a flag is evaluated.
///
/// Immutable once built, and built fresh for every invocation — a context
/// is never reused across invocations, since the targeting rules it was
/// evaluated under may have changed in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    /// The targeting subject (the application name).
    pub subject_key: String,
    /// The subject kind.
    pub kind: ContextKind,
    /// The stage the decision is for, when gating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
    /// The application name attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// The pipeline version attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_version: Option<String>,
}

impl DecisionContext {
    /// Starts building a context for the given subject key.
    #[must_use]
    pub fn builder(subject_key: impl Into<String>) -> DecisionContextBuilder {
        DecisionContextBuilder {
            subject_key: subject_key.into(),
            kind: ContextKind::Application,
            stage_name: None,
            app_name: None,
            pipeline_version: None,
        }
    }
}

/// Builder for [`DecisionContext`].
#[derive(Debug, Clone)]
pub struct DecisionContextBuilder {
    subject_key: String,
    kind: ContextKind,
    stage_name: Option<String>,
    app_name: Option<String>,
    pipeline_version: Option<String>,
}

impl DecisionContextBuilder {
    /// Sets the subject kind.
    #[must_use]
    pub fn kind(mut self, kind: ContextKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the stage name attribute.
    #[must_use]
    pub fn stage_name(mut self, stage_name: impl Into<String>) -> Self {
        self.stage_name = Some(stage_name.into());
        self
    }

    /// Sets the application name attribute.
    #[must_use]
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Sets the pipeline version attribute.
    #[must_use]
    pub fn pipeline_version(mut self, version: impl Into<String>) -> Self {
        self.pipeline_version = Some(version.into());
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the subject key is empty — an empty
    /// subject would make every evaluation target the anonymous bucket.
    pub fn build(self) -> Result<DecisionContext, PipegateError> {
        if self.subject_key.is_empty() {
            return Err(PipegateError::invalid_parameter(
                "subject_key",
                "",
                "a non-empty subject key",
            ));
        }
        Ok(DecisionContext {
            subject_key: self.subject_key,
            kind: self.kind,
            stage_name: self.stage_name,
            app_name: self.app_name,
            pipeline_version: self.pipeline_version,
        })
    }
}
