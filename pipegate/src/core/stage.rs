//! The closed pipeline stage enumeration and the required-stage set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PipegateError;

/// One named unit of pipeline work, drawn from a fixed enumeration.
///
/// The wire form is kebab-case (`unit-test`, `change-approval`), matching
/// the stage identifiers interpolated through the orchestrator's variable
/// store and the values served by the `pipeline-required-stages` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageName {
    /// Source checkout.
    Source,
    /// Compile and package artifacts.
    Build,
    /// Unit test suite.
    UnitTest,
    /// Static application security testing.
    Sast,
    /// Software composition analysis (dependency scan).
    Sca,
    /// Change approval record.
    ChangeApproval,
    /// Deployment to the target environment.
    Deploy,
    /// Integration tests against the deployment.
    IntegrationTest,
}

impl StageName {
    /// Every stage in the closed enumeration, in pipeline order.
    pub const ALL: [Self; 8] = [
        Self::Source,
        Self::Build,
        Self::UnitTest,
        Self::Sast,
        Self::Sca,
        Self::ChangeApproval,
        Self::Deploy,
        Self::IntegrationTest,
    ];

    /// Returns the kebab-case wire form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Build => "build",
            Self::UnitTest => "unit-test",
            Self::Sast => "sast",
            Self::Sca => "sca",
            Self::ChangeApproval => "change-approval",
            Self::Deploy => "deploy",
            Self::IntegrationTest => "integration-test",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageName {
    type Err = PipegateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                PipegateError::invalid_parameter(
                    "stage_name",
                    s,
                    "one of the closed stage enumeration",
                )
            })
    }
}

/// The set of stages currently required for an application.
///
/// Returned by evaluating the `pipeline-required-stages` flag. Order is
/// irrelevant to gating; only membership matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredStages(Vec<StageName>);

impl RequiredStages {
    /// The fail-open default: every stage is required.
    #[must_use]
    pub fn all() -> Self {
        Self(StageName::ALL.to_vec())
    }

    /// Creates a required-stage set from explicit stages.
    #[must_use]
    pub fn new(stages: impl IntoIterator<Item = StageName>) -> Self {
        Self(stages.into_iter().collect())
    }

    /// Parses a flag value into a required-stage set.
    ///
    /// The flag is expected to serve an array of stage-name strings.
    /// Entries that are not strings or not in the closed enumeration are
    /// logged and dropped rather than failing the evaluation; they could
    /// never match a gated stage anyway. A value that is not an array at
    /// all falls back to `default`.
    #[must_use]
    pub fn from_flag_value(value: &serde_json::Value, default: Self) -> Self {
        let Some(entries) = value.as_array() else {
            tracing::warn!(?value, "required-stages flag is not a list; using default");
            return default;
        };

        let mut stages = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.as_str().map(str::parse) {
                Some(Ok(stage)) => stages.push(stage),
                _ => tracing::warn!(?entry, "ignoring unknown required-stages entry"),
            }
        }
        Self(stages)
    }

    /// Returns true if `stage` is in the required set.
    #[must_use]
    pub fn contains(&self, stage: StageName) -> bool {
        self.0.contains(&stage)
    }

    /// Returns the number of required stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no stage is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RequiredStages {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_name_display() {
        assert_eq!(StageName::Build.to_string(), "build");
        assert_eq!(StageName::UnitTest.to_string(), "unit-test");
        assert_eq!(StageName::ChangeApproval.to_string(), "change-approval");
        assert_eq!(StageName::IntegrationTest.to_string(), "integration-test");
    }

    #[test]
    fn test_stage_name_round_trip() {
        for stage in StageName::ALL {
            assert_eq!(stage.as_str().parse::<StageName>().unwrap(), stage);
        }
    }

    #[test]
    fn test_stage_name_rejects_unknown() {
        assert!("canary-bake".parse::<StageName>().is_err());
        assert!("".parse::<StageName>().is_err());
    }

    #[test]
    fn test_stage_name_serialize_kebab_case() {
        let json = serde_json::to_string(&StageName::ChangeApproval).unwrap();
        assert_eq!(json, r#""change-approval""#);
    }

    #[test]
    fn test_required_stages_membership() {
        let required = RequiredStages::new([StageName::Source, StageName::Build, StageName::Deploy]);
        assert!(required.contains(StageName::Build));
        assert!(!required.contains(StageName::Sast));
    }

    #[test]
    fn test_required_stages_from_flag_value() {
        let value = json!(["source", "build", "deploy"]);
        let required = RequiredStages::from_flag_value(&value, RequiredStages::all());
        assert_eq!(required.len(), 3);
        assert!(required.contains(StageName::Deploy));
        assert!(!required.contains(StageName::Sca));
    }

    #[test]
    fn test_required_stages_drops_unknown_entries() {
        let value = json!(["build", "canary-bake", 42]);
        let required = RequiredStages::from_flag_value(&value, RequiredStages::all());
        assert_eq!(required.len(), 1);
        assert!(required.contains(StageName::Build));
    }

    #[test]
    fn test_required_stages_non_list_falls_back() {
        let value = json!("build");
        let required = RequiredStages::from_flag_value(&value, RequiredStages::all());
        assert_eq!(required, RequiredStages::all());
    }
}
