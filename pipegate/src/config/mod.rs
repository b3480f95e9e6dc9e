//! Environment-style runtime configuration.

use serde::{Deserialize, Serialize};

use crate::errors::StartupError;

/// Environment variable naming the flag-service SDK key secret.
pub const ENV_FLAG_SECRET_NAME: &str = "FLAG_SECRET_NAME";
/// Environment variable naming the flag-service/secret-store region.
pub const ENV_FLAG_SERVICE_REGION: &str = "FLAG_SERVICE_REGION";
/// Environment variable naming the stable pipeline.
pub const ENV_PIPELINE_V1_NAME: &str = "PIPELINE_V1_NAME";
/// Environment variable naming the patched pipeline.
pub const ENV_PIPELINE_V2_NAME: &str = "PIPELINE_V2_NAME";

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_pipeline_v1() -> String {
    "shared-pipeline-v1".to_string()
}

fn default_pipeline_v2() -> String {
    "shared-pipeline-v2".to_string()
}

/// Process-lifetime configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Secret-store location of the flag-service SDK key. Required; a
    /// process with no secret location cannot initialize and must abort.
    pub flag_secret_name: String,
    /// Region/endpoint selector for the external services.
    #[serde(default = "default_region")]
    pub region: String,
    /// Name of the stable (v1) target pipeline.
    #[serde(default = "default_pipeline_v1")]
    pub pipeline_v1_name: String,
    /// Name of the patched (v2) target pipeline.
    #[serde(default = "default_pipeline_v2")]
    pub pipeline_v2_name: String,
}

impl RuntimeConfig {
    /// Creates a configuration with defaults for everything but the
    /// secret location.
    #[must_use]
    pub fn new(flag_secret_name: impl Into<String>) -> Self {
        Self {
            flag_secret_name: flag_secret_name.into(),
            region: default_region(),
            pipeline_v1_name: default_pipeline_v1(),
            pipeline_v2_name: default_pipeline_v2(),
        }
    }

    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `StartupError` if `FLAG_SECRET_NAME` is unset — startup
    /// must abort rather than run without flag-service credentials.
    pub fn from_env() -> Result<Self, StartupError> {
        let flag_secret_name = std::env::var(ENV_FLAG_SECRET_NAME).map_err(|_| {
            StartupError::new(format!("{ENV_FLAG_SECRET_NAME} is not set"))
        })?;

        let mut config = Self::new(flag_secret_name);
        if let Ok(region) = std::env::var(ENV_FLAG_SERVICE_REGION) {
            config.region = region;
        }
        if let Ok(name) = std::env::var(ENV_PIPELINE_V1_NAME) {
            config.pipeline_v1_name = name;
        }
        if let Ok(name) = std::env::var(ENV_PIPELINE_V2_NAME) {
            config.pipeline_v2_name = name;
        }
        Ok(config)
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the stable pipeline name.
    #[must_use]
    pub fn with_pipeline_v1_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_v1_name = name.into();
        self
    }

    /// Sets the patched pipeline name.
    #[must_use]
    pub fn with_pipeline_v2_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_v2_name = name.into();
        self
    }
}
