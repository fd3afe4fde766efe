//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::disk::DiskSettings;

/// Cloud endpoint configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "OS")]
pub struct CloudConfig {
    /// Base URL of the volume service, including the tenant path
    /// (for example `https://cloud.example/v1/tenant-id`).
    pub volume_api_url: String,
    /// Base URL of the compute service, used for availability-zone lookups.
    pub compute_api_url: String,
    /// Pre-issued authentication token sent as `X-Auth-Token`. Token renewal
    /// belongs to the surrounding plugin host, not this crate.
    pub auth_token: String,
    /// Region label, captured for operator diagnostics. Endpoints are already
    /// region-scoped so this value is never sent on the wire.
    pub region: Option<String>,
    /// Disables availability-zone inheritance from reference servers.
    #[ortho_config(default = false)]
    pub ignore_server_availability_zone: bool,
    /// Deadline, in seconds, for resource-state wait loops.
    #[ortho_config(default = 300)]
    pub state_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl CloudConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to oscpi.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("oscpi")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the immutable adapter settings carried by the provisioner.
    #[must_use]
    pub const fn as_settings(&self) -> DiskSettings {
        DiskSettings {
            ignore_server_availability_zone: self.ignore_server_availability_zone,
            wait_timeout: Duration::from_secs(self.state_timeout_secs),
        }
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.volume_api_url,
            &FieldMetadata::new("volume service URL", "OS_VOLUME_API_URL", "volume_api_url"),
        )?;
        Self::require_field(
            &self.compute_api_url,
            &FieldMetadata::new(
                "compute service URL",
                "OS_COMPUTE_API_URL",
                "compute_api_url",
            ),
        )?;
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("authentication token", "OS_AUTH_TOKEN", "auth_token"),
        )?;
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
