//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::converge::Poller;
use crate::scaleway::{Region, Zone};

/// Scaleway credentials, localities, and wait budgets derived from
/// environment variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SCW",
    discovery(
        app_name = "scw-converge",
        env_var = "SCW_CONVERGE_CONFIG_PATH",
        config_file_name = "scw-converge.toml",
        dotfile_name = ".scw-converge.toml",
        project_file_name = "scw-converge.toml"
    )
)]
pub struct ScalewayConfig {
    /// Access key assigned to the Scaleway application. Not needed for API
    /// calls; captured so one configuration file serves the `scw` CLI too.
    pub access_key: Option<String>,
    /// Secret key used for authentication. Required for API commands.
    #[ortho_config(default = String::new())]
    pub secret_key: String,
    /// Zone used for zonal resources given without a locality prefix.
    #[ortho_config(default = "fr-par-1".to_owned())]
    pub default_zone: String,
    /// Region used for regional resources given without a locality prefix.
    #[ortho_config(default = "fr-par".to_owned())]
    pub default_region: String,
    /// Base URL of the Scaleway API.
    #[ortho_config(default = "https://api.scaleway.com".to_owned())]
    pub api_url: String,
    /// Seconds between two readiness checks.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Seconds to wait for a reverse DNS name to resolve to its IP.
    #[ortho_config(default = 600)]
    pub reverse_dns_timeout_secs: u64,
    /// Seconds to wait for a pool and its nodes to become ready.
    #[ortho_config(default = 1800)]
    pub pool_timeout_secs: u64,
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

impl ScalewayConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to scw-converge.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("scw-converge")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks the fields every command needs. The secret key is checked
    /// separately by [`ScalewayConfig::validate_credentials`] so DNS-only
    /// commands work without one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a locality or the API URL
    /// is empty, and [`ConfigError::Invalid`] when the poll interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.default_zone,
            &FieldMetadata::new("default zone", "SCW_DEFAULT_ZONE", "default_zone"),
        )?;
        Self::require_field(
            &self.default_region,
            &FieldMetadata::new("default region", "SCW_DEFAULT_REGION", "default_region"),
        )?;
        Self::require_field(
            &self.api_url,
            &FieldMetadata::new("Scaleway API URL", "SCW_API_URL", "api_url"),
        )?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_secs must be greater than zero",
            )));
        }
        Ok(())
    }

    /// Checks that an API secret key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the secret key is empty.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Self::require_field(
            &self.secret_key,
            &FieldMetadata::new("Scaleway API secret key", "SCW_SECRET_KEY", "secret_key"),
        )
    }

    /// Default zone as a typed value.
    #[must_use]
    pub fn zone(&self) -> Zone {
        Zone::new(self.default_zone.as_str())
    }

    /// Default region as a typed value.
    #[must_use]
    pub fn region(&self) -> Region {
        Region::new(self.default_region.as_str())
    }

    /// Poller for reverse DNS resolution checks.
    #[must_use]
    pub const fn reverse_dns_poller(&self) -> Poller {
        Poller::new(
            Duration::from_secs(self.reverse_dns_timeout_secs),
            Duration::from_secs(self.poll_interval_secs),
        )
    }

    /// Poller for pool readiness and deletion waits.
    #[must_use]
    pub const fn pool_poller(&self) -> Poller {
        Poller::new(
            Duration::from_secs(self.pool_timeout_secs),
            Duration::from_secs(self.poll_interval_secs),
        )
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
