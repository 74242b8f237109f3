//! Configuration types for the CIS toolkit
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default CIS API endpoint
pub const DEFAULT_CIS_ENDPOINT: &str = "https://api.cis.cloud.ibm.com";

/// Default resource controller endpoint
pub const DEFAULT_RESOURCE_CONTROLLER_ENDPOINT: &str = "https://resource-controller.cloud.ibm.com";

/// Main provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Remote API connection settings
    pub endpoints: EndpointConfig,

    /// Name of the environment variable that holds the API token
    ///
    /// The token itself is never stored in configuration.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Poll timing used by create/update/delete waits
    #[serde(default)]
    pub poll: PollConfig,

    /// Per-operation timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl ProviderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            token_env: default_token_env(),
            poll: PollConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.token_env.is_empty() {
            return Err(crate::Error::config("Token environment variable name cannot be empty"));
        }

        self.endpoints.validate()?;
        self.poll.validate()?;
        self.timeouts.validate()?;

        let shortest = self.timeouts.shortest_secs();
        if self.poll.delay_secs >= shortest {
            return Err(crate::Error::config(format!(
                "Poll delay ({}s) must be shorter than every operation timeout (shortest: {}s)",
                self.poll.delay_secs, shortest
            )));
        }

        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// CIS API base URL
    #[serde(default = "default_cis_endpoint")]
    pub cis: String,

    /// Resource controller base URL (instance lifecycle)
    #[serde(default = "default_resource_controller_endpoint")]
    pub resource_controller: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl EndpointConfig {
    /// Validate the endpoint configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (name, url) in [
            ("CIS endpoint", &self.cis),
            ("Resource controller endpoint", &self.resource_controller),
        ] {
            if url.is_empty() {
                return Err(crate::Error::config(format!("{} cannot be empty", name)));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "{} must use HTTP or HTTPS scheme. Got: {}",
                    name, url
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }

        Ok(())
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            cis: default_cis_endpoint(),
            resource_controller: default_resource_controller_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Poll timing
///
/// Both values are fixed intervals; there is no backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait before the first status fetch (in seconds)
    #[serde(default = "default_poll_delay_secs")]
    pub delay_secs: u64,

    /// Wait between status fetches (in seconds)
    #[serde(default = "default_poll_min_interval_secs")]
    pub min_interval_secs: u64,
}

impl PollConfig {
    /// Validate the poll configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.min_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        Ok(())
    }

    /// Wait before the first fetch
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Wait between fetches
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_poll_delay_secs(),
            min_interval_secs: default_poll_min_interval_secs(),
        }
    }
}

/// Overall budgets for long-running operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Create timeout (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub create_secs: u64,

    /// Update timeout (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub update_secs: u64,

    /// Delete timeout (in seconds)
    #[serde(default = "default_operation_timeout_secs")]
    pub delete_secs: u64,
}

impl TimeoutConfig {
    /// Validate the timeout configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.create_secs == 0 || self.update_secs == 0 || self.delete_secs == 0 {
            return Err(crate::Error::config("Operation timeouts must be > 0"));
        }
        Ok(())
    }

    /// The smallest of the three budgets
    pub fn shortest_secs(&self) -> u64 {
        self.create_secs.min(self.update_secs).min(self.delete_secs)
    }

    /// Timeouts as durations
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(self.create_secs),
            update: Duration::from_secs(self.update_secs),
            delete: Duration::from_secs(self.delete_secs),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: default_operation_timeout_secs(),
            update_secs: default_operation_timeout_secs(),
            delete_secs: default_operation_timeout_secs(),
        }
    }
}

/// Per-operation budgets handed to resource handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        TimeoutConfig::default().to_timeouts()
    }
}

fn default_token_env() -> String {
    "IC_IAM_TOKEN".to_string()
}

fn default_cis_endpoint() -> String {
    DEFAULT_CIS_ENDPOINT.to_string()
}

fn default_resource_controller_endpoint() -> String {
    DEFAULT_RESOURCE_CONTROLLER_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_delay_secs() -> u64 {
    10
}

fn default_poll_min_interval_secs() -> u64 {
    10
}

fn default_operation_timeout_secs() -> u64 {
    10 * 60
}
