//! Provider configuration.
//!
//! The host passes the provider block as JSON to `configure`. Every attribute
//! falls back to an environment variable, then to a default.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{ProviderError, Result};
use crate::schema::{Attribute, Schema, Validator};

/// Region used when neither the configuration nor the environment names one.
pub const DEFAULT_REGION: &str = "eu01";

const DEFAULT_OBSERVABILITY_ENDPOINT: &str = "https://observability.api.stackit.cloud";
const DEFAULT_LOGS_ENDPOINT: &str = "https://logs.api.stackit.cloud";
const DEFAULT_SCF_ENDPOINT: &str = "https://scf.api.stackit.cloud";
const DEFAULT_SERVER_UPDATE_ENDPOINT: &str = "https://serverupdate.api.stackit.cloud";
const DEFAULT_WAIT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 3_600;
const WAIT_POLL_INTERVAL_MS: (i64, i64) = (1, 60_000);
const WAIT_TIMEOUT_SECS: (i64, i64) = (1, 86_400);

/// The provider block as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProviderConfig {
    /// Default region for regional resources.
    pub region: Option<String>,
    /// Bearer token of a STACKIT service account.
    pub service_account_token: Option<String>,
    /// Override for the observability API base URL.
    pub observability_custom_endpoint: Option<String>,
    /// Override for the LogMe API base URL.
    pub logme_custom_endpoint: Option<String>,
    /// Override for the Logs API base URL.
    pub logs_custom_endpoint: Option<String>,
    /// Override for the SCF API base URL.
    pub scf_custom_endpoint: Option<String>,
    /// Override for the server update API base URL.
    pub server_update_custom_endpoint: Option<String>,
    /// Opt in to beta resources.
    pub enable_beta_resources: Option<bool>,
    /// Interval between wait handler polls.
    pub wait_poll_interval_ms: Option<i64>,
    /// Upper bound for a single wait handler.
    pub wait_timeout_secs: Option<i64>,
}

/// Polling policy for asynchronous remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between two status polls.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_WAIT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
        }
    }
}

/// Resolved and validated provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Default region.
    pub region: String,
    /// Service account bearer token.
    pub service_account_token: String,
    /// Observability API base URL.
    pub observability_endpoint: Url,
    /// LogMe API base URL.
    pub logme_endpoint: Url,
    /// Logs API base URL.
    pub logs_endpoint: Url,
    /// SCF API base URL.
    pub scf_endpoint: Url,
    /// Server update API base URL.
    pub server_update_endpoint: Url,
    /// Whether beta resources may be used.
    pub enable_beta_resources: bool,
    /// Wait handler policy.
    pub wait: WaitConfig,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("service_account_token", &"<redacted>")
            .field("observability_endpoint", &self.observability_endpoint.as_str())
            .field("logme_endpoint", &self.logme_endpoint.as_str())
            .field("logs_endpoint", &self.logs_endpoint.as_str())
            .field("scf_endpoint", &self.scf_endpoint.as_str())
            .field("server_update_endpoint", &self.server_update_endpoint.as_str())
            .field("enable_beta_resources", &self.enable_beta_resources)
            .field("wait", &self.wait)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the configuration from the provider block and the process environment.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawProviderConfig = if value.is_null() {
            RawProviderConfig::default()
        } else {
            serde_json::from_value(value)?
        };
        Self::resolve(raw, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration with an explicit environment lookup.
    pub fn resolve(raw: RawProviderConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |value: Option<String>, key: &str| {
            value
                .or_else(|| env(key))
                .filter(|v| !v.trim().is_empty())
        };

        let region = pick(raw.region, "STACKIT_REGION").unwrap_or_else(|| DEFAULT_REGION.into());

        let service_account_token = pick(raw.service_account_token, "STACKIT_SERVICE_ACCOUNT_TOKEN")
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "service_account_token is not set and STACKIT_SERVICE_ACCOUNT_TOKEN is empty"
                        .into(),
                )
            })?;

        let logme_default = format!("https://logme.api.{}.stackit.cloud", region);
        let observability_endpoint = parse_endpoint(
            "observability_custom_endpoint",
            pick(raw.observability_custom_endpoint, "STACKIT_OBSERVABILITY_CUSTOM_ENDPOINT"),
            DEFAULT_OBSERVABILITY_ENDPOINT,
        )?;
        let logme_endpoint = parse_endpoint(
            "logme_custom_endpoint",
            pick(raw.logme_custom_endpoint, "STACKIT_LOGME_CUSTOM_ENDPOINT"),
            &logme_default,
        )?;
        let logs_endpoint = parse_endpoint(
            "logs_custom_endpoint",
            pick(raw.logs_custom_endpoint, "STACKIT_LOGS_CUSTOM_ENDPOINT"),
            DEFAULT_LOGS_ENDPOINT,
        )?;
        let scf_endpoint = parse_endpoint(
            "scf_custom_endpoint",
            pick(raw.scf_custom_endpoint, "STACKIT_SCF_CUSTOM_ENDPOINT"),
            DEFAULT_SCF_ENDPOINT,
        )?;
        let server_update_endpoint = parse_endpoint(
            "server_update_custom_endpoint",
            pick(raw.server_update_custom_endpoint, "STACKIT_SERVER_UPDATE_CUSTOM_ENDPOINT"),
            DEFAULT_SERVER_UPDATE_ENDPOINT,
        )?;

        let enable_beta_resources = match raw.enable_beta_resources {
            Some(enabled) => enabled,
            None => env("STACKIT_TF_ENABLE_BETA_RESOURCES")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        };

        let mut wait = WaitConfig::default();
        if let Some(ms) = raw.wait_poll_interval_ms {
            let ms = bounded("wait_poll_interval_ms", ms, WAIT_POLL_INTERVAL_MS)?;
            wait.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = raw.wait_timeout_secs {
            let secs = bounded("wait_timeout_secs", secs, WAIT_TIMEOUT_SECS)?;
            wait.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            region,
            service_account_token,
            observability_endpoint,
            logme_endpoint,
            logs_endpoint,
            scf_endpoint,
            server_update_endpoint,
            enable_beta_resources,
            wait,
        })
    }

    /// The schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Configures access to the STACKIT APIs.")
            .with_attribute(
                "region",
                Attribute::optional_string().with_description("Default region for regional resources."),
            )
            .with_attribute(
                "service_account_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Service account access token."),
            )
            .with_attribute("observability_custom_endpoint", Attribute::optional_string())
            .with_attribute("logme_custom_endpoint", Attribute::optional_string())
            .with_attribute("logs_custom_endpoint", Attribute::optional_string())
            .with_attribute("scf_custom_endpoint", Attribute::optional_string())
            .with_attribute("server_update_custom_endpoint", Attribute::optional_string())
            .with_attribute(
                "enable_beta_resources",
                Attribute::optional_bool().with_description("Enable beta resources."),
            )
            .with_attribute(
                "wait_poll_interval_ms",
                Attribute::optional_int64().with_validator(Validator::Int64Between {
                    min: WAIT_POLL_INTERVAL_MS.0,
                    max: WAIT_POLL_INTERVAL_MS.1,
                }),
            )
            .with_attribute(
                "wait_timeout_secs",
                Attribute::optional_int64().with_validator(Validator::Int64Between {
                    min: WAIT_TIMEOUT_SECS.0,
                    max: WAIT_TIMEOUT_SECS.1,
                }),
            )
    }
}

fn bounded(attribute: &str, value: i64, (min, max): (i64, i64)) -> Result<u64> {
    if !(min..=max).contains(&value) {
        return Err(ProviderError::attribute(
            attribute,
            "Value out of range",
            format!("{} must be between {} and {}", value, min, max),
        ));
    }
    Ok(value.unsigned_abs())
}

fn parse_endpoint(attribute: &str, value: Option<String>, default: &str) -> Result<Url> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| {
        ProviderError::attribute(
            attribute,
            "Invalid endpoint",
            format!("{:?} is not a valid URL: {}", raw, e),
        )
    })
}
