// SheetgateOptions — the configuration tree for the gate and the
// ingestion pipeline.

use serde::{Deserialize, Serialize};

use crate::error::SheetgateError;
use crate::utils::time;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetgateOptions {
    /// Password gate configuration.
    #[serde(default)]
    pub gate: GateOptions,

    /// Ingestion pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineOptions,

    /// Spreadsheet fetch configuration.
    #[serde(default)]
    pub fetch: FetchOptions,
}

impl SheetgateOptions {
    /// Validate the whole tree. Call once at construction time so that
    /// later operations can assume well-formed values.
    pub fn validate(&self) -> Result<(), SheetgateError> {
        self.gate.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// How the credential hasher derives its salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaltMode {
    /// Salt is a digest of the gate id. The same gate always yields the
    /// same salt, so a verifier needs no stored salt. Weaker than a
    /// random salt; kept as the compatible default.
    #[default]
    Deterministic,
    /// A fresh random salt per hash, carried inside the hash string.
    Random,
}

/// One entry of the ordered password → destination route list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateRoute {
    pub password: String,
    pub destination: String,
}

/// Password gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateOptions {
    /// Identifier of the protected destination this gate guards.
    pub gate_id: String,

    /// Single-password mode. Ignored when `routes` is non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Ordered route list; the first matching entry wins.
    #[serde(default)]
    pub routes: Vec<GateRoute>,

    /// Remote verification endpoint. When set, credentials are checked
    /// by POSTing the hashed password there instead of locally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_endpoint: Option<String>,

    /// Destination used when no route matches a more specific one.
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Lifetime of an issued token, e.g. "15m", "24h".
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,

    /// Consecutive failures allowed before the gate locks.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long the gate stays locked after the limit is hit.
    #[serde(default = "default_lockout_duration")]
    pub lockout_duration: String,

    /// How long a transient error message stays visible.
    #[serde(default = "default_error_dismiss_after")]
    pub error_dismiss_after: String,

    /// Salt derivation mode for the credential hasher.
    #[serde(default)]
    pub salt_mode: SaltMode,
}

fn default_destination() -> String {
    "/".to_string()
}

fn default_token_ttl() -> String {
    "15m".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout_duration() -> String {
    "5m".to_string()
}

fn default_error_dismiss_after() -> String {
    "4s".to_string()
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            gate_id: String::new(),
            password: None,
            routes: Vec::new(),
            auth_endpoint: None,
            destination: default_destination(),
            token_ttl: default_token_ttl(),
            max_attempts: default_max_attempts(),
            lockout_duration: default_lockout_duration(),
            error_dismiss_after: default_error_dismiss_after(),
            salt_mode: SaltMode::default(),
        }
    }
}

impl GateOptions {
    pub fn validate(&self) -> Result<(), SheetgateError> {
        if self.gate_id.trim().is_empty() {
            return Err(SheetgateError::Config("gateId must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(SheetgateError::Config(
                "maxAttempts must be at least 1".into(),
            ));
        }
        if self.password.is_none() && self.routes.is_empty() && self.auth_endpoint.is_none() {
            return Err(SheetgateError::Config(
                "one of password, routes, or authEndpoint is required".into(),
            ));
        }
        for (name, value) in [
            ("tokenTtl", &self.token_ttl),
            ("lockoutDuration", &self.lockout_duration),
            ("errorDismissAfter", &self.error_dismiss_after),
        ] {
            time::duration(value)
                .map_err(|e| SheetgateError::Config(format!("invalid {name}: {e}")))?;
        }
        Ok(())
    }
}

/// Ingestion pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Reject unterminated quotes instead of consuming to end-of-input.
    #[serde(default)]
    pub strict_quotes: bool,

    /// How many leading records the column classifier samples.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Maximum number of y-axis series in a projection.
    #[serde(default = "default_max_series")]
    pub max_series: usize,
}

fn default_sample_size() -> usize {
    10
}

fn default_max_series() -> usize {
    5
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strict_quotes: false,
            sample_size: default_sample_size(),
            max_series: default_max_series(),
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), SheetgateError> {
        if self.sample_size == 0 {
            return Err(SheetgateError::Config(
                "sampleSize must be at least 1".into(),
            ));
        }
        if self.max_series == 0 {
            return Err(SheetgateError::Config("maxSeries must be at least 1".into()));
        }
        Ok(())
    }
}

/// Spreadsheet fetch configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOptions {
    /// API key for the authenticated values endpoint. Without it the
    /// public CSV export endpoint is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional auto-refresh interval, e.g. "30s". No interval means
    /// fetch-on-demand only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
}
