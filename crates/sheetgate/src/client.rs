// Remote auth client — POSTs the hashed credential to a configurable
// endpoint and maps the JSON verdict onto the error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sheetgate_core::error::GateError;
use sheetgate_core::logger::GateLogger;

/// Request body sent to the auth endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    gate_id: &'a str,
    hashed_password: &'a str,
    timestamp: i64,
}

/// Response body expected from the auth endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// A token issued by the remote endpoint. `expires_at` is absent when
/// the server leaves the lifetime to the caller's configuration.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct AuthClient {
    endpoint: String,
    http: reqwest::Client,
    logger: GateLogger,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AuthClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
            logger: GateLogger::default(),
        }
    }

    pub fn with_logger(mut self, logger: GateLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Verify a hashed credential against the endpoint.
    ///
    /// Transport and protocol faults map to `NetworkError`; a negative
    /// verdict maps to the uniform `AuthenticationFailure`.
    pub async fn authenticate(
        &self,
        gate_id: &str,
        hashed_password: &str,
    ) -> Result<IssuedToken, GateError> {
        let body = AuthRequest {
            gate_id,
            hashed_password,
            timestamp: Utc::now().timestamp_millis(),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::network(format!("auth request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GateError::network(format!(
                "auth endpoint returned {status}"
            )));
        }

        let verdict: AuthResponse = response
            .json()
            .await
            .map_err(|e| GateError::network(format!("malformed auth response: {e}")))?;

        if !verdict.success {
            // The server's detail stays in the log; the caller sees the
            // uniform failure message.
            if let Some(detail) = verdict.error {
                self.logger.debug(&format!("auth denied for {gate_id}: {detail}"));
            }
            return Err(GateError::authentication_failure());
        }

        let token = verdict
            .token
            .ok_or_else(|| GateError::network("auth response missing token"))?;
        let expires_at = verdict
            .expires_at
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Ok(IssuedToken { token, expires_at })
    }
}
