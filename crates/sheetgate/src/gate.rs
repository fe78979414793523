// Gate state machine — drives one mounted gate from the password form
// through lockout and token issuance.
//
// Attempt and lockout counters live on the `GateSession` value and die
// with it; only the issued token survives, via the token manager.

use chrono::{DateTime, TimeDelta, Utc};

use sheetgate_core::error::{ErrorCode, GateError, SheetgateError};
use sheetgate_core::logger::GateLogger;
use sheetgate_core::options::GateOptions;
use sheetgate_core::utils::{time, url as urlutil};

use crate::client::AuthClient;
use crate::crypto::{hasher, random};
use crate::token::TokenManager;

/// Where a successful submission sends the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// In-app route change.
    Internal(String),
    /// Full browser navigation.
    External(String),
}

impl Navigation {
    fn classify(destination: &str) -> Self {
        if urlutil::is_internal_path(destination) {
            Self::Internal(destination.to_string())
        } else {
            Self::External(destination.to_string())
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Internal(t) | Self::External(t) => t,
        }
    }
}

/// Gate UI state.
#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    /// Showing the password form.
    Idle,
    /// A submission is in flight.
    Submitting,
    /// Admitted; the caller should navigate.
    Authenticated { destination: Navigation },
    /// A transient error message, visible until `dismiss_at`.
    Errored {
        message: String,
        dismiss_at: DateTime<Utc>,
    },
    /// Attempts exhausted; submissions ignored until `until`.
    LockedOut { until: DateTime<Utc> },
}

/// One mounted gate instance.
pub struct GateSession {
    options: GateOptions,
    manager: TokenManager,
    client: Option<AuthClient>,
    logger: GateLogger,
    state: GateState,
    attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    token_ttl: TimeDelta,
    lockout_duration: TimeDelta,
    error_dismiss_after: TimeDelta,
}

impl std::fmt::Debug for GateSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSession")
            .field("gate_id", &self.options.gate_id)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl GateSession {
    pub fn new(options: GateOptions, manager: TokenManager) -> Result<Self, SheetgateError> {
        options.validate()?;
        let token_ttl = parse_delta(&options.token_ttl)?;
        let lockout_duration = parse_delta(&options.lockout_duration)?;
        let error_dismiss_after = parse_delta(&options.error_dismiss_after)?;
        let client = options.auth_endpoint.as_deref().map(AuthClient::new);

        Ok(Self {
            options,
            manager,
            client,
            logger: GateLogger::default(),
            state: GateState::Idle,
            attempts: 0,
            locked_until: None,
            token_ttl,
            lockout_duration,
            error_dismiss_after,
        })
    }

    pub fn with_logger(mut self, logger: GateLogger) -> Self {
        self.client = self.client.map(|c| c.with_logger(logger.clone()));
        self.logger = logger;
        self
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Submit a password. `current_location` is the page URL the form
    /// lives on; a `next` query parameter there overrides the
    /// configured destination.
    pub async fn submit(&mut self, password: &str, current_location: Option<&str>) -> &GateState {
        let now = Utc::now();

        if let Some(until) = self.locked_until {
            if now < until {
                // Locked: the submission is ignored entirely. No
                // hashing, no attempt change, no network call.
                return &self.state;
            }
            self.locked_until = None;
            self.attempts = 0;
            self.state = GateState::Idle;
        }

        self.state = GateState::Submitting;

        match self.attempt(password, current_location, now).await {
            Ok(destination) => {
                self.attempts = 0;
                self.state = GateState::Authenticated { destination };
            }
            Err(err) if err.code == ErrorCode::AuthenticationFailure => {
                self.attempts += 1;
                if self.attempts >= self.options.max_attempts {
                    let until = now + self.lockout_duration;
                    self.locked_until = Some(until);
                    self.logger.warn(&format!(
                        "gate {} locked after {} failed attempts",
                        self.options.gate_id, self.attempts
                    ));
                    self.state = GateState::LockedOut { until };
                } else {
                    self.state = GateState::Errored {
                        message: err.to_string(),
                        dismiss_at: now + self.error_dismiss_after,
                    };
                }
            }
            Err(err) => {
                // Infrastructure fault, not a wrong password: surfaced
                // without consuming an attempt.
                self.logger.error(&format!("gate submission failed: {err}"));
                self.state = GateState::Errored {
                    message: err.to_string(),
                    dismiss_at: now + self.error_dismiss_after,
                };
            }
        }
        &self.state
    }

    /// Advance timer-driven transitions: auto-dismiss of transient
    /// errors and lockout expiry. Call from the embedder's tick.
    pub fn tick(&mut self) {
        let now = Utc::now();
        match &self.state {
            GateState::Errored { dismiss_at, .. } if now >= *dismiss_at => {
                self.state = GateState::Idle;
            }
            GateState::LockedOut { until } if now >= *until => {
                self.locked_until = None;
                self.attempts = 0;
                self.state = GateState::Idle;
            }
            _ => {}
        }
    }

    /// Whether a live token admits the visitor to `path`.
    pub async fn is_admitted(&self, path: &str) -> bool {
        self.manager.is_token_valid(path).await
    }

    /// Drop the token for a destination and return to the form.
    pub async fn logout(&mut self, destination: &str) {
        let scope = urlutil::destination_scope(destination);
        self.manager.clear_token(&scope).await;
        self.state = GateState::Idle;
    }

    async fn attempt(
        &self,
        password: &str,
        current_location: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Navigation, GateError> {
        if password.is_empty() {
            return Err(GateError::authentication_failure());
        }

        let deep_link = current_location.and_then(urlutil::next_param);

        if let Some(client) = &self.client {
            let hashed = hasher::generate_hash_with_mode(
                password,
                &self.options.gate_id,
                self.options.salt_mode,
            )?;
            let issued = client.authenticate(&self.options.gate_id, &hashed).await?;
            let destination = deep_link.unwrap_or_else(|| self.options.destination.clone());
            let expires_at = issued.expires_at.unwrap_or(now + self.token_ttl);
            self.persist(&destination, &issued.token, expires_at).await?;
            return Ok(Navigation::classify(&destination));
        }

        let configured = if self.options.routes.is_empty() {
            match &self.options.password {
                Some(pw) if hasher::verify_local(password, pw, &self.options.gate_id)? => {
                    self.options.destination.clone()
                }
                _ => return Err(GateError::authentication_failure()),
            }
        } else {
            // First matching route wins; which entry mismatched is
            // never revealed.
            let mut matched = None;
            for route in &self.options.routes {
                if hasher::verify_local(password, &route.password, &self.options.gate_id)? {
                    matched = Some(route.destination.clone());
                    break;
                }
            }
            matched.ok_or_else(GateError::authentication_failure)?
        };

        let destination = deep_link.unwrap_or(configured);
        let token = random::generate_token(random::TOKEN_LEN);
        self.persist(&destination, &token, now + self.token_ttl).await?;
        Ok(Navigation::classify(&destination))
    }

    async fn persist(
        &self,
        destination: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), GateError> {
        let scope = urlutil::destination_scope(destination);
        self.manager.store_token(&scope, token, expires_at).await
    }
}

fn parse_delta(value: &str) -> Result<TimeDelta, SheetgateError> {
    let millis = time::ms(value).map_err(SheetgateError::Config)?;
    Ok(TimeDelta::milliseconds(millis as i64))
}
