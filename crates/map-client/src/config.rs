//! Client configuration.

use crate::backoff::Backoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the connection manager and its sessions.
///
/// Every field has a default, so a TOML file only needs to name the values
/// it overrides:
///
/// ```toml
/// cluster_name = "dev"
/// backoff_base_ms = 200
/// backoff_cap_ms = 10000
/// max_wait_attempts = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Cluster name presented during the handshake.
    pub cluster_name: String,

    /// Optional credentials presented during the handshake.
    pub username: Option<String>,
    pub password: Option<String>,

    /// First reconnect delay.
    pub backoff_base_ms: u64,

    /// Largest reconnect delay.
    pub backoff_cap_ms: u64,

    /// Attempts made by the initial connect before giving up.
    pub startup_attempts: u32,

    /// Reconnect attempts a caller of `with_session` will sit through before
    /// failing with `Unavailable`. `None` waits forever.
    pub max_wait_attempts: Option<u32>,

    /// Requests a session may have outstanding at once.
    pub max_in_flight: usize,

    /// Per-request timeout.
    pub operation_timeout_ms: u64,

    /// Health check cadence; 0 disables the background check.
    pub health_check_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster_name: "dev".to_string(),
            username: None,
            password: None,
            backoff_base_ms: 200,
            backoff_cap_ms: 10_000,
            startup_attempts: 3,
            max_wait_attempts: Some(30),
            max_in_flight: 1,
            operation_timeout_ms: 5_000,
            health_check_interval_ms: 2_000,
        }
    }
}

impl ClientConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_cap_ms),
        )
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Option<Duration> {
        (self.health_check_interval_ms > 0)
            .then(|| Duration::from_millis(self.health_check_interval_ms))
    }

    /// Reject values the manager cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.startup_attempts == 0 {
            return Err("startup_attempts must be at least 1".to_string());
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be at least 1".to_string());
        }
        if self.operation_timeout_ms == 0 {
            return Err("operation_timeout_ms must be greater than 0".to_string());
        }
        if self.backoff_base_ms == 0 {
            return Err("backoff_base_ms must be greater than 0".to_string());
        }
        if self.username.is_some() != self.password.is_some() {
            return Err("username and password must be set together".to_string());
        }
        Ok(())
    }

    /// Set the backoff bounds.
    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self.backoff_cap_ms = cap.as_millis() as u64;
        self
    }

    /// Set the `with_session` retry budget.
    pub fn with_max_wait_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_wait_attempts = attempts;
        self
    }

    /// Set the number of initial connect attempts.
    pub fn with_startup_attempts(mut self, attempts: u32) -> Self {
        self.startup_attempts = attempts;
        self
    }

    /// Set the health check cadence; `None` disables it.
    pub fn with_health_check_interval(mut self, interval: Option<Duration>) -> Self {
        self.health_check_interval_ms = interval.map_or(0, |d| d.as_millis() as u64);
        self
    }

    /// Set the handshake credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }
}
