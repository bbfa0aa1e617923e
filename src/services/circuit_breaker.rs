//! Circuit breaker for the analysis provider.
//!
//! Counts consecutive provider failures and stops calling the provider for a
//! cooldown once a threshold is reached. After the cooldown one probe call is
//! let through; its outcome closes or re-opens the circuit.
//!
//! The breaker is plain synchronous state. Callers evaluate and mutate it
//! inside one critical section so two concurrent requests can never both
//! observe a closed circuit and fail through together.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::{bounded_secs, CircuitBreakerSettings};

/// Configuration for the circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub open_timeout: Duration,
    /// Whether the breaker is enforced at all.
    pub enabled: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            open_timeout: Duration::minutes(10),
            enabled: true,
        }
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold.max(1),
            open_timeout: Duration::seconds(i64::try_from(bounded_secs(settings.cooldown_secs)).unwrap_or(0)),
            enabled: true,
        }
    }
}

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are short-circuited.
    Open,
    /// Cooldown elapsed; one probe is in flight.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Result of a circuit breaker check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitCheckResult {
    /// Request is allowed.
    Allowed,
    /// Cooldown elapsed; this request is the probe.
    Testing,
    /// Request is blocked by an open circuit.
    Blocked { retry_after: DateTime<Utc> },
}

impl CircuitCheckResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed | Self::Testing)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Circuit breaker state for one provider client.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    open_count: u32,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            last_error: None,
            open_count: 0,
        }
    }

    /// Check whether a request may proceed, moving an expired open circuit to
    /// half-open.
    pub fn check(&mut self, now: DateTime<Utc>) -> CircuitCheckResult {
        if !self.config.enabled {
            return CircuitCheckResult::Allowed;
        }

        match self.state {
            CircuitState::Closed => CircuitCheckResult::Allowed,
            CircuitState::HalfOpen => CircuitCheckResult::Blocked {
                retry_after: now,
            },
            CircuitState::Open => {
                let opened_at = self.opened_at.unwrap_or(now);
                let retry_after = self.retry_at(opened_at);
                if now >= retry_after {
                    self.state = CircuitState::HalfOpen;
                    CircuitCheckResult::Testing
                } else {
                    CircuitCheckResult::Blocked { retry_after }
                }
            }
        }
    }

    /// Record a failed call.
    pub fn record_failure(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.consecutive_failures += 1;
        self.last_error = Some(error.into());

        let should_open = match self.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => self.consecutive_failures >= self.config.failure_threshold,
            CircuitState::Open => false,
        };
        if should_open {
            self.open(now);
        }
    }

    /// Record a successful call. One success closes the circuit.
    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    /// End of the cooldown that started at `opened_at`, saturating at the
    /// latest representable instant.
    fn retry_at(&self, opened_at: DateTime<Utc>) -> DateTime<Utc> {
        opened_at
            .checked_add_signed(self.config.open_timeout)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn open(&mut self, now: DateTime<Utc>) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.open_count += 1;
    }

    /// Manually reset the circuit.
    pub fn reset(&mut self) {
        self.record_success();
        self.last_error = None;
        self.open_count = 0;
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            opened_at: self.opened_at,
            retry_after: self.opened_at.map(|at| self.retry_at(at)),
            open_count: self.open_count,
            last_error: self.last_error.clone(),
        }
    }
}

/// Snapshot of the breaker for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub retry_after: Option<DateTime<Utc>>,
    pub open_count: u32,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig::default())
    }

    #[test]
    fn test_circuit_starts_closed() {
        let mut cb = breaker();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check(Utc::now()).is_allowed());
    }

    #[test]
    fn test_circuit_opens_at_threshold() {
        let now = Utc::now();
        let mut cb = breaker();

        cb.record_failure("timeout", now);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.check(now).is_allowed());

        cb.record_failure("timeout", now);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.check(now + Duration::minutes(9)).is_blocked());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let now = Utc::now();
        let mut cb = breaker();
        cb.record_failure("boom", now);
        cb.record_success();
        cb.record_failure("boom", now);

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 1);
    }

    #[test]
    fn test_cooldown_allows_single_probe() {
        let now = Utc::now();
        let mut cb = breaker();
        cb.record_failure("a", now);
        cb.record_failure("b", now);

        let later = now + Duration::minutes(10);
        assert_eq!(cb.check(later), CircuitCheckResult::Testing);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        // a second caller while the probe is in flight is still blocked
        assert!(cb.check(later).is_blocked());
    }

    #[test]
    fn test_probe_success_closes() {
        let now = Utc::now();
        let mut cb = breaker();
        cb.record_failure("a", now);
        cb.record_failure("b", now);
        cb.check(now + Duration::minutes(11));
        cb.record_success();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn test_probe_failure_reopens() {
        let now = Utc::now();
        let mut cb = breaker();
        cb.record_failure("a", now);
        cb.record_failure("b", now);

        let later = now + Duration::minutes(11);
        cb.check(later);
        cb.record_failure("c", later);

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.stats().open_count, 2);
        assert!(cb.check(later + Duration::minutes(5)).is_blocked());
    }

    #[test]
    fn test_disabled_breaker_always_allows() {
        let mut cb = CircuitBreaker::new(CircuitBreakerConfig {
            enabled: false,
            ..CircuitBreakerConfig::default()
        });
        let now = Utc::now();
        cb.record_failure("a", now);
        cb.record_failure("b", now);
        assert!(cb.check(now).is_allowed());
    }

    #[test]
    fn test_from_settings() {
        let config = CircuitBreakerConfig::from(&CircuitBreakerSettings {
            failure_threshold: 0,
            cooldown_secs: 30,
        });
        assert_eq!(config.failure_threshold, 1);
        assert_eq!(config.open_timeout, Duration::seconds(30));
    }

    #[test]
    fn test_huge_cooldown_is_clamped() {
        let config = CircuitBreakerConfig::from(&CircuitBreakerSettings {
            failure_threshold: 2,
            cooldown_secs: u64::MAX,
        });
        let max = i64::try_from(crate::domain::models::MAX_DURATION_SECS).unwrap();
        assert_eq!(config.open_timeout, Duration::seconds(max));

        let mut cb = CircuitBreaker::new(config);
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        cb.record_failure("a", late);
        cb.record_failure("b", late);
        assert_eq!(cb.check(late), CircuitCheckResult::Blocked { retry_after: DateTime::<Utc>::MAX_UTC });
        assert_eq!(cb.stats().retry_after, Some(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_reset() {
        let now = Utc::now();
        let mut cb = breaker();
        cb.record_failure("a", now);
        cb.record_failure("b", now);
        cb.reset();

        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.open_count, 0);
        assert!(stats.last_error.is_none());
    }
}
