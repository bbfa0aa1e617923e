//! Daily emergency brake for provider usage.
//!
//! Counts accepted provider calls in a 24 hour window. Once the count
//! reaches the activation threshold the brake latches on and stays on until
//! the window has been open for 24 hours, at which point counter and latch
//! reset together. While on, calls are refused without being counted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for the emergency brake.
#[derive(Debug, Clone)]
pub struct EmergencyBrakeConfig {
    /// Accepted calls per window that latch the brake.
    pub activation_threshold: u32,
    /// Window length.
    pub reset_after: Duration,
}

impl Default for EmergencyBrakeConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 10,
            reset_after: Duration::hours(24),
        }
    }
}

/// Daily hard cap state.
#[derive(Debug, Clone)]
pub struct EmergencyBrake {
    config: EmergencyBrakeConfig,
    window_started_at: DateTime<Utc>,
    daily_count: u32,
    activated_at: Option<DateTime<Utc>>,
}

impl EmergencyBrake {
    pub fn new(config: EmergencyBrakeConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            window_started_at: now,
            daily_count: 0,
            activated_at: None,
        }
    }

    /// Reset counter and latch when the window has elapsed.
    fn roll_window(&mut self, now: DateTime<Utc>) {
        if now - self.window_started_at >= self.config.reset_after {
            if self.activated_at.is_some() {
                tracing::info!(
                    previous_count = self.daily_count,
                    "Emergency brake reset after daily window elapsed"
                );
            }
            self.window_started_at = now;
            self.daily_count = 0;
            self.activated_at = None;
        }
    }

    /// Whether the brake currently refuses calls.
    pub fn is_engaged(&mut self, now: DateTime<Utc>) -> bool {
        self.roll_window(now);
        self.activated_at.is_some()
    }

    /// Count an accepted call, latching the brake at the threshold.
    pub fn record_call(&mut self, now: DateTime<Utc>) {
        self.roll_window(now);
        self.daily_count += 1;
        if self.activated_at.is_none() && self.daily_count >= self.config.activation_threshold {
            self.activated_at = Some(now);
            tracing::warn!(
                daily_count = self.daily_count,
                threshold = self.config.activation_threshold,
                "Emergency brake engaged; provider calls suspended until the daily window resets"
            );
        }
    }

    /// When the current window ends.
    pub fn resets_at(&self) -> DateTime<Utc> {
        self.window_started_at + self.config.reset_after
    }

    pub fn stats(&self) -> EmergencyBrakeStats {
        EmergencyBrakeStats {
            engaged: self.activated_at.is_some(),
            daily_count: self.daily_count,
            activation_threshold: self.config.activation_threshold,
            activated_at: self.activated_at,
            resets_at: self.resets_at(),
        }
    }
}

/// Snapshot of the brake for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyBrakeStats {
    pub engaged: bool,
    pub daily_count: u32,
    pub activation_threshold: u32,
    pub activated_at: Option<DateTime<Utc>>,
    pub resets_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brake(threshold: u32, now: DateTime<Utc>) -> EmergencyBrake {
        EmergencyBrake::new(
            EmergencyBrakeConfig {
                activation_threshold: threshold,
                ..EmergencyBrakeConfig::default()
            },
            now,
        )
    }

    #[test]
    fn test_latches_at_threshold() {
        let now = Utc::now();
        let mut b = brake(3, now);

        for _ in 0..2 {
            assert!(!b.is_engaged(now));
            b.record_call(now);
        }
        assert!(!b.is_engaged(now));
        b.record_call(now);
        assert!(b.is_engaged(now));
        assert_eq!(b.stats().daily_count, 3);
    }

    #[test]
    fn test_stays_engaged_within_window() {
        let now = Utc::now();
        let mut b = brake(1, now);
        b.record_call(now);
        assert!(b.is_engaged(now + Duration::hours(23)));
    }

    #[test]
    fn test_resets_after_24_hours() {
        let now = Utc::now();
        let mut b = brake(1, now);
        b.record_call(now);
        assert!(b.is_engaged(now));

        let tomorrow = now + Duration::hours(24);
        assert!(!b.is_engaged(tomorrow));
        assert_eq!(b.stats().daily_count, 0);
        assert_eq!(b.resets_at(), tomorrow + Duration::hours(24));
    }
}
