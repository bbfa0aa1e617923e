//! Hourly and per-user call caps for the analysis provider.
//!
//! Both caps use fixed windows that reset by wall-clock comparison when a
//! check observes the window has elapsed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// A counter that resets once `length` has passed since the window opened.
#[derive(Debug, Clone)]
pub struct UsageWindow {
    length: Duration,
    limit: u32,
    started_at: DateTime<Utc>,
    count: u32,
}

impl UsageWindow {
    pub fn new(length: Duration, limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            length,
            limit,
            started_at: now,
            count: 0,
        }
    }

    fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= self.length
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        if self.is_elapsed(now) {
            self.started_at = now;
            self.count = 0;
        }
    }

    pub fn has_capacity(&mut self, now: DateTime<Utc>) -> bool {
        self.roll(now);
        self.count < self.limit
    }

    pub fn record(&mut self, now: DateTime<Utc>) {
        self.roll(now);
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Caps on provider calls: one window overall per hour, one per user per day.
#[derive(Debug, Clone)]
pub struct UsageLimits {
    hourly: UsageWindow,
    per_user: HashMap<String, UsageWindow>,
    per_user_daily_limit: u32,
}

/// Which cap refused a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitExceeded {
    Hourly,
    PerUser,
}

impl UsageLimits {
    pub fn new(hourly_limit: u32, per_user_daily_limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            hourly: UsageWindow::new(Duration::hours(1), hourly_limit, now),
            per_user: HashMap::new(),
            per_user_daily_limit,
        }
    }

    /// Check both caps without counting. Per-user windows that have run out
    /// are dropped here so idle users do not accumulate.
    pub fn check(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<(), LimitExceeded> {
        self.per_user.retain(|_, window| !window.is_elapsed(now));
        if !self.hourly.has_capacity(now) {
            return Err(LimitExceeded::Hourly);
        }
        let limit = self.per_user_daily_limit;
        let user_window = self
            .per_user
            .entry(user_id.to_string())
            .or_insert_with(|| UsageWindow::new(Duration::hours(24), limit, now));
        if !user_window.has_capacity(now) {
            return Err(LimitExceeded::PerUser);
        }
        Ok(())
    }

    /// Count an accepted call against both caps.
    pub fn record(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.hourly.record(now);
        let limit = self.per_user_daily_limit;
        self.per_user
            .entry(user_id.to_string())
            .or_insert_with(|| UsageWindow::new(Duration::hours(24), limit, now))
            .record(now);
    }

    pub fn hourly_count(&self) -> u32 {
        self.hourly.count()
    }

    /// Users with an open daily window.
    pub fn tracked_users(&self) -> usize {
        self.per_user.len()
    }
}
