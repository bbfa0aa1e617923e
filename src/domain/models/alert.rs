//! Plateau alerts and the per-user notification settings that gate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plateau::{InterventionSuggestion, PlateauDetection, PlateauSeverity};

/// Interventions attached to a single alert.
pub const MAX_ALERT_INTERVENTIONS: usize = 3;

/// Lifecycle of a plateau alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Active,
    Acknowledged,
    Dismissed,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Dismissed => "dismissed",
            Self::Resolved => "resolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dismissed | Self::Resolved)
    }
}

/// A persisted notification that an exercise has plateaued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauAlert {
    pub id: String,
    pub exercise_id: String,
    pub severity: PlateauSeverity,
    pub message: String,
    pub interventions: Vec<InterventionSuggestion>,
    pub created_at: DateTime<Utc>,
    pub last_shown: Option<DateTime<Utc>>,
    pub acknowledged: bool,
    pub dismissed: bool,
    pub dismiss_reason: Option<String>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub show_count: u32,
    pub status: AlertStatus,
}

impl PlateauAlert {
    pub fn new(
        plateau: &PlateauDetection,
        mut interventions: Vec<InterventionSuggestion>,
        now: DateTime<Utc>,
    ) -> Self {
        interventions.truncate(MAX_ALERT_INTERVENTIONS);
        Self {
            id: Uuid::new_v4().to_string(),
            exercise_id: plateau.exercise_id.clone(),
            severity: plateau.severity,
            message: format!(
                "{} has stalled for {} sessions ({} {} plateau)",
                plateau.exercise_id,
                plateau.plateau_duration,
                plateau.severity.as_str(),
                plateau.plateau_type.as_str()
            ),
            interventions,
            created_at: now,
            last_shown: None,
            acknowledged: false,
            dismissed: false,
            dismiss_reason: None,
            dismissed_at: None,
            show_count: 0,
            status: AlertStatus::Active,
        }
    }

    /// Mark as acknowledged. Terminal alerts are left untouched.
    pub fn acknowledge(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.acknowledged = true;
        self.status = AlertStatus::Acknowledged;
    }

    /// Mark as dismissed. Repeated dismissals keep the first reason and date.
    pub fn dismiss(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.dismissed = true;
        self.dismiss_reason = reason;
        self.dismissed_at = Some(now);
        self.status = AlertStatus::Dismissed;
    }

    pub fn resolve(&mut self) {
        if !self.status.is_terminal() {
            self.status = AlertStatus::Resolved;
        }
    }

    pub fn mark_shown(&mut self, now: DateTime<Utc>) {
        self.last_shown = Some(now);
        self.show_count += 1;
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

/// Per-user gates on plateau alert creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub plateau_alerts_enabled: bool,
    #[serde(default = "default_severities")]
    pub severities: Vec<PlateauSeverity>,
    #[serde(default = "default_max_daily_reminders")]
    pub max_daily_reminders: u32,
}

const fn default_true() -> bool {
    true
}

fn default_severities() -> Vec<PlateauSeverity> {
    PlateauSeverity::all().to_vec()
}

const fn default_max_daily_reminders() -> u32 {
    3
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            plateau_alerts_enabled: default_true(),
            severities: default_severities(),
            max_daily_reminders: default_max_daily_reminders(),
        }
    }
}

impl NotificationSettings {
    pub fn allows(&self, severity: PlateauSeverity) -> bool {
        self.plateau_alerts_enabled && self.severities.contains(&severity)
    }
}
