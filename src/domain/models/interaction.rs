//! Suggestion interactions and the per-user suggestions document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::alert::{NotificationSettings, PlateauAlert};

/// Interactions retained per user.
pub const MAX_INTERACTIONS: usize = 100;

/// Plateau alerts retained per user.
pub const MAX_PLATEAU_ALERTS: usize = 20;

/// What the user did with a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    Accepted,
    Dismissed,
    Modified,
    Viewed,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
            Self::Modified => "modified",
            Self::Viewed => "viewed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "accepted" | "accept" => Some(Self::Accepted),
            "dismissed" | "dismiss" => Some(Self::Dismissed),
            "modified" | "modify" => Some(Self::Modified),
            "viewed" | "view" => Some(Self::Viewed),
            _ => None,
        }
    }

    /// Whether the action is a verdict on the suggestion, as opposed to a view.
    pub fn is_response(&self) -> bool {
        !matches!(self, Self::Viewed)
    }
}

/// One logged interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionInteraction {
    pub exercise_id: String,
    pub action: InteractionAction,
    #[serde(default)]
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

/// The per-user document holding interactions, alerts, and notification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestionsDocument {
    #[serde(default)]
    pub interactions: Vec<SuggestionInteraction>,
    #[serde(default)]
    pub plateau_alerts: Vec<PlateauAlert>,
    #[serde(default)]
    pub notification_settings: NotificationSettings,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AiSuggestionsDocument {
    /// Append an interaction, keeping the most recent [`MAX_INTERACTIONS`].
    pub fn push_interaction(&mut self, interaction: SuggestionInteraction) {
        self.interactions.push(interaction);
        if self.interactions.len() > MAX_INTERACTIONS {
            let excess = self.interactions.len() - MAX_INTERACTIONS;
            self.interactions.drain(..excess);
        }
    }

    /// Merge new alerts in: one alert per exercise (newest wins), newest
    /// first, capped at [`MAX_PLATEAU_ALERTS`].
    pub fn merge_alerts(&mut self, alerts: Vec<PlateauAlert>) {
        let mut merged: Vec<PlateauAlert> = Vec::with_capacity(self.plateau_alerts.len() + alerts.len());
        let mut all: Vec<PlateauAlert> = self.plateau_alerts.drain(..).chain(alerts).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for alert in all {
            if !merged.iter().any(|m| m.exercise_id == alert.exercise_id) {
                merged.push(alert);
            }
        }
        merged.truncate(MAX_PLATEAU_ALERTS);
        self.plateau_alerts = merged;
    }

    pub fn alert_mut(&mut self, alert_id: &str) -> Option<&mut PlateauAlert> {
        self.plateau_alerts.iter_mut().find(|a| a.id == alert_id)
    }

    /// Number of alerts created at or after `since`.
    pub fn alerts_created_since(&self, since: DateTime<Utc>) -> usize {
        self.plateau_alerts.iter().filter(|a| a.created_at >= since).count()
    }
}

/// How well suggestions land with a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEffectiveness {
    pub total_suggestions: u64,
    pub accepted: u64,
    pub dismissed: u64,
    pub modified: u64,
    pub acceptance_rate: f64,
    pub dismissal_rate: f64,
    pub effectiveness_score: f64,
    pub recommendations: Vec<String>,
}
