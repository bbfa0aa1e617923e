//! Typed parsing of provider JSON payloads.
//!
//! Provider output is loosely structured. Field names may be camelCase or
//! snake_case, numbers may arrive as strings ("62.5kg"), and lists may be
//! wrapped in an object or returned bare. Entries missing the one field that
//! makes them usable are skipped; a payload with no usable entries is an
//! invalid response.

use serde_json::Value;

use crate::domain::errors::ProviderError;
use crate::domain::models::{
    InterventionPlan, InterventionSuggestion, InterventionType, Priority, ProgressionType,
    ProviderSuggestion, WorkoutSuggestion, WorkoutSuggestionSource,
};

const DEFAULT_PROVIDER_CONFIDENCE: f64 = 0.7;
const DEFAULT_SETS: u32 = 3;
const DEFAULT_REPS: u32 = 8;
const DEFAULT_REST_SECONDS: u32 = 90;

/// The shape a provider call is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Progression,
    BatchProgression,
    PlateauInterventions,
    WorkoutPlan,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Progression => "progression",
            Self::BatchProgression => "batch_progression",
            Self::PlateauInterventions => "plateau_interventions",
            Self::WorkoutPlan => "workout_plan",
        }
    }

    /// Check that `value` parses as this kind.
    pub fn validate(self, value: &Value) -> Result<(), ProviderError> {
        match self {
            Self::Progression => parse_progression(value).map(drop),
            Self::BatchProgression => parse_batch_progressions(value).map(drop),
            Self::PlateauInterventions => parse_interventions(value).map(drop),
            Self::WorkoutPlan => parse_workout_plan(value).map(drop),
        }
    }
}

/// A single progression suggestion. The exercise id is left empty when the
/// payload does not name one.
pub fn parse_progression(value: &Value) -> Result<ProviderSuggestion, ProviderError> {
    let body = field(value, &["suggestion", "progression"])
        .filter(|inner| inner.is_object())
        .unwrap_or(value);
    progression_entry(body).ok_or_else(|| {
        ProviderError::InvalidResponse("progression payload has no suggested weight".to_string())
    })
}

/// Batch suggestions. Entries without an exercise id are dropped.
pub fn parse_batch_progressions(value: &Value) -> Result<Vec<ProviderSuggestion>, ProviderError> {
    let entries = list(value, &["suggestions", "progressions", "exercises"])
        .ok_or_else(|| ProviderError::InvalidResponse("batch payload has no suggestion list".to_string()))?;

    let suggestions: Vec<_> = entries
        .iter()
        .filter_map(|entry| {
            let exercise_id = text(
                entry,
                &["exerciseId", "exercise_id", "exerciseName", "exercise_name", "exercise", "name"],
            )?;
            let mut suggestion = progression_entry(entry)?;
            suggestion.exercise_id = exercise_id;
            Some(suggestion)
        })
        .collect();

    if suggestions.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "batch payload has no usable suggestions".to_string(),
        ));
    }
    Ok(suggestions)
}

pub fn parse_interventions(value: &Value) -> Result<Vec<InterventionSuggestion>, ProviderError> {
    let entries = list(value, &["interventions", "suggestions"]).ok_or_else(|| {
        ProviderError::InvalidResponse("intervention payload has no intervention list".to_string())
    })?;

    let interventions: Vec<_> = entries.iter().filter_map(intervention_entry).collect();
    if interventions.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "intervention payload has no recognized intervention types".to_string(),
        ));
    }
    Ok(interventions)
}

pub fn parse_workout_plan(value: &Value) -> Result<Vec<WorkoutSuggestion>, ProviderError> {
    let entries = list(value, &["exercises", "workout", "suggestions"]).ok_or_else(|| {
        ProviderError::InvalidResponse("workout payload has no exercise list".to_string())
    })?;

    let exercises: Vec<_> = entries
        .iter()
        .filter_map(|entry| {
            let exercise_name = text(
                entry,
                &["exerciseName", "exercise_name", "name", "exercise"],
            )?;
            Some(WorkoutSuggestion {
                exercise_name,
                sets: count(entry, &["sets"]).unwrap_or(DEFAULT_SETS),
                reps: count(entry, &["reps"]).unwrap_or(DEFAULT_REPS),
                weight: number(entry, &["weight", "weightKg", "weight_kg"])
                    .unwrap_or(0.0)
                    .max(0.0),
                rest_seconds: count(entry, &["restSeconds", "rest_seconds", "rest"])
                    .unwrap_or(DEFAULT_REST_SECONDS),
                notes: text(entry, &["notes", "note"]).unwrap_or_default(),
                source: WorkoutSuggestionSource::Provider,
            })
        })
        .collect();

    if exercises.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "workout payload has no named exercises".to_string(),
        ));
    }
    Ok(exercises)
}

fn progression_entry(entry: &Value) -> Option<ProviderSuggestion> {
    let suggested_weight = number(entry, &["suggestedWeight", "suggested_weight", "weight"])?;
    let progression_type = text(entry, &["progressionType", "progression_type", "type"])
        .and_then(|kind| ProgressionType::from_str(&kind))
        .unwrap_or(ProgressionType::Weight);

    Some(ProviderSuggestion {
        exercise_id: String::new(),
        suggested_weight,
        suggested_reps: count(entry, &["suggestedReps", "suggested_reps", "reps"]).unwrap_or(0),
        suggested_sets: count(entry, &["suggestedSets", "suggested_sets", "sets"]).unwrap_or(0),
        progression_type,
        reasoning: text(entry, &["reasoning", "explanation", "rationale"]).unwrap_or_default(),
        confidence: confidence(entry, &["confidence", "confidenceLevel", "confidence_level"]),
        tips: text_list(entry, &["tips"]),
        risk_notes: text_list(entry, &["riskNotes", "risk_notes", "risks", "warnings"]),
    })
}

fn intervention_entry(entry: &Value) -> Option<InterventionSuggestion> {
    let intervention_type = text(entry, &["type", "interventionType", "intervention_type"])
        .and_then(|kind| InterventionType::from_str(&kind))?;

    let implementation = field(entry, &["implementation", "details", "parameters"])
        .cloned()
        .unwrap_or_else(|| entry.clone());

    Some(InterventionSuggestion {
        intervention_type,
        priority: text(entry, &["priority"])
            .and_then(|p| Priority::from_str(&p))
            .unwrap_or_default(),
        title: text(entry, &["title", "name"])
            .unwrap_or_else(|| intervention_type.as_str().replace('_', " ")),
        description: text(entry, &["description"]).unwrap_or_default(),
        implementation: InterventionPlan::Freeform {
            details: implementation,
        },
        reasoning: text(entry, &["reasoning", "rationale"]).unwrap_or_default(),
        expected_outcome: text(entry, &["expectedOutcome", "expected_outcome", "outcome"])
            .unwrap_or_default(),
        confidence_level: confidence(entry, &["confidence", "confidenceLevel", "confidence_level"]),
        estimated_effectiveness: confidence(
            entry,
            &["effectiveness", "estimatedEffectiveness", "estimated_effectiveness"],
        ),
    })
}

// ============================================================================
// Field access
// ============================================================================

fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let object = value.as_object()?;
    names
        .iter()
        .find_map(|name| object.get(*name))
        .filter(|v| !v.is_null())
}

/// A bare array, or the first named array field of an object.
fn list<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(_) => field(value, names)?.as_array(),
        _ => None,
    }
}

fn number(value: &Value, names: &[&str]) -> Option<f64> {
    let n = match field(value, names)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_alphabetic())
            .trim()
            .parse()
            .ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count(value: &Value, names: &[&str]) -> Option<u32> {
    number(value, names)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32)
}

fn confidence(value: &Value, names: &[&str]) -> f64 {
    number(value, names)
        .map_or(DEFAULT_PROVIDER_CONFIDENCE, |c| {
            // some models answer on a 0-100 scale
            if c > 1.0 {
                c / 100.0
            } else {
                c
            }
        })
        .clamp(0.0, 1.0)
}

fn text(value: &Value, names: &[&str]) -> Option<String> {
    field(value, names)?
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn text_list(value: &Value, names: &[&str]) -> Vec<String> {
    match field(value, names) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
