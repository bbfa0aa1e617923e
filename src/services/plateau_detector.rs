//! Plateau detection over the three most recent sessions.

use crate::domain::models::{
    ExerciseSession, PlateauDetection, PlateauSeverity, StagnantMetrics, MIN_PLATEAU_DURATION,
};
use crate::services::progression_engine::{analyze_sessions, sort_newest_first, MAX_CONFIDENCE};

/// Sessions examined for stagnation.
pub const DETECTION_WINDOW: usize = 3;

/// Weight range (kg) below which weight counts as stagnant.
const WEIGHT_RANGE_THRESHOLD: f64 = 1.0;

/// Rep range below which reps count as stagnant.
const REP_RANGE_THRESHOLD: u32 = 2;

/// Volume range relative to mean volume below which volume counts as stagnant.
const VOLUME_VARIATION_THRESHOLD: f64 = 0.05;

/// Stagnant metrics required to call a plateau.
const MIN_STAGNANT_METRICS: u32 = 2;

/// Detect a plateau on one exercise. `None` when fewer than three sessions
/// exist or fewer than two metrics stagnated.
pub fn detect_plateau(exercise_id: &str, sessions: &[ExerciseSession]) -> Option<PlateauDetection> {
    if sessions.len() < DETECTION_WINDOW {
        return None;
    }

    let mut sorted = sessions.to_vec();
    sort_newest_first(&mut sorted);

    let stagnant = stagnant_metrics(&sorted[..DETECTION_WINDOW]);
    if stagnant.count() < MIN_STAGNANT_METRICS {
        return None;
    }
    let plateau_type = stagnant.primary()?;

    let duration = plateau_duration(&sorted);
    let severity = classify_severity(duration, stagnant.count());
    let analysis = analyze_sessions(exercise_id, &sorted);

    Some(PlateauDetection {
        exercise_id: exercise_id.to_string(),
        plateau_duration: duration,
        last_progress_date: analysis.last_progress_date,
        plateau_type,
        severity,
        confidence_level: plateau_confidence(duration, stagnant.count()),
        stagnant_metrics: stagnant,
        current_weight: analysis.current_weight,
        current_reps: analysis.current_reps,
        current_sets: analysis.current_sets,
        suggested_interventions: Vec::new(),
    })
}

/// Which of weight, reps, and volume failed to move across `window`.
pub fn stagnant_metrics(window: &[ExerciseSession]) -> StagnantMetrics {
    let weights: Vec<f64> = window.iter().map(ExerciseSession::max_weight).collect();
    let reps: Vec<u32> = window.iter().map(ExerciseSession::max_reps).collect();
    let volumes: Vec<f64> = window.iter().map(ExerciseSession::total_volume).collect();

    let rep_range = reps.iter().max().unwrap_or(&0) - reps.iter().min().unwrap_or(&0);

    StagnantMetrics {
        weight: range(&weights) < WEIGHT_RANGE_THRESHOLD,
        reps: rep_range < REP_RANGE_THRESHOLD,
        volume: relative_range(&volumes) < VOLUME_VARIATION_THRESHOLD,
    }
}

fn range(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    if values.is_empty() {
        0.0
    } else {
        max - min
    }
}

#[allow(clippy::cast_precision_loss)]
fn relative_range(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    range(values) / mean
}

/// Consecutive most-recent sessions without a weight increase over their
/// predecessor, never below the detection window.
pub fn plateau_duration(newest_first: &[ExerciseSession]) -> u32 {
    let mut run: u32 = 1;
    for pair in newest_first.windows(2) {
        if pair[0].max_weight() > pair[1].max_weight() {
            break;
        }
        run += 1;
    }
    run.max(MIN_PLATEAU_DURATION)
}

/// Severity from plateau length, escalated by the number of stagnant
/// metrics once the plateau outlasts the minimum window.
pub fn classify_severity(duration: u32, stagnant_count: u32) -> PlateauSeverity {
    let beyond_window = duration > MIN_PLATEAU_DURATION;
    if duration >= 6 || (stagnant_count >= 3 && beyond_window) {
        PlateauSeverity::Severe
    } else if duration >= 4 || (stagnant_count >= 2 && beyond_window) {
        PlateauSeverity::Moderate
    } else {
        PlateauSeverity::Mild
    }
}

fn plateau_confidence(duration: u32, stagnant_count: u32) -> f64 {
    let extra_sessions = f64::from(duration.saturating_sub(MIN_PLATEAU_DURATION));
    (0.5 + 0.1 * f64::from(stagnant_count) + 0.05 * extra_sessions).min(MAX_CONFIDENCE)
}
