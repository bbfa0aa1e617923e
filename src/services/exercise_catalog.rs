//! Static exercise metadata.
//!
//! Classifies exercises as compound or isolation and lists known
//! variations with the fraction of working weight expected to transfer.
//! Lookups normalize the name (case, spaces, underscores) but the rest of
//! the system matches exercises by their exact logged name.

/// Movement class, which drives increments and rep targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    Compound,
    Isolation,
}

impl ExerciseKind {
    /// Weight added per progression step, in kg.
    pub const fn weight_increment(self) -> f64 {
        match self {
            Self::Compound => 2.5,
            Self::Isolation => 1.0,
        }
    }

    /// Reps at which the next step becomes a weight increase.
    pub const fn rep_ceiling(self) -> u32 {
        match self {
            Self::Compound => 8,
            Self::Isolation => 12,
        }
    }

    /// Reps to restart from after a weight increase.
    pub const fn rep_baseline(self) -> u32 {
        match self {
            Self::Compound => 5,
            Self::Isolation => 8,
        }
    }

    /// Lowest sensible working weight, in kg.
    pub const fn minimum_weight(self) -> f64 {
        match self {
            Self::Compound => 20.0,
            Self::Isolation => 2.5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compound => "compound",
            Self::Isolation => "isolation",
        }
    }
}

/// A related movement and its expected weight transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variation {
    pub name: &'static str,
    pub weight_multiplier: f64,
}

const COMPOUND_EXERCISES: &[&str] = &[
    "bench-press",
    "incline-bench-press",
    "close-grip-bench-press",
    "squat",
    "back-squat",
    "front-squat",
    "deadlift",
    "sumo-deadlift",
    "romanian-deadlift",
    "overhead-press",
    "military-press",
    "push-press",
    "barbell-row",
    "bent-over-row",
    "pendlay-row",
    "t-bar-row",
    "pull-up",
    "chin-up",
    "dip",
    "lunge",
    "hip-thrust",
    "leg-press",
    "power-clean",
    "clean-and-jerk",
    "snatch",
];

const fn v(name: &'static str, weight_multiplier: f64) -> Variation {
    Variation {
        name,
        weight_multiplier,
    }
}

const VARIATIONS: &[(&str, &[Variation])] = &[
    (
        "bench-press",
        &[
            v("paused-bench-press", 0.9),
            v("close-grip-bench-press", 0.9),
            v("incline-bench-press", 0.8),
            v("dumbbell-bench-press", 0.75),
        ],
    ),
    (
        "squat",
        &[v("pause-squat", 0.85), v("front-squat", 0.8), v("box-squat", 0.9)],
    ),
    (
        "back-squat",
        &[v("pause-squat", 0.85), v("front-squat", 0.8), v("box-squat", 0.9)],
    ),
    (
        "deadlift",
        &[
            v("deficit-deadlift", 0.85),
            v("romanian-deadlift", 0.7),
            v("sumo-deadlift", 0.95),
        ],
    ),
    (
        "overhead-press",
        &[v("push-press", 1.15), v("z-press", 0.8), v("seated-dumbbell-press", 0.7)],
    ),
    (
        "barbell-row",
        &[v("pendlay-row", 0.9), v("t-bar-row", 0.9), v("chest-supported-row", 0.75)],
    ),
    (
        "pull-up",
        &[v("chin-up", 1.05), v("neutral-grip-pull-up", 1.0), v("lat-pulldown", 0.9)],
    ),
    (
        "bicep-curl",
        &[v("hammer-curl", 1.0), v("preacher-curl", 0.8), v("incline-dumbbell-curl", 0.75)],
    ),
    (
        "tricep-extension",
        &[v("skull-crusher", 0.9), v("cable-pushdown", 1.1), v("overhead-cable-extension", 0.85)],
    ),
    (
        "lateral-raise",
        &[v("cable-lateral-raise", 0.7), v("lean-away-lateral-raise", 0.8)],
    ),
    (
        "leg-extension",
        &[v("single-leg-extension", 0.5), v("sissy-squat", 0.0)],
    ),
    (
        "leg-curl",
        &[v("seated-leg-curl", 1.0), v("nordic-curl", 0.0)],
    ),
];

/// Canonical lookup form: lowercase, words joined by hyphens.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn classify(name: &str) -> ExerciseKind {
    let normalized = normalize_name(name);
    if COMPOUND_EXERCISES.contains(&normalized.as_str()) {
        ExerciseKind::Compound
    } else {
        ExerciseKind::Isolation
    }
}

pub fn is_compound(name: &str) -> bool {
    classify(name) == ExerciseKind::Compound
}

/// Known variations for an exercise; empty when none are listed.
pub fn variations(name: &str) -> &'static [Variation] {
    let normalized = normalize_name(name);
    VARIATIONS
        .iter()
        .find(|(key, _)| *key == normalized)
        .map_or(&[], |(_, list)| list)
}

/// Fallback exercises when a user has no history.
pub const DEFAULT_TEMPLATE: &[(&str, f64)] = &[
    ("squat", 40.0),
    ("bench-press", 30.0),
    ("barbell-row", 30.0),
    ("overhead-press", 20.0),
    ("romanian-deadlift", 40.0),
    ("bicep-curl", 8.0),
    ("tricep-extension", 8.0),
];
