pub mod alert;
pub mod analytics;
pub mod config;
pub mod interaction;
pub mod plateau;
pub mod profile;
pub mod progression;
pub mod session;
pub mod suggestion;
pub mod workout_plan;

pub use alert::{AlertStatus, NotificationSettings, PlateauAlert, MAX_ALERT_INTERVENTIONS};
pub use analytics::ExerciseAnalytics;
pub use config::{
    bounded_secs, AiConfig, AnalysisConfig, CacheConfig, CircuitBreakerSettings, Config, DatabaseConfig,
    LoggingConfig, RequestLimitsConfig, RetryConfig, MAX_DURATION_SECS,
};
pub use interaction::{
    AiSuggestionsDocument, InteractionAction, SuggestionEffectiveness, SuggestionInteraction,
    MAX_INTERACTIONS, MAX_PLATEAU_ALERTS,
};
pub use plateau::{
    sort_interventions, InterventionPlan, InterventionSuggestion, InterventionType,
    PlateauDetection, PlateauSeverity, PlateauType, StagnantMetrics, VariationOption,
    MIN_PLATEAU_DURATION,
};
pub use profile::{
    AiModelData, ExperienceLevel, PerformanceMetrics, PersonalMetrics, ProgressionPreferences,
    ProgressionStyle, UserProgressionProfile,
};
pub use progression::{
    sort_alternatives, AlternativeOption, Priority, ProgressionAnalysis, ProgressionSuggestion,
    ProgressionTrend, ProgressionType,
};
pub use session::{
    group_sessions_by_exercise, sessions_for_exercise, ExerciseEntry, ExerciseSession, SetRecord,
    WorkoutLog,
};
pub use suggestion::{
    CombinedSuggestion, FallbackReason, ProviderSuggestion, RuleBasedSuggestion, SuggestionResult,
    FALLBACK_NOTICE,
};
pub use workout_plan::{
    WorkoutContext, WorkoutSuggestion, WorkoutSuggestionSource, DEFAULT_MAX_EXERCISES,
};
