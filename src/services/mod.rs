//! Service layer: the rule engine, the analysis provider client and its
//! guards, and the orchestrating progressive overload service.

pub mod analysis_provider;
pub mod circuit_breaker;
pub mod emergency_brake;
pub mod exercise_catalog;
pub mod interventions;
pub mod json_extraction;
pub mod plateau_detector;
pub mod progression_engine;
pub mod progressive_overload;
pub mod provider_prompts;
pub mod provider_responses;
pub mod request_queue;
pub mod retry;
pub mod suggestion_merge;
pub mod usage_limits;
pub mod workout_planner;

pub use analysis_provider::{AnalysisProviderClient, ProviderResponse, ResponseOrigin};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use emergency_brake::{EmergencyBrake, EmergencyBrakeConfig, EmergencyBrakeStats};
pub use plateau_detector::detect_plateau;
pub use progression_engine::{analyze_sessions, generate_progression_suggestion};
pub use progressive_overload::{OverloadRepositories, ProgressiveOverloadService};
