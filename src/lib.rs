//! Overload - progressive overload analysis and plateau interventions
//!
//! Overload reads logged workouts, works out how each exercise is trending,
//! and suggests the next session's weight, reps, and sets. When progress
//! stalls it detects the plateau and proposes interventions. An optional
//! language-model provider refines the rule-based suggestions; every
//! provider failure degrades to the rule result.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Training models, errors, and ports
//! - **Service Layer** (`services`): Rule engine, provider client, orchestration
//! - **Adapters** (`adapters`): SQLite persistence, suggestion cache, test generators
//! - **Infrastructure Layer** (`infrastructure`): Gemini client, config, logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use overload::services::ProgressiveOverloadService;
//!
//! let suggestion = service.calculate_next_progression("user-1", "Squat").await?;
//! println!("{}", suggestion.suggestion().suggested_weight);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, ProviderError};
pub use domain::models::{
    Config, PlateauAlert, PlateauDetection, ProgressionAnalysis, ProgressionSuggestion,
    SuggestionResult, WorkoutLog,
};
pub use domain::ports::{Clock, KeyValueStore, TextGenerator};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AnalysisProviderClient, OverloadRepositories, ProgressiveOverloadService};
