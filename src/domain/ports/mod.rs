//! Ports: the interfaces adapters implement.

pub mod analytics_repository;
pub mod clock;
pub mod key_value_store;
pub mod profile_repository;
pub mod suggestion_store;
pub mod text_generator;
pub mod workout_repository;

pub use analytics_repository::AnalyticsRepository;
pub use clock::{Clock, ManualClock, SystemClock};
pub use key_value_store::{escape_key_segment, KeyValueStore};
pub use profile_repository::ProfileRepository;
pub use suggestion_store::SuggestionStore;
pub use text_generator::TextGenerator;
pub use workout_repository::WorkoutRepository;
