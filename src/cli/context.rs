//! Shared setup for commands that touch the database.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::adapters::cache::SuggestionCache;
use crate::adapters::sqlite::{
    initialize_database, SqliteAnalyticsRepository, SqliteKeyValueStore, SqliteProfileRepository,
    SqliteSuggestionStore, SqliteWorkoutRepository,
};
use crate::domain::models::Config;
use crate::domain::ports::{Clock, SystemClock};
use crate::infrastructure::gemini::GeminiClient;
use crate::services::{AnalysisProviderClient, OverloadRepositories, ProgressiveOverloadService};

/// Everything a command needs: configuration, the workout repository, the
/// suggestion cache, and the service wired over them.
pub struct AppContext {
    pub config: Config,
    pub workouts: Arc<SqliteWorkoutRepository>,
    pub cache: Arc<SuggestionCache>,
    pub service: ProgressiveOverloadService,
}

impl AppContext {
    /// Open the configured database. Fails when `overload init` has not run.
    pub async fn open(config: Config) -> Result<Self> {
        let path = &config.database.path;
        if !path.starts_with("sqlite:") && !Path::new(path).exists() {
            bail!("Database not found at {path}. Run 'overload init' first.");
        }
        let pool = initialize_database(&config.database)
            .await
            .context("Failed to initialize database. Run 'overload init' first.")?;
        Ok(Self::from_pool(config, pool))
    }

    pub fn from_pool(config: Config, pool: SqlitePool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let workouts = Arc::new(SqliteWorkoutRepository::new(pool.clone()));
        let repos = OverloadRepositories {
            workouts: workouts.clone(),
            suggestions: Arc::new(SqliteSuggestionStore::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            analytics: Arc::new(SqliteAnalyticsRepository::new(pool.clone())),
        };
        let cache = Arc::new(SuggestionCache::with_ttl(
            Arc::new(SqliteKeyValueStore::new(pool)),
            clock.clone(),
            config.cache.suggestion_ttl_secs,
        ));

        let mut service =
            ProgressiveOverloadService::new(repos, cache.clone(), clock.clone(), config.analysis.clone());
        if let Some(provider) = build_provider(&config, clock) {
            service = service.with_provider(provider);
        }

        Self {
            config,
            workouts,
            cache,
            service,
        }
    }
}

/// The Gemini-backed provider client, when the provider is enabled and a
/// usable key is configured. An emergency-disabled provider is still built
/// so its results are tagged as disabled.
fn build_provider(config: &Config, clock: Arc<dyn Clock>) -> Option<AnalysisProviderClient> {
    if !config.ai.enabled {
        debug!("Analysis provider disabled; using rule-based suggestions");
        return None;
    }
    match GeminiClient::from_ai_config(&config.ai) {
        Ok(client) => Some(AnalysisProviderClient::new(Arc::new(client), clock, config)),
        Err(e) => {
            warn!(error = %e, "Analysis provider unavailable; using rule-based suggestions");
            None
        }
    }
}
