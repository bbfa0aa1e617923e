use serde::{Deserialize, Serialize};

/// Longest accepted lifetime or cooldown, in seconds (ten years).
pub const MAX_DURATION_SECS: u64 = 315_360_000;

/// Clamp a configured duration to [`MAX_DURATION_SECS`].
pub const fn bounded_secs(secs: u64) -> u64 {
    if secs > MAX_DURATION_SECS {
        MAX_DURATION_SECS
    } else {
        secs
    }
}

/// Main configuration structure for Overload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Analysis provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Provider request caps
    #[serde(default)]
    pub limits: RequestLimitsConfig,

    /// Provider circuit breaker
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// History windows used by analysis
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            ai: AiConfig::default(),
            limits: RequestLimitsConfig::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".overload/overload.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
            retention_days: default_retention_days(),
        }
    }
}

/// Analysis provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AiConfig {
    /// Feature flag for provider-enhanced suggestions
    #[serde(default)]
    pub enabled: bool,

    /// Blend provider output with rule-based output instead of preferring the provider
    #[serde(default = "default_true")]
    pub hybrid_mode: bool,

    /// Kill switch that overrides `enabled`
    #[serde(default)]
    pub emergency_disable: bool,

    /// Weight of the rule-based confidence when blending (0-1)
    #[serde(default = "default_blend_priority")]
    pub blend_priority: f64,

    /// Hard timeout for one provider call in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Provider model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Provider API key; falls back to `GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Log prompt and response sizes plus gate decisions at debug level
    #[serde(default)]
    pub logging_enabled: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_blend_priority() -> f64 {
    0.6
}

const fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hybrid_mode: default_true(),
            emergency_disable: false,
            blend_priority: default_blend_priority(),
            request_timeout_ms: default_request_timeout_ms(),
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            logging_enabled: false,
        }
    }
}

impl AiConfig {
    /// Whether provider calls may be attempted at all.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.emergency_disable
    }
}

/// Provider request caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestLimitsConfig {
    /// Calls allowed per user per day
    #[serde(default = "default_max_requests_per_user_per_day")]
    pub max_requests_per_user_per_day: u32,

    /// Calls per day before the emergency brake latches
    #[serde(default = "default_max_requests_per_day")]
    pub max_requests_per_day: u32,

    /// Calls allowed per rolling hour
    #[serde(default = "default_max_requests_per_hour")]
    pub max_requests_per_hour: u32,

    /// Minimum spacing between provider calls in milliseconds
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

const fn default_max_requests_per_user_per_day() -> u32 {
    5
}

const fn default_max_requests_per_day() -> u32 {
    10
}

const fn default_max_requests_per_hour() -> u32 {
    30
}

const fn default_min_request_interval_ms() -> u64 {
    1_000
}

impl Default for RequestLimitsConfig {
    fn default() -> Self {
        Self {
            max_requests_per_user_per_day: default_max_requests_per_user_per_day(),
            max_requests_per_day: default_max_requests_per_day(),
            max_requests_per_hour: default_max_requests_per_hour(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

/// Provider circuit breaker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds the circuit stays open
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

const fn default_failure_threshold() -> u32 {
    2
}

const fn default_cooldown_secs() -> u64 {
    600
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    1
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    4_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Lifetime of a persisted suggestion in seconds
    #[serde(default = "default_suggestion_ttl_secs")]
    pub suggestion_ttl_secs: u64,

    /// Lifetime of an in-memory provider result in seconds
    #[serde(default = "default_provider_memo_ttl_secs")]
    pub provider_memo_ttl_secs: u64,
}

const fn default_suggestion_ttl_secs() -> u64 {
    3_600
}

const fn default_provider_memo_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            suggestion_ttl_secs: default_suggestion_ttl_secs(),
            provider_memo_ttl_secs: default_provider_memo_ttl_secs(),
        }
    }
}

/// History windows used by analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Workouts loaded for progression analysis
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Workouts loaded for plateau detection
    #[serde(default = "default_plateau_history_limit")]
    pub plateau_history_limit: u32,

    /// Completed workouts required before plateau detection runs
    #[serde(default = "default_min_completed_workouts")]
    pub min_completed_workouts: usize,
}

const fn default_history_limit() -> u32 {
    50
}

const fn default_plateau_history_limit() -> u32 {
    20
}

const fn default_min_completed_workouts() -> usize {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            plateau_history_limit: default_plateau_history_limit(),
            min_completed_workouts: default_min_completed_workouts(),
        }
    }
}
