//! Domain errors for the progressive overload system.

use thiserror::Error;

/// Domain-level errors that can occur in the progressive overload system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),

    #[error("Plateau alert not found: {0}")]
    AlertNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Errors from the external text-generation provider.
///
/// Cloneable so a single failed call can be shared with every caller that
/// was coalesced onto it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Errors worth retrying after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Server { .. } | Self::Network(_)
        )
    }

    /// Errors that will fail again no matter how often they are retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::Authentication(_) | Self::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::Network("reset".into()).is_transient());
        assert!(ProviderError::Server { status: 503, message: "busy".into() }.is_transient());
        assert!(ProviderError::RateLimited("429".into()).is_transient());
        assert!(!ProviderError::Timeout(8000).is_transient());
        assert!(!ProviderError::InvalidResponse("no json".into()).is_transient());
        assert!(ProviderError::Authentication("bad key".into()).is_permanent());
        assert!(!ProviderError::Timeout(8000).is_permanent());
    }

    #[test]
    fn test_domain_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let domain: DomainError = err.into();
        assert!(matches!(domain, DomainError::SerializationError(_)));
    }
}
