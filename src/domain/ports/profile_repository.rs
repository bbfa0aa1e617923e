//! Progression profile repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::UserProgressionProfile;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, user_id: &str) -> DomainResult<Option<UserProgressionProfile>>;

    /// Insert or replace the profile.
    async fn save(&self, profile: &UserProgressionProfile) -> DomainResult<()>;
}
