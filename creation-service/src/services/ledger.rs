//! Append-only record of generated creations.

use crate::models::Creation;
use async_trait::async_trait;
use service_core::error::AppError;

/// Most creations returned by the community feed.
pub const PUBLISHED_FEED_LIMIT: i64 = 100;

#[async_trait]
pub trait CreationLedger: Send + Sync {
    /// Append one creation. Entries are never updated or deleted.
    async fn append(&self, creation: &Creation) -> Result<(), AppError>;

    /// Creations of one user, newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Creation>, AppError>;

    /// Published creations of all users, newest first.
    async fn list_published(&self, limit: i64) -> Result<Vec<Creation>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
