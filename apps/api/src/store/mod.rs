//! Roadmap persistence — pluggable, trait-based store scoped to the owning user.
//!
//! Default: `PgRoadmapStore` when `DATABASE_URL` is set.
//! Fallback: `InMemoryRoadmapStore` (local development and tests).
//!
//! `AppState` holds an `Arc<dyn RoadmapStore>`, chosen at startup via config.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::UserId;
use crate::models::roadmap::{Roadmap, SavedRoadmap};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRoadmapStore;
pub use postgres::PgRoadmapStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored roadmap {id} is unreadable: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

/// Every read is filtered by owner. No implementation may return a roadmap
/// whose `owner_id` differs from the one asked for.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Persists a copy of `roadmap` owned by `owner`, assigning id and `created_at`.
    async fn save(&self, roadmap: &Roadmap, owner: &UserId) -> Result<SavedRoadmap, StoreError>;

    /// All roadmaps of `owner`, newest first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<SavedRoadmap>, StoreError>;

    /// A single roadmap, or `None` if it does not exist or belongs to someone else.
    async fn get_for_owner(
        &self,
        id: Uuid,
        owner: &UserId,
    ) -> Result<Option<SavedRoadmap>, StoreError>;
}
