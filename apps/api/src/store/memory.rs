use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::auth::UserId;
use crate::models::roadmap::{Roadmap, SavedRoadmap};
use crate::store::{RoadmapStore, StoreError};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryRoadmapStore {
    // Insertion order; newest last.
    roadmaps: RwLock<Vec<SavedRoadmap>>,
}

impl InMemoryRoadmapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoadmapStore for InMemoryRoadmapStore {
    async fn save(&self, roadmap: &Roadmap, owner: &UserId) -> Result<SavedRoadmap, StoreError> {
        let saved = SavedRoadmap {
            id: Uuid::new_v4(),
            owner_id: owner.clone(),
            created_at: Utc::now(),
            roadmap: roadmap.clone(),
        };
        self.roadmaps.write().await.push(saved.clone());
        debug!("Saved roadmap {} in memory for user {}", saved.id, owner);
        Ok(saved)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<SavedRoadmap>, StoreError> {
        let roadmaps = self.roadmaps.read().await;
        let mut owned: Vec<SavedRoadmap> = roadmaps
            .iter()
            .rev()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect();
        // Stable sort keeps newest-insert-first among equal timestamps.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get_for_owner(
        &self,
        id: Uuid,
        owner: &UserId,
    ) -> Result<Option<SavedRoadmap>, StoreError> {
        Ok(self
            .roadmaps
            .read()
            .await
            .iter()
            .find(|r| r.id == id && &r.owner_id == owner)
            .cloned())
    }
}
