use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::UserId;
use crate::models::roadmap::{Roadmap, RoadmapRow, SavedRoadmap};
use crate::store::{RoadmapStore, StoreError};

/// `seq` breaks `created_at` ties so the later insert comes first.
const LIST_BY_OWNER_SQL: &str =
    "SELECT * FROM roadmaps WHERE owner_id = $1 ORDER BY created_at DESC, seq DESC";

/// PostgreSQL-backed store. Steps are kept as a JSONB array so their order survives.
#[derive(Clone)]
pub struct PgRoadmapStore {
    pool: PgPool,
}

impl PgRoadmapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_saved(row: RoadmapRow) -> Result<SavedRoadmap, StoreError> {
    let id = row.id;
    SavedRoadmap::try_from(row).map_err(|reason| StoreError::Corrupt { id, reason })
}

#[async_trait]
impl RoadmapStore for PgRoadmapStore {
    async fn save(&self, roadmap: &Roadmap, owner: &UserId) -> Result<SavedRoadmap, StoreError> {
        let row = sqlx::query_as::<_, RoadmapRow>(
            r#"
            INSERT INTO roadmaps (id, owner_id, job_role, skill_level, steps)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner.as_str())
        .bind(&roadmap.job_role)
        .bind(roadmap.skill_level.as_str())
        .bind(Json(&roadmap.steps))
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Saved roadmap {} ({} steps) for user {}",
            row.id,
            roadmap.steps.len(),
            owner
        );
        into_saved(row)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<SavedRoadmap>, StoreError> {
        let rows = sqlx::query_as::<_, RoadmapRow>(LIST_BY_OWNER_SQL)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_saved).collect()
    }

    async fn get_for_owner(
        &self,
        id: Uuid,
        owner: &UserId,
    ) -> Result<Option<SavedRoadmap>, StoreError> {
        let row = sqlx::query_as::<_, RoadmapRow>(
            "SELECT * FROM roadmaps WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_saved).transpose()
    }
}
