use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::UserId;

/// Self-assessed experience level of the person asking for a roadmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(format!("unknown skill level '{other}'")),
        }
    }
}

/// Input to the prompt builder. Created per generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapRequest {
    pub job_role: String,
    pub skill_level: SkillLevel,
}

impl RoadmapRequest {
    /// Trims the job role and rejects it when nothing is left.
    pub fn validated(self) -> Result<Self, String> {
        let job_role = self.job_role.trim().to_string();
        if job_role.is_empty() {
            return Err("job_role cannot be empty".to_string());
        }
        Ok(Self {
            job_role,
            skill_level: self.skill_level,
        })
    }
}

/// One stage of a roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    /// Free-form, e.g. "2 weeks". Empty when the model left it out.
    #[serde(default)]
    pub duration: String,
    pub description: String,
}

/// A normalized roadmap. Step order is the learning sequence and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub job_role: String,
    pub skill_level: SkillLevel,
    pub steps: Vec<Step>,
}

/// A roadmap once the store has taken ownership of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRoadmap {
    pub id: Uuid,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub roadmap: Roadmap,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub owner_id: String,
    pub job_role: String,
    pub skill_level: String,
    pub steps: Json<Vec<Step>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RoadmapRow> for SavedRoadmap {
    type Error = String;

    fn try_from(row: RoadmapRow) -> Result<Self, Self::Error> {
        Ok(SavedRoadmap {
            id: row.id,
            owner_id: UserId::from(row.owner_id),
            created_at: row.created_at,
            roadmap: Roadmap {
                job_role: row.job_role,
                skill_level: row.skill_level.parse()?,
                steps: row.steps.0,
            },
        })
    }
}
