//! Roadmap Generation — orchestrates one generation request.
//!
//! Flow: build prompt → LLM complete → normalize → (optional) persist.
//!
//! Generation and persistence are independent phases. A failed save is logged and
//! reported next to the roadmap; the generated roadmap is still returned.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::UserId;
use crate::errors::AppError;
use crate::llm_client::CompletionClient;
use crate::models::roadmap::{Roadmap, RoadmapRequest, SavedRoadmap};
use crate::roadmap::normalizer::normalize;
use crate::roadmap::prompts::{build_roadmap_prompt, roadmap_system};
use crate::store::RoadmapStore;

pub const SIGN_IN_TO_SAVE: &str = "Sign in to save roadmaps.";
pub const SAVE_FAILED: &str =
    "The roadmap was generated but could not be saved. Please try saving it again.";

/// Result of a generate request, with the outcome of the optional save.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub roadmap: Roadmap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<SavedRoadmap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Prompt → completion → normalized roadmap. Nothing is persisted.
pub async fn generate_roadmap(
    ai: &dyn CompletionClient,
    request: &RoadmapRequest,
) -> Result<Roadmap, AppError> {
    info!(
        "Generating roadmap for role={:?} level={}",
        request.job_role, request.skill_level
    );

    let prompt = build_roadmap_prompt(request);
    let raw = ai.complete(&prompt, &roadmap_system()).await?;

    let roadmap = normalize(&raw, request).map_err(|e| {
        warn!(
            "Roadmap normalization failed: {e}. Output started with: {:?}",
            raw.chars().take(120).collect::<String>()
        );
        e
    })?;

    info!(
        "Generated roadmap with {} steps for role={:?}",
        roadmap.steps.len(),
        request.job_role
    );
    Ok(roadmap)
}

/// Generates a roadmap and, when asked, saves it for `owner`.
pub async fn generate_and_save(
    ai: &dyn CompletionClient,
    store: &dyn RoadmapStore,
    request: &RoadmapRequest,
    owner: Option<&UserId>,
    save: bool,
) -> Result<GenerateOutcome, AppError> {
    let roadmap = generate_roadmap(ai, request).await?;

    let mut outcome = GenerateOutcome {
        roadmap,
        saved: None,
        save_error: None,
    };
    if !save {
        return Ok(outcome);
    }

    match owner {
        None => outcome.save_error = Some(SIGN_IN_TO_SAVE.to_string()),
        Some(owner) => match store.save(&outcome.roadmap, owner).await {
            Ok(saved) => outcome.saved = Some(saved),
            Err(e) => {
                error!("Failed to save generated roadmap for user {owner}: {e}");
                outcome.save_error = Some(SAVE_FAILED.to_string());
            }
        },
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::AiError;
    use crate::models::roadmap::SkillLevel;
    use crate::roadmap::normalizer::NormalizeError;
    use crate::store::InMemoryRoadmapStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with canned text and records the prompt it was given.
    struct CannedClient {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(429) => Err(AiError::RateLimited {
                    message: "slow down".to_string(),
                }),
                Err(status) => Err(AiError::Api {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    fn request() -> RoadmapRequest {
        RoadmapRequest {
            job_role: "Mobile Developer".to_string(),
            skill_level: SkillLevel::Beginner,
        }
    }

    const REPLY: &str = r#"[{"title":"Kotlin","duration":"3 weeks","description":"Language basics"},
                           {"title":"Jetpack Compose","duration":"4 weeks","description":"UI toolkit"}]"#;

    #[tokio::test]
    async fn test_generate_sends_built_prompt_and_normalizes() {
        let ai = CannedClient::ok(REPLY);
        let roadmap = generate_roadmap(&ai, &request()).await.unwrap();

        assert_eq!(roadmap.steps.len(), 2);
        assert_eq!(roadmap.steps[1].title, "Jetpack Compose");
        let prompts = ai.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Mobile Developer"));
    }

    #[tokio::test]
    async fn test_normalization_failure_is_not_an_empty_roadmap() {
        let ai = CannedClient::ok("I cannot help with that.");
        let err = generate_roadmap(&ai, &request()).await.unwrap_err();
        assert!(matches!(err, AppError::Normalize(NormalizeError::Parse)));
    }

    #[tokio::test]
    async fn test_ai_failure_propagates() {
        let ai = CannedClient {
            reply: Err(429),
            prompts: Mutex::new(Vec::new()),
        };
        let err = generate_roadmap(&ai, &request()).await.unwrap_err();
        assert!(matches!(err, AppError::Ai(AiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_save_requires_owner() {
        let ai = CannedClient::ok(REPLY);
        let store = InMemoryRoadmapStore::new();
        let outcome = generate_and_save(&ai, &store, &request(), None, true)
            .await
            .unwrap();
        assert!(outcome.saved.is_none());
        assert_eq!(outcome.save_error.as_deref(), Some(SIGN_IN_TO_SAVE));
        assert_eq!(outcome.roadmap.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_save_attaches_owner_and_keeps_order() {
        let ai = CannedClient::ok(REPLY);
        let store = InMemoryRoadmapStore::new();
        let owner = UserId::from("uid-7");
        let outcome = generate_and_save(&ai, &store, &request(), Some(&owner), true)
            .await
            .unwrap();

        let saved = outcome.saved.unwrap();
        assert_eq!(saved.owner_id, owner);
        assert_eq!(saved.roadmap, outcome.roadmap);
        assert_eq!(store.list_by_owner(&owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_save_when_not_requested() {
        let ai = CannedClient::ok(REPLY);
        let store = InMemoryRoadmapStore::new();
        let owner = UserId::from("uid-7");
        let outcome = generate_and_save(&ai, &store, &request(), Some(&owner), false)
            .await
            .unwrap();
        assert!(outcome.saved.is_none() && outcome.save_error.is_none());
        assert!(store.list_by_owner(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identical_requests_are_independent() {
        let ai = CannedClient::ok(REPLY);
        let store = InMemoryRoadmapStore::new();
        let owner = UserId::from("uid-7");
        let (req_a, req_b) = (request(), request());
        let (a, b) = tokio::join!(
            generate_and_save(&ai, &store, &req_a, Some(&owner), true),
            generate_and_save(&ai, &store, &req_b, Some(&owner), true),
        );
        assert_ne!(a.unwrap().saved.unwrap().id, b.unwrap().saved.unwrap().id);
        assert_eq!(ai.prompts.lock().unwrap().len(), 2);
        assert_eq!(store.list_by_owner(&owner).await.unwrap().len(), 2);
    }
}
