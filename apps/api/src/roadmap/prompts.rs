// All LLM prompt constants for the Roadmap module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::models::roadmap::{RoadmapRequest, SkillLevel};

/// System prompt for roadmap generation. Combine with `JSON_ONLY_SYSTEM`.
pub const ROADMAP_SYSTEM_PREAMBLE: &str = "You are an experienced career coach who designs \
    practical, step-by-step learning plans for people aiming at a specific job role.";

/// Roadmap generation prompt template.
/// Replace: {job_role}, {skill_level}, {level_guidance}
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"Create a learning roadmap for someone who wants to become a {job_role}.
Their current skill level is: {skill_level}.
{level_guidance}

Return a JSON ARRAY of 5 to 8 steps, ordered from the first thing to learn to the last:
[
  {
    "title": "Short name of the step",
    "duration": "Estimated time, e.g. 2 weeks",
    "description": "One or two sentences on what to learn and how to practise it"
  }
]

HARD RULES:
1. Return ONLY the JSON array. No prose before or after it, no markdown code fences.
2. Every step MUST have all three string fields: "title", "duration", "description".
3. The array order IS the learning order."#;

/// Full system instruction sent with every roadmap request.
pub fn roadmap_system() -> String {
    format!("{ROADMAP_SYSTEM_PREAMBLE} {JSON_ONLY_SYSTEM}")
}

fn level_guidance(level: SkillLevel) -> &'static str {
    match level {
        SkillLevel::Beginner => {
            "Assume no prior experience in the field. Start from fundamentals and tooling setup."
        }
        SkillLevel::Intermediate => {
            "Assume the fundamentals are known. Focus on real projects, depth and common industry tools."
        }
        SkillLevel::Advanced => {
            "Assume solid professional experience. Focus on specialisation, architecture and leadership skills."
        }
    }
}

/// Builds the generation prompt. Pure and deterministic.
///
/// `{job_role}` is filled last: it is user text and may itself contain
/// placeholder-looking braces that must reach the model verbatim.
pub fn build_roadmap_prompt(request: &RoadmapRequest) -> String {
    ROADMAP_PROMPT_TEMPLATE
        .replace("{skill_level}", request.skill_level.as_str())
        .replace("{level_guidance}", level_guidance(request.skill_level))
        .replace("{job_role}", request.job_role.trim())
}
