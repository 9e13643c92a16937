// Roadmap generation: prompt building, response normalization, persistence hand-off.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod generator;
pub mod handlers;
pub mod normalizer;
pub mod prompts;
