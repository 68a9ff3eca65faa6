// Skill assessment: questionnaire answers in, Gemini-backed assessment out.
// All LLM calls go through llm_client; no direct Gemini calls here.

pub mod generator;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod store;
