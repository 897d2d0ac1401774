// Resume analysis: upload handling, AI scoring and the end-to-end pipeline.
// Model calls go through llm_client; persistence goes through storage.

pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scorer;
