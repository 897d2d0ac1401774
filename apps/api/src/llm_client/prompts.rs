// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "IMPORTANT: Return ONLY a valid JSON object. \
    Do not include markdown formatting, code blocks, or any explanatory text.";
