//! Result shaping: turns a raw agent result into user-facing prose via the LLM
//! client, with a deterministic fallback when the LLM call fails or is
//! unavailable.

use crate::collaborators::LlmClient;
use serde_json::Value;

const SUCCESS_GLYPH: &str = "\u{2705}"; // checkmark
const FAILURE_GLYPH: &str = "\u{274c}"; // cross mark

/// The system prompt handed to the LLM — forbids extra formatting so the
/// shaped text can be returned to the caller verbatim.
const SHAPING_SYSTEM_PROMPT: &str =
    "Rewrite the following task result as a short, plain-language response to the user's \
     original instruction. Do not add markdown, headers, or bullet points. Reply with the \
     rewritten text only.";

/// Asks the LLM to rewrite `raw_result` as prose addressing `instruction`.
/// Falls back to [`deterministic_success`] on any LLM failure or empty reply.
pub async fn shape_success(llm: &dyn LlmClient, instruction: &str, raw_result: &Value) -> String {
    let prompt = format!(
        "{SHAPING_SYSTEM_PROMPT}\n\nOriginal instruction: {instruction}\n\nTask result: {raw_result}"
    );

    match llm.generate(&prompt, None).await {
        Ok(response) => match response.text() {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => deterministic_success(instruction),
        },
        Err(error) => {
            tracing::warn!(%error, "result shaping LLM call failed, using deterministic fallback");
            deterministic_success(instruction)
        }
    }
}

/// Deterministic fallback for a successful task: glyph + instruction.
pub fn deterministic_success(instruction: &str) -> String {
    format!("{SUCCESS_GLYPH} {instruction}")
}

/// Deterministic template for a failed task: glyph + instruction + error
/// string. Failures never reach the LLM — the S8→Sx Fail transition bypasses
/// S9 entirely.
pub fn deterministic_failure(instruction: &str, error: &str) -> String {
    format!("{FAILURE_GLYPH} {instruction}: {error}")
}
