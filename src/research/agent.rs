//! Language-model agent invocation
//!
//! An [`AgentSpec`] is the descriptor for one pipeline role: a name used in
//! logs and errors, and the instructions sent as the system prompt. Agents
//! either return free text or a JSON document that is deserialized into the
//! stage's typed output at the boundary.

use crate::llm::LLMClient;
use crate::types::{AppError, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub instructions: String,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    /// Invoke the agent and return its raw text response.
    pub async fn invoke_text(&self, llm: &dyn LLMClient, input: &str) -> Result<String> {
        tracing::debug!(agent = %self.name, model = llm.model_name(), "invoking agent");
        llm.generate_with_system(&self.instructions, input).await
    }

    /// Invoke the agent and parse its response as `T`.
    ///
    /// Fails with [`AppError::InvalidOutput`] when the response holds no JSON
    /// object or the object does not match `T`.
    pub async fn invoke_structured<T: DeserializeOwned>(
        &self,
        llm: &dyn LLMClient,
        input: &str,
    ) -> Result<T> {
        let raw = self.invoke_text(llm, input).await?;
        self.parse_structured(&raw)
    }

    pub fn parse_structured<T: DeserializeOwned>(&self, raw: &str) -> Result<T> {
        let json = extract_json(raw).ok_or_else(|| {
            AppError::invalid_output(&self.name, "response did not contain a JSON object")
        })?;

        serde_json::from_str(json).map_err(|e| {
            tracing::warn!(agent = %self.name, error = %e, "structured output rejected");
            AppError::invalid_output(&self.name, format!("response did not match schema: {}", e))
        })
    }
}

/// Locate the JSON object inside a model response.
///
/// A fence is only unwrapped when the response opens with one, and it closes
/// at the last fence, so code blocks inside JSON strings stay intact. The
/// object is the span from the first `{` to the last `}`.
pub fn extract_json(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let text = match text.strip_prefix("```") {
        Some(after_fence) => {
            let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
            let body = &after_fence[body_start..];
            match body.rfind("```") {
                Some(close) => &body[..close],
                None => body,
            }
        }
        None => text,
    };

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
