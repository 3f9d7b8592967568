//! The single boundary through which every stage talks to the reasoning
//! service.
//!
//! A stage describes its call as an [`Ask`]; [`ask`] sends it, extracts the
//! payload (tool call or text fallback), and deserializes it into the
//! stage's typed payload. Failures come back as [`CallFailure`] so callers
//! can distinguish node-local degradation from run-fatal configuration
//! problems.

use kimi_async::{
    config::Config,
    types::chat::{ChatCompletionRequest, ChatMessage},
    types::tools::{Tool, ToolChoice},
    Client,
};
use serde::de::DeserializeOwned;

use crate::{
    errors::CallFailure,
    parse::{extract_payload, ToolPayload},
};

/// Where a successfully parsed payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// A proper tool call
    Structured,
    /// JSON recovered from free text
    Fallback,
}

/// A typed payload plus its provenance.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    /// The deserialized payload
    pub value: T,
    /// How it arrived
    pub source: PayloadSource,
}

/// One stage call: prompts, tool name, and the tooling to offer.
pub struct Ask {
    /// Tool name the payload is expected under
    pub tool_name: &'static str,
    /// System prompt
    pub system: String,
    /// User prompt
    pub user: String,
    /// Tool definitions, empty when running without structured calls
    pub tools: Vec<Tool>,
    /// Forced tool choice, `None` when running without structured calls
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token budget
    pub max_tokens: u32,
}

impl Ask {
    /// Builds a structured ask from a `(tools, choice)` pair.
    #[must_use]
    pub fn structured(
        tool_name: &'static str,
        system: String,
        user: String,
        tooling: (Vec<Tool>, ToolChoice),
    ) -> Self {
        Self {
            tool_name,
            system,
            user,
            tools: tooling.0,
            tool_choice: Some(tooling.1),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }

    /// Builds a plain-text ask relying on the JSON-recovery fallback.
    #[must_use]
    pub fn unstructured(tool_name: &'static str, system: String, user: String) -> Self {
        Self {
            tool_name,
            system,
            user,
            tools: Vec::new(),
            tool_choice: None,
            temperature: 0.3,
            max_tokens: 2048,
        }
    }
}

/// Sends one ask and deserializes its payload into `T`.
///
/// Transport and API errors are classified by [`CallFailure::from`]; an
/// unparseable or shape-mismatched payload is always `Degraded` since the
/// request itself succeeded.
pub async fn ask<C: Config, T: DeserializeOwned>(
    client: &Client<C>,
    model: &str,
    spec: Ask,
) -> Result<Parsed<T>, CallFailure> {
    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(spec.system),
            ChatMessage::user(spec.user),
        ],
        temperature: Some(spec.temperature),
        top_p: None,
        max_tokens: Some(spec.max_tokens),
        tools: if spec.tools.is_empty() {
            None
        } else {
            Some(spec.tools)
        },
        tool_choice: spec.tool_choice,
    };

    let response = client.chat().create(request).await.map_err(CallFailure::from)?;

    if let Some(usage) = &response.usage {
        tracing::debug!(
            tool = spec.tool_name,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion received"
        );
    }

    let (value, source) = match extract_payload(&response, spec.tool_name) {
        ToolPayload::Structured(v) => (v, PayloadSource::Structured),
        ToolPayload::FallbackParsed(v) => {
            tracing::debug!(tool = spec.tool_name, "payload recovered from text fallback");
            (v, PayloadSource::Fallback)
        }
        ToolPayload::Unparsed(text) => {
            tracing::warn!(
                tool = spec.tool_name,
                snippet = %text.chars().take(120).collect::<String>(),
                "response carried no parseable payload"
            );
            return Err(CallFailure::Degraded(format!(
                "no parseable payload for {}",
                spec.tool_name
            )));
        }
    };

    let value: T = serde_json::from_value(value).map_err(|e| {
        CallFailure::Degraded(format!(
            "payload for {} did not match expected shape: {e}",
            spec.tool_name
        ))
    })?;

    Ok(Parsed { value, source })
}
