//! Chat-completions backend for OpenAI-compatible APIs.
//!
//! In [`ChatMode::StrictSchema`] the target schema travels as a strict
//! `json_schema` response format and refusals come back in a dedicated
//! field. In [`ChatMode::JsonObject`] the provider only guarantees a JSON
//! object, so the schema is appended to the system prompt as an
//! instruction and conformance is checked by the adapter.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use praxis_core::generation::{GenerationBackend, GenerationRequest};
use praxis_types::generation::{GenerationError, RawGeneration};

use super::{GenerationSettings, endpoint, post_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    StrictSchema,
    JsonObject,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub response_format: Value,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Chat-completions backend. Does not derive Debug (holds the API key).
pub struct ChatBackend {
    client: reqwest::Client,
    settings: GenerationSettings,
    mode: ChatMode,
    name: String,
}

impl ChatBackend {
    pub fn new(client: reqwest::Client, settings: GenerationSettings, mode: ChatMode) -> Self {
        let name = settings.provider.to_string();
        Self {
            client,
            settings,
            mode,
            name,
        }
    }

    pub(crate) fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        let (system, response_format) = match self.mode {
            ChatMode::StrictSchema => (
                request.system_prompt.clone(),
                json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": request.schema.name,
                        "schema": request.schema.strict_schema(),
                        "strict": true,
                    }
                }),
            ),
            ChatMode::JsonObject => (
                format!("{}\n\n{}", request.system_prompt, request.schema.instruction()),
                json!({ "type": "json_object" }),
            ),
        };

        let mut messages = Vec::with_capacity(request.conversation.len() + 1);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system,
        });
        messages.extend(request.conversation.iter().map(|m| ChatMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            response_format,
        }
    }
}

pub(crate) fn into_raw(response: ChatResponse) -> Result<RawGeneration, GenerationError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Transport("response contained no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Ok(RawGeneration::Refusal(refusal));
    }
    Ok(RawGeneration::Content(choice.message.content.unwrap_or_default()))
}

impl GenerationBackend for ChatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_raw(&self, request: &GenerationRequest) -> Result<RawGeneration, GenerationError> {
        let body = self.build_request(request);
        let url = endpoint(&self.settings.base_url, "chat/completions");

        tracing::debug!(
            backend = %self.name,
            schema = %request.schema.name,
            messages = body.messages.len(),
            "chat completion request"
        );

        let response: ChatResponse =
            post_json(&self.client, &url, &self.settings.api_key, &body).await?;
        into_raw(response)
    }
}
