//! Responses-API backend (Doubao / Volcengine Ark).
//!
//! Every message is wrapped in a typed content envelope and the schema is
//! sent under `text.format`. The reply is a list of output items; the
//! first message item's text (or refusal) is the result.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use praxis_core::generation::{GenerationBackend, GenerationRequest};
use praxis_types::generation::{GenerationError, MessageRole, RawGeneration};

use super::{GenerationSettings, endpoint, post_json};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputItem>,
    pub temperature: f64,
    pub text: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct InputItem {
    pub role: String,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InputContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesReply {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum OutputContent {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Responses-API backend. Does not derive Debug (holds the API key).
pub struct ResponsesBackend {
    client: reqwest::Client,
    settings: GenerationSettings,
    name: String,
}

impl ResponsesBackend {
    pub fn new(client: reqwest::Client, settings: GenerationSettings) -> Self {
        let name = settings.provider.to_string();
        Self {
            client,
            settings,
            name,
        }
    }

    pub(crate) fn build_request(&self, request: &GenerationRequest) -> ResponsesRequest {
        let mut input = Vec::with_capacity(request.conversation.len() + 1);
        input.push(envelope(MessageRole::System, &request.system_prompt));
        input.extend(
            request
                .conversation
                .iter()
                .map(|m| envelope(m.role, &m.content)),
        );

        ResponsesRequest {
            model: self.settings.model.clone(),
            input,
            temperature: self.settings.temperature,
            text: json!({
                "format": {
                    "type": "json_schema",
                    "name": request.schema.name,
                    "schema": request.schema.strict_schema(),
                    "strict": true,
                }
            }),
        }
    }
}

fn envelope(role: MessageRole, text: &str) -> InputItem {
    // Prior assistant turns are replayed as output text.
    let kind = match role {
        MessageRole::Assistant => "output_text",
        MessageRole::System | MessageRole::User => "input_text",
    };
    InputItem {
        role: role.to_string(),
        content: vec![InputContent {
            kind,
            text: text.to_string(),
        }],
    }
}

pub(crate) fn into_raw(reply: ResponsesReply) -> Result<RawGeneration, GenerationError> {
    let message = reply
        .output
        .into_iter()
        .find(|item| item.kind == "message")
        .ok_or_else(|| GenerationError::Transport("response contained no message output".to_string()))?;

    let mut text = String::new();
    for part in message.content {
        match part {
            OutputContent::Refusal { refusal } => return Ok(RawGeneration::Refusal(refusal)),
            OutputContent::OutputText { text: chunk } => text.push_str(&chunk),
            OutputContent::Other => {}
        }
    }
    Ok(RawGeneration::Content(text))
}

impl GenerationBackend for ResponsesBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_raw(&self, request: &GenerationRequest) -> Result<RawGeneration, GenerationError> {
        let body = self.build_request(request);
        let url = endpoint(&self.settings.base_url, "responses");

        tracing::debug!(
            backend = %self.name,
            schema = %request.schema.name,
            items = body.input.len(),
            "responses request"
        );

        let reply: ResponsesReply = post_json(&self.client, &url, &self.settings.api_key, &body).await?;
        into_raw(reply)
    }
}
