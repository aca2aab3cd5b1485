//! HTTP generation backends.
//!
//! Each backend implements `GenerationBackend` from `praxis-core` for one
//! request shape. [`create_backend`] picks the shape from the provider's
//! [`BackendStrategy`]:
//!
//! - `chat` (strict): chat completions with a `json_schema` response format (OpenAI)
//! - `chat` (json mode): chat completions with `json_object` plus a schema instruction (Kimi, DeepSeek)
//! - `responses`: the Responses API with typed input envelopes (Doubao)

pub mod chat;
pub mod responses;

use std::time::Duration;

use secrecy::SecretString;

use praxis_core::generation::BoxGenerationBackend;
use praxis_types::config::{BackendStrategy, ProviderKind};
use praxis_types::generation::GenerationError;

use self::chat::{ChatBackend, ChatMode};
use self::responses::ResponsesBackend;

/// Resolved connection settings for a generation backend.
///
/// Does not derive Debug; the API key must never reach logs.
#[derive(Clone)]
pub struct GenerationSettings {
    pub provider: ProviderKind,
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
}

/// Build the backend matching the provider's request shape.
pub fn create_backend(settings: GenerationSettings) -> Result<BoxGenerationBackend, GenerationError> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {e}")))?;

    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        base_url = %settings.base_url,
        "creating generation backend"
    );

    Ok(match settings.provider.strategy() {
        BackendStrategy::NativeStructured => {
            BoxGenerationBackend::new(ChatBackend::new(client, settings, ChatMode::StrictSchema))
        }
        BackendStrategy::JsonMode => {
            BoxGenerationBackend::new(ChatBackend::new(client, settings, ChatMode::JsonObject))
        }
        BackendStrategy::Responses => BoxGenerationBackend::new(ResponsesBackend::new(client, settings)),
    })
}

/// Join a base URL and an endpoint path without doubling the slash.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Longest error-body prefix quoted in transport errors.
const BODY_EXCERPT_CHARS: usize = 300;

/// Map a non-success HTTP status to the uniform transport error.
fn status_error(status: reqwest::StatusCode, body: &str) -> GenerationError {
    match status.as_u16() {
        401 | 403 => GenerationError::Transport("authentication failed".to_string()),
        429 => GenerationError::Transport("rate limited".to_string()),
        _ => {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            GenerationError::Transport(format!("HTTP {status}: {excerpt}"))
        }
    }
}

/// POST `body` as JSON and decode the JSON reply into `R`.
async fn post_json<B, R>(
    client: &reqwest::Client,
    url: &str,
    api_key: &SecretString,
    body: &B,
) -> Result<R, GenerationError>
where
    B: serde::Serialize + ?Sized,
    R: serde::de::DeserializeOwned,
{
    use secrecy::ExposeSecret;

    let response = client
        .post(url)
        .bearer_auth(api_key.expose_secret())
        .json(body)
        .send()
        .await
        .map_err(|e| GenerationError::Transport(format!("HTTP request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &error_body));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| GenerationError::Transport(format!("failed to parse response: {e}")))
}
