//! The uniform generation operation every step depends on.
//!
//! `generate::<T>()` builds a provider-neutral request from `T`'s schema,
//! invokes the configured backend and parses the result into `T`. Parse
//! and validation failures become `SchemaMismatch` carrying the raw
//! content; nothing is retried or coerced here.

use std::sync::Arc;

use praxis_types::generation::{GenerationError, Message, RawGeneration};
use praxis_types::practice::Validate;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::backend::GenerationRequest;
use super::box_backend::BoxGenerationBackend;
use super::schema::SchemaDescriptor;

#[derive(Clone)]
pub struct GenerationAdapter {
    backend: Arc<BoxGenerationBackend>,
}

impl GenerationAdapter {
    pub fn new(backend: BoxGenerationBackend) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate a value of type `T` from a system prompt and conversation.
    pub async fn generate<T>(
        &self,
        system_prompt: &str,
        conversation: Vec<Message>,
    ) -> Result<T, GenerationError>
    where
        T: DeserializeOwned + JsonSchema + Validate,
    {
        let request = GenerationRequest {
            system_prompt: system_prompt.to_string(),
            conversation,
            schema: SchemaDescriptor::of::<T>(),
        };

        tracing::debug!(
            backend = self.backend.name(),
            schema = %request.schema.name,
            messages = request.conversation.len(),
            "requesting generation"
        );

        let raw = self.backend.generate_raw(&request).await?;
        let content = match raw {
            RawGeneration::Refusal(reason) => {
                tracing::warn!(schema = %request.schema.name, reason = %reason, "generation refused");
                return Err(GenerationError::Refused { reason });
            }
            RawGeneration::Content(content) if content.trim().is_empty() => {
                return Err(GenerationError::Refused {
                    reason: "empty output".to_string(),
                });
            }
            RawGeneration::Content(content) => content,
        };

        parse_validated::<T>(&content)
    }
}

/// Parse and range-check generated JSON.
pub fn parse_validated<T>(content: &str) -> Result<T, GenerationError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(content).map_err(|e| GenerationError::SchemaMismatch {
        raw_content: content.to_string(),
        reason: e.to_string(),
    })?;

    value
        .validate()
        .map_err(|reason| GenerationError::SchemaMismatch {
            raw_content: content.to_string(),
            reason,
        })?;

    Ok(value)
}
