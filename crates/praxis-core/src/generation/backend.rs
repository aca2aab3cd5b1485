//! GenerationBackend trait definition.
//!
//! A backend turns a [`GenerationRequest`] into raw JSON text (or a
//! refusal). Parsing and validation against the target type happen in
//! [`GenerationAdapter`](super::GenerationAdapter), so backends never see
//! the Rust type being generated.

use praxis_types::generation::{GenerationError, Message, RawGeneration};

use super::schema::SchemaDescriptor;

/// Provider-neutral request for one structured generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    /// Ordered conversation, excluding the system prompt.
    pub conversation: Vec<Message>,
    pub schema: SchemaDescriptor,
}

/// Trait for generation backends (native structured output, JSON mode, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Implementations
/// live in praxis-infra; wrap them in [`BoxGenerationBackend`](super::BoxGenerationBackend)
/// for runtime selection.
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name (e.g., "openai", "deepseek").
    fn name(&self) -> &str;

    /// Send the request and return the raw generated content.
    fn generate_raw(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<RawGeneration, GenerationError>> + Send;
}
