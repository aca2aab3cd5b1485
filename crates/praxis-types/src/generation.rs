//! Generation request/response types shared by the adapter and its backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Role of a message in a generation conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a generation conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Raw result of a backend call, before parsing into the target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawGeneration {
    /// JSON text the backend produced.
    Content(String),
    /// The backend declined to answer.
    Refusal(String),
}

/// Uniform failure taxonomy for every generation backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generated content does not match the target schema: {reason}")]
    SchemaMismatch { raw_content: String, reason: String },

    #[error("generation refused: {reason}")]
    Refused { reason: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Whether re-issuing the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Transport(_))
    }
}
