//! LLM driver traits and implementations.
//!
//! This module provides the abstraction over the remote conversational
//! service: a [`ChatDriver`] takes the full turn history of a session and
//! returns one reply, or a categorized [`LlmError`].
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: `OpenAI` Chat Completions API
//!   (`/v1/chat/completions`), the production driver.
//!
//! Tests inject scripted `ChatDriver` implementations instead, so the relay
//! loop can be exercised without network access.

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use provider::Provider;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// API key for authentication. Required: startup fails without it.
    pub api_key: String,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the turn author.
    pub role: MessageRole,
    /// Text content of the turn.
    pub content: String,
}

impl Message {
    /// Create a system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a turn author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Failure categories for a remote completion call.
///
/// Every variant is recovered per-message by the relay loop: the client
/// receives the fixed fallback text and the connection stays open.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("llm transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("llm api returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body excerpt, for operator logs.
        body: String,
    },

    /// The API answered 2xx but the body carried no usable reply text.
    #[error("llm response was malformed: {0}")]
    MalformedResponse(String),
}

/// Trait for the remote conversational service.
///
/// Implementations must be safe for concurrent use: one driver instance is
/// shared by every connection's handler task.
#[async_trait::async_trait]
pub trait ChatDriver: Send + Sync {
    /// Produce one reply for the given turn history.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response carries
    /// no reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;
}
