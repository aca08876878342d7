//! LLM chat-completion provider abstraction.
//!
//! The summarization engine and the transcript chat engine both speak to a
//! large language model through this trait, so the concrete provider can be
//! swapped (or mocked in tests) without touching either engine.

use crate::error::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a chat-completion message, as understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

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
}

/// Output mode requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free-form text
    Text,
    /// Response constrained to a single JSON object
    JsonObject,
}

/// A chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A plain-text completion request.
    pub fn text(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_format: ResponseFormat::Text,
            temperature: None,
            max_tokens: None,
        }
    }

    /// A completion request constrained to structured JSON output.
    pub fn structured_json(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_format: ResponseFormat::JsonObject,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Abstraction for LLM chat-completion providers.
///
/// Implementations issue a single completion over role-tagged messages and
/// return the assistant's text content. Transport and provider-side errors
/// surface as `Err`; content that merely fails to match an expected shape is
/// the caller's concern (the summarization engine degrades rather than
/// failing on unparseable content).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Issue one chat completion and return the assistant message content.
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error>;

    /// Return unique identifier for this provider (e.g., "openai").
    fn provider_id(&self) -> &str;
}
