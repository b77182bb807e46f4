//! Core types for the oracle backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LlmError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to an oracle invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Correlates every call made by one top-level operation
    pub request_id: String,
    /// Operation label (`solve`, `program`, `evaluate`, `transition`)
    pub operation: String,
    /// Model to use; empty means the backend default
    pub model: String,
    pub timeout: Duration,
    /// Ordered conversation, system message first
    pub messages: Vec<Message>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        operation: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            operation: operation.into(),
            model: model.into(),
            timeout,
            messages,
        }
    }
}

/// Result of an oracle invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw response text; empty when the provider returned no content
    pub raw_response: String,
    /// Provider name (e.g., "openai", "openrouter", "anthropic")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub timeout_seconds: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            timeout_seconds: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// Reported when the primary provider could not be constructed and the
/// fallback provider was used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmFallbackInfo {
    pub primary_provider: String,
    pub fallback_provider: String,
    /// Redacted construction error of the primary provider
    pub reason: String,
}

/// The oracle collaborator.
///
/// One call is one request/response exchange. Implementations never parse the
/// response: free text goes back to the caller untouched.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the oracle with the given conversation
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth,
    /// quota, outages), timeouts, and budget exhaustion.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}
