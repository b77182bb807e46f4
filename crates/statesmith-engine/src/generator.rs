//! One oracle request per call, with the conversation kept by the caller.
//!
//! A [`Conversation`] starts from a system/user prompt pair. Each repair
//! appends the rejected answer as an assistant turn followed by the repair
//! instruction, so every follow-up call carries the full history.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use statesmith_config::{Config, MODEL_ROLES};
use statesmith_llm::{LlmBackend, LlmError, LlmInvocation, Message};
use statesmith_prompt_template::{PromptPair, PromptRole};
use tracing::debug;

/// Message history of one top-level operation.
#[derive(Debug, Clone)]
pub struct Conversation {
    role: PromptRole,
    request_id: String,
    messages: Vec<Message>,
    calls: u32,
}

impl Conversation {
    #[must_use]
    pub fn new(role: PromptRole, request_id: impl Into<String>, prompt: &PromptPair) -> Self {
        Self {
            role,
            request_id: request_id.into(),
            messages: vec![
                Message::system(prompt.system.clone()),
                Message::user(prompt.user.clone()),
            ],
            calls: 0,
        }
    }

    /// Append the rejected answer and the instruction that should fix it.
    pub fn push_repair(&mut self, rejected: &str, instruction: String) {
        self.messages.push(Message::assistant(rejected));
        self.messages.push(Message::user(instruction));
    }

    #[must_use]
    pub fn role(&self) -> PromptRole {
        self.role
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Oracle calls made on this conversation so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

/// Wraps the oracle collaborator with a model per role and a call timeout.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn LlmBackend>,
    models: HashMap<PromptRole, String>,
    timeout: Duration,
}

impl Generator {
    /// Generator that leaves model choice to the backend default.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            models: HashMap::new(),
            timeout,
        }
    }

    /// Generator with the per-role models and timeout from configuration.
    #[must_use]
    pub fn from_config(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        let models = MODEL_ROLES
            .iter()
            .map(|role| (*role, config.model_for(*role)))
            .collect();
        Self {
            backend,
            models,
            timeout: config.timeout(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, role: PromptRole, model: impl Into<String>) -> Self {
        self.models.insert(role, model.into());
        self
    }

    /// Model hint for a role; empty means the backend default.
    #[must_use]
    pub fn model_for(&self, role: PromptRole) -> &str {
        self.models.get(&role).map(String::as_str).unwrap_or_default()
    }

    /// Send a single system + user exchange and return the response text.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    pub async fn generate(
        &self,
        role: PromptRole,
        request_id: &str,
        prompt: &PromptPair,
    ) -> Result<String, LlmError> {
        let mut conversation = Conversation::new(role, request_id, prompt);
        self.complete(&mut conversation).await
    }

    /// Send the whole conversation and return the response text.
    ///
    /// A missing completion comes back as the empty string.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged; nothing is retried here.
    pub async fn complete(&self, conversation: &mut Conversation) -> Result<String, LlmError> {
        let role = conversation.role;
        let invocation = LlmInvocation::new(
            conversation.request_id.clone(),
            role.as_str(),
            self.model_for(role),
            self.timeout,
            conversation.messages.clone(),
        );

        conversation.calls += 1;
        debug!(
            role = %role,
            request_id = %conversation.request_id,
            call = conversation.calls,
            messages = conversation.messages.len(),
            "Calling oracle"
        );

        let result = self.backend.invoke(invocation).await?;

        debug!(
            role = %role,
            provider = %result.provider,
            model = %result.model_used,
            response_len = result.raw_response.len(),
            "Oracle responded"
        );
        Ok(result.raw_response)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("models", &self.models)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
