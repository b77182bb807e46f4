//! OpenAI-compatible chat-completions backend
//!
//! Serves both the `openai` and `openrouter` providers; they share the wire
//! format and differ only in endpoint, key variable, and attribution headers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statesmith_config::Config;
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Attribution headers OpenRouter asks clients to send
const OPENROUTER_REFERER: &str = "https://github.com/EffortlessMetrics/statesmith";
const OPENROUTER_TITLE: &str = "statesmith";

/// Wire-level flavour of an OpenAI-compatible endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiFlavor {
    OpenAi,
    OpenRouter,
}

impl OpenAiFlavor {
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
        }
    }

    const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_BASE_URL,
            Self::OpenRouter => OPENROUTER_BASE_URL,
        }
    }

    const fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// HTTP request parameters
#[derive(Debug, Clone)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Chat-completions backend
#[derive(Clone)]
pub(crate) struct OpenAiCompatibleBackend {
    flavor: OpenAiFlavor,
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenAiCompatibleBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        flavor: OpenAiFlavor,
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            flavor,
            client: HttpClient::new()?,
            base_url: base_url.unwrap_or_else(|| flavor.default_base_url().to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Build the backend from `[llm.openai]` or `[llm.openrouter]`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is not set or the HTTP client cannot be constructed.
    pub fn new_from_config(flavor: OpenAiFlavor, config: &Config) -> Result<Self, LlmError> {
        let name = flavor.provider_name();
        let section = config.llm.provider_config(name);

        let api_key_env = section
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or(flavor.default_api_key_env());

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "{name} API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm.{name}]."
            ))
        })?;

        let default_model = section
            .and_then(|s| s.model.clone())
            .unwrap_or_else(|| statesmith_config::default_model_for_provider(name).to_string());

        let default_params = HttpParams {
            max_tokens: section.and_then(|s| s.max_tokens).unwrap_or(2048),
            temperature: section.and_then(|s| s.temperature).unwrap_or(0.2),
        };

        Self::new(
            flavor,
            api_key,
            section.and_then(|s| s.base_url.clone()),
            default_model,
            default_params,
        )
    }

    /// Resolve the model and request parameters for this invocation
    ///
    /// `inv.model` overrides `default_model` unless empty; `max_tokens` and
    /// `temperature` always come from the provider section.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        (model, self.default_params.clone())
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let provider = self.flavor.provider_name();
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = provider,
            model = %model,
            request_id = %inv.request_id,
            messages = inv.messages.len(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking chat-completions backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let mut request = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body);
        if self.flavor == OpenAiFlavor::OpenRouter {
            request = request
                .header("HTTP-Referer", OPENROUTER_REFERER)
                .header("X-Title", OPENROUTER_TITLE);
        }

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, provider)
            .await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse {provider} response: {e}")))?;

        let content = extract_content(&response_body);

        let mut result = LlmResult::new(content, provider, model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }
        result.timeout_seconds = Some(inv.timeout.as_secs());

        debug!(
            provider = provider,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat-completions invocation completed"
        );

        Ok(result)
    }
}

/// First choice's content; missing choices or null content yield "".
fn extract_content(response: &ChatResponse) -> String {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
