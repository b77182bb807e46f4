//! Oracle backend abstraction for statesmith
//!
//! Every provider implements [`LlmBackend`], so the synthesis loop can talk to
//! any of them without knowing transport details. When a call budget is
//! configured, HTTP backends are wrapped in a [`BudgetedBackend`].

mod anthropic_backend;
mod budgeted_backend;
pub(crate) mod http_client;
mod openai_backend;
mod types;

#[cfg(any(test, feature = "test-utils"))]
mod test_support;

pub use budgeted_backend::{BUDGET_ENV_VAR, BudgetedBackend};
pub use statesmith_utils::error::LlmError;
pub use types::{LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, Message, Role};

#[cfg(any(test, feature = "test-utils"))]
pub use test_support::ScriptedBackend;

use anthropic_backend::AnthropicBackend;
use openai_backend::{OpenAiCompatibleBackend, OpenAiFlavor};
use statesmith_config::{Config, SUPPORTED_PROVIDERS};
use statesmith_utils::redaction::redact_error_message;
use tracing::{error, warn};

/// Construct a backend for one provider, without fallback.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown and
/// `LlmError::Misconfiguration` if its configuration is incomplete.
fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    let backend: Box<dyn LlmBackend> = match provider {
        "openai" => Box::new(OpenAiCompatibleBackend::new_from_config(
            OpenAiFlavor::OpenAi,
            config,
        )?),
        "openrouter" => Box::new(OpenAiCompatibleBackend::new_from_config(
            OpenAiFlavor::OpenRouter,
            config,
        )?),
        "anthropic" => Box::new(AnthropicBackend::new_from_config(config)?),
        unknown => {
            return Err(LlmError::Unsupported(format!(
                "Unknown LLM provider '{unknown}'. Supported providers: {}.",
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
    };

    let config_budget = config
        .llm
        .provider_config(provider)
        .and_then(|section| section.budget);

    Ok(BudgetedBackend::wrap_from_config(backend, config_budget))
}

/// Create a backend from configuration, returning fallback metadata when used.
///
/// If the primary provider fails to construct and `llm.fallback_provider` is
/// set, the fallback backend is returned together with an [`LlmFallbackInfo`]
/// describing the switch.
///
/// # Errors
///
/// Returns the primary provider's error when it fails and either no fallback
/// is configured or the fallback fails as well.
pub fn from_config_with_fallback(
    config: &Config,
) -> Result<(Box<dyn LlmBackend>, Option<LlmFallbackInfo>), LlmError> {
    let provider = config.provider();

    let primary_error = match construct_backend_for_provider(provider, config) {
        Ok(backend) => return Ok((backend, None)),
        Err(e) => e,
    };

    let Some(fallback_provider) = config.llm.fallback_provider.as_deref() else {
        return Err(primary_error);
    };

    let reason = redact_error_message(&primary_error.to_string());
    warn!(
        primary = provider,
        fallback = fallback_provider,
        reason = %reason,
        "Primary provider failed during construction, attempting fallback"
    );

    match construct_backend_for_provider(fallback_provider, config) {
        Ok(fallback_backend) => Ok((
            fallback_backend,
            Some(LlmFallbackInfo {
                primary_provider: provider.to_string(),
                fallback_provider: fallback_provider.to_string(),
                reason,
            }),
        )),
        Err(fallback_error) => {
            error!(
                fallback = fallback_provider,
                error = %redact_error_message(&fallback_error.to_string()),
                "Fallback provider also failed"
            );
            // The primary error is the more relevant one to report
            Err(primary_error)
        }
    }
}

/// Create a backend from configuration, discarding fallback metadata.
///
/// # Errors
///
/// See [`from_config_with_fallback`].
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let (backend, _fallback_info) = from_config_with_fallback(config)?;
    Ok(backend)
}

#[cfg(test)]
mod factory_tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn config_with_key_env(provider: &str, key_env: &str) -> Config {
        let mut config = Config::minimal_for_testing();
        config.llm.provider = Some(provider.to_string());
        let section = Some(statesmith_config::ProviderConfig {
            api_key_env: Some(key_env.to_string()),
            ..Default::default()
        });
        config.llm.openai = section.clone();
        config.llm.openrouter = section.clone();
        config.llm.anthropic = section;
        config
    }

    #[test]
    fn test_unknown_provider_fails_cleanly() {
        let mut config = Config::minimal_for_testing();
        config.llm.provider = Some("invalid-provider".to_string());

        match from_config(&config) {
            Err(LlmError::Unsupported(msg)) => {
                assert!(msg.contains("invalid-provider"));
                assert!(msg.contains("Unknown LLM provider"));
            }
            Err(other) => panic!("Expected Unsupported, got {other:?}"),
            Ok(_) => panic!("Expected Unsupported, got a backend"),
        }
    }

    #[test]
    fn test_each_provider_constructs_with_key() {
        let _guard = env_guard();
        let key_env = "STATESMITH_FACTORY_TEST_KEY";
        unsafe {
            std::env::set_var(key_env, "sk-factory");
        }

        let results: Vec<bool> = SUPPORTED_PROVIDERS
            .iter()
            .map(|provider| from_config(&config_with_key_env(provider, key_env)).is_ok())
            .collect();

        unsafe {
            std::env::remove_var(key_env);
        }
        assert_eq!(results, vec![true, true, true]);
    }

    #[test]
    fn test_fallback_is_used_when_primary_fails() {
        let _guard = env_guard();
        let missing = "STATESMITH_FB_MISSING";
        let present = "STATESMITH_FB_PRESENT";
        unsafe {
            std::env::remove_var(missing);
            std::env::set_var(present, "sk-fallback");
        }

        let mut config = config_with_key_env("openai", missing);
        config.llm.fallback_provider = Some("anthropic".to_string());
        config.llm.anthropic = Some(statesmith_config::ProviderConfig {
            api_key_env: Some(present.to_string()),
            ..Default::default()
        });

        let result = from_config_with_fallback(&config);
        unsafe {
            std::env::remove_var(present);
        }

        match result {
            Ok((_, Some(info))) => {
                assert_eq!(info.primary_provider, "openai");
                assert_eq!(info.fallback_provider, "anthropic");
                assert!(info.reason.contains(missing));
            }
            Ok((_, None)) => panic!("Expected fallback info"),
            Err(e) => panic!("Expected fallback backend, got {e:?}"),
        }
    }

    #[test]
    fn test_primary_error_is_reported_when_both_fail() {
        let _guard = env_guard();
        let missing = "STATESMITH_FACTORY_TEST_BOTH_MISSING";
        unsafe {
            std::env::remove_var(missing);
        }

        let mut config = config_with_key_env("openrouter", missing);
        config.llm.fallback_provider = Some("anthropic".to_string());

        match from_config_with_fallback(&config) {
            Err(LlmError::Misconfiguration(msg)) => assert!(msg.contains("openrouter")),
            Err(other) => panic!("Expected Misconfiguration, got {other:?}"),
            Ok(_) => panic!("Expected an error"),
        }
    }
}
