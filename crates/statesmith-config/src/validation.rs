use statesmith_prompt_template::PromptTemplate;
use statesmith_utils::error::ConfigError;

use super::{Config, EngineVariant, SUPPORTED_PROVIDERS};

impl Config {
    /// Validate configuration values, reporting every problem at once.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Some(variant) = &self.defaults.variant
            && let Err(e) = EngineVariant::parse(variant)
        {
            errors.push(format!("defaults.variant: {e}"));
        }

        if let Some(timeout) = self.defaults.timeout_secs {
            if timeout == 0 {
                errors.push("defaults.timeout_secs: must be greater than 0".to_string());
            } else if timeout > 3600 {
                errors.push(
                    "defaults.timeout_secs: exceeds maximum limit of 3600 seconds (1 hour)"
                        .to_string(),
                );
            }
        }

        if let Some(model) = &self.defaults.model
            && model.trim().is_empty()
        {
            errors.push("defaults.model: must not be empty".to_string());
        }

        if let Some(repairs) = self.synthesis.reference_repairs
            && !(1..=5).contains(&repairs)
        {
            errors.push("synthesis.reference_repairs: must be between 1 and 5".to_string());
        }

        if let Some(attempts) = self.synthesis.program_attempts
            && !(1..=10).contains(&attempts)
        {
            errors.push("synthesis.program_attempts: must be between 1 and 10".to_string());
        }

        let supported = SUPPORTED_PROVIDERS.join(", ");
        match &self.llm.provider {
            Some(provider) if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) => {
                errors.push(format!(
                    "llm.provider: '{provider}' is not supported. Supported providers: {supported}"
                ));
            }
            Some(_) => {}
            None => errors.push("llm.provider: is required (defaults to 'openai')".to_string()),
        }

        if let Some(fallback) = &self.llm.fallback_provider
            && !SUPPORTED_PROVIDERS.contains(&fallback.as_str())
        {
            errors.push(format!(
                "llm.fallback_provider: '{fallback}' is not supported. Supported providers: {supported}"
            ));
        }

        if let Some(template_name) = &self.llm.prompt_template {
            match PromptTemplate::parse(template_name) {
                Ok(template) => {
                    if let Some(provider) = &self.llm.provider
                        && let Err(e) = template.validate_provider_compatibility(provider)
                    {
                        errors.push(format!("llm.prompt_template: {e}"));
                    }
                }
                Err(e) => errors.push(format!("llm.prompt_template: {e}")),
            }
        }

        for name in SUPPORTED_PROVIDERS {
            let Some(provider) = self.llm.provider_config(name) else {
                continue;
            };
            if let Some(temperature) = provider.temperature
                && !(0.0..=2.0).contains(&temperature)
            {
                errors.push(format!("llm.{name}.temperature: must be between 0.0 and 2.0"));
            }
            if provider.max_tokens == Some(0) {
                errors.push(format!("llm.{name}.max_tokens: must be greater than 0"));
            }
            if provider.budget == Some(0) {
                errors.push(format!("llm.{name}.budget: must be greater than 0"));
            }
            if let Some(env_name) = &provider.api_key_env
                && env_name.trim().is_empty()
            {
                errors.push(format!("llm.{name}.api_key_env: must not be empty"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed {
                error_count: errors.len(),
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderConfig;

    fn validation_errors(config: &Config) -> Vec<String> {
        match config.validate() {
            Ok(()) => Vec::new(),
            Err(ConfigError::ValidationFailed { errors, .. }) => errors,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let config = Config::minimal_for_testing();
        assert!(validation_errors(&config).is_empty());
    }

    #[test]
    fn test_all_problems_are_reported() {
        let mut config = Config::minimal_for_testing();
        config.defaults.variant = Some("medium".into());
        config.defaults.timeout_secs = Some(0);
        config.synthesis.program_attempts = Some(0);
        config.llm.provider = Some("claude-cli".into());

        let errors = validation_errors(&config);
        assert_eq!(errors.len(), 4, "got: {errors:?}");
        assert!(errors[0].starts_with("defaults.variant"));
        assert!(errors[3].contains("claude-cli"));
    }

    #[test]
    fn test_template_must_match_provider() {
        let mut config = Config::minimal_for_testing();
        config.llm.provider = Some("openai".into());
        config.llm.prompt_template = Some("claude-optimized".into());

        let errors = validation_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not compatible"));
    }

    #[test]
    fn test_provider_settings_are_checked() {
        let mut config = Config::minimal_for_testing();
        config.llm.openrouter = Some(ProviderConfig {
            temperature: Some(3.5),
            budget: Some(0),
            ..Default::default()
        });

        let errors = validation_errors(&config);
        assert_eq!(
            errors,
            vec![
                "llm.openrouter.temperature: must be between 0.0 and 2.0".to_string(),
                "llm.openrouter.budget: must be greater than 0".to_string(),
            ]
        );
    }
}
