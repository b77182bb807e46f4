use std::collections::BTreeMap;

use super::{Config, ConfigSource, MODEL_ROLES};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Defaults).to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add_config("variant", self.variant().to_string());
        if let Some(model) = &self.defaults.model {
            add_config("model", model.clone());
        }
        add_config("timeout_secs", self.timeout().as_secs().to_string());
        add_config("reference_repairs", self.reference_repairs().to_string());
        add_config(
            "revalidate_references",
            self.revalidate_references().to_string(),
        );
        add_config("program_attempts", self.program_attempts().to_string());
        add_config("llm_provider", self.provider().to_string());
        if let Some(fallback) = &self.llm.fallback_provider {
            add_config("llm_fallback_provider", fallback.clone());
        }
        add_config("prompt_template", self.prompt_template().as_str().to_string());

        for role in MODEL_ROLES {
            let source = if self.source_attribution.contains_key("roles") {
                self.source_attribution.get("roles")
            } else {
                self.source_attribution.get("model")
            };
            config.insert(
                format!("model.{role}"),
                (self.model_for(role), source_label(source)),
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_lists_resolved_values() {
        let mut config = Config::minimal_for_testing();
        config.defaults.model = Some("gpt-4o-mini".into());
        config
            .source_attribution
            .insert("model".into(), ConfigSource::Cli);

        let effective = config.effective_config();

        assert_eq!(
            effective.get("variant"),
            Some(&("lenient".to_string(), "default".to_string()))
        );
        assert_eq!(
            effective.get("model"),
            Some(&("gpt-4o-mini".to_string(), "cli".to_string()))
        );
        assert_eq!(
            effective.get("model.transition").map(|(v, _)| v.as_str()),
            Some("gpt-4o-mini")
        );
        assert_eq!(
            effective.get("prompt_template").map(|(v, _)| v.as_str()),
            Some("default")
        );
        assert!(!effective.contains_key("model.evaluator"));
    }
}
