//! Configuration management for statesmith
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > env > file > defaults. Supports TOML configuration files with
//! `[defaults]`, `[synthesis]`, `[roles.<role>]` and `[llm]` sections.

mod discovery;
mod model;
mod sources;
mod validation;

use std::path::PathBuf;
use std::time::Duration;

pub use discovery::{CONFIG_DIR_NAME, HOME_ENV, PROVIDER_ENV};
pub use model::*;
pub use statesmith_prompt_template::{PromptRole, PromptTemplate};

/// Command-line overrides layered on top of file and default values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub variant: Option<String>,
    pub model: Option<String>,
    pub llm_provider: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl Config {
    /// Engine variant; validated values always parse.
    #[must_use]
    pub fn variant(&self) -> EngineVariant {
        self.defaults
            .variant
            .as_deref()
            .and_then(|v| EngineVariant::parse(v).ok())
            .unwrap_or_default()
    }

    /// Primary provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Prompt template flavour; `default` when unset.
    #[must_use]
    pub fn prompt_template(&self) -> PromptTemplate {
        self.llm
            .prompt_template
            .as_deref()
            .and_then(|t| PromptTemplate::parse(t).ok())
            .unwrap_or_default()
    }

    /// Per-call oracle timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Get the model to use for a role.
    ///
    /// Precedence (highest to lowest):
    /// 1. Role override (`[roles.<role>].model`)
    /// 2. Global default (`[defaults].model`)
    /// 3. Provider default (`[llm.<provider>].model`)
    /// 4. Hard default: `"gpt-4o"`, or a Claude model for `anthropic`
    ///
    /// # Example
    ///
    /// ```toml
    /// [defaults]
    /// model = "gpt-4o-mini"
    ///
    /// [roles.programmer]
    /// model = "gpt-4o"
    /// ```
    ///
    /// With the above config the programmer runs on `gpt-4o` and every other
    /// role on `gpt-4o-mini`.
    #[must_use]
    pub fn model_for(&self, role: PromptRole) -> String {
        let role_config = match role {
            PromptRole::Solver => self.roles.solver.as_ref(),
            PromptRole::Programmer => self.roles.programmer.as_ref(),
            PromptRole::Evaluator => None,
            PromptRole::Transition => self.roles.transition.as_ref(),
        };

        role_config
            .and_then(|rc| rc.model.clone())
            .or_else(|| self.defaults.model.clone())
            .or_else(|| {
                self.llm
                    .provider_config(self.provider())
                    .and_then(|pc| pc.model.clone())
            })
            .unwrap_or_else(|| default_model_for_provider(self.provider()).to_string())
    }

    /// This configuration with `provider` as the active provider.
    ///
    /// Used once a fallback backend has replaced the primary, so provider
    /// defaults such as the model resolve against the backend actually in use.
    #[must_use]
    pub fn with_provider(&self, provider: &str) -> Self {
        let mut config = self.clone();
        config.llm.provider = Some(provider.to_string());
        config
    }

    /// Reference repairs per `program` call, at least one.
    #[must_use]
    pub fn reference_repairs(&self) -> u32 {
        self.synthesis.reference_repairs.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn revalidate_references(&self) -> bool {
        self.synthesis.revalidate_references.unwrap_or(false)
    }

    /// Whole-program attempts, at least one.
    #[must_use]
    pub fn program_attempts(&self) -> u32 {
        self.synthesis.program_attempts.unwrap_or(1).max(1)
    }

    /// A valid configuration built from defaults only, without touching the
    /// filesystem or environment.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            synthesis: SynthesisConfig::default(),
            roles: RolesConfig::default(),
            llm: LlmConfig {
                provider: Some(DEFAULT_PROVIDER.to_string()),
                ..Default::default()
            },
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
