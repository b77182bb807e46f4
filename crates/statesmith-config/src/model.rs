use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use statesmith_prompt_template::PromptRole;

/// Model used when neither a role, the defaults, nor the provider name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Fallback model for the Anthropic provider.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Hard default model for a provider.
#[must_use]
pub fn default_model_for_provider(provider: &str) -> &'static str {
    match provider {
        "anthropic" => DEFAULT_ANTHROPIC_MODEL,
        _ => DEFAULT_MODEL,
    }
}

/// Per-call oracle timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Providers with a built-in backend.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "openrouter", "anthropic"];

/// Where an effective configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Command-line flag (highest precedence).
    Cli,
    /// Environment variable.
    Env,
    /// Discovered or explicit TOML file.
    ConfigFile(PathBuf),
    /// Built-in default (lowest precedence).
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env => write!(f, "env"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Defaults => write!(f, "default"),
        }
    }
}

/// Which engine strategy serves the four operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    /// Reference repair without re-check, no verification inside `program`.
    #[default]
    Lenient,
    /// No reference repair, structural verification gates `program`.
    Strict,
}

impl EngineVariant {
    /// Parse a variant name. `v1` and `v2` are accepted as aliases.
    ///
    /// # Errors
    ///
    /// Returns an error message naming the accepted values.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "lenient" | "v1" => Ok(Self::Lenient),
            "strict" | "v2" => Ok(Self::Strict),
            _ => Err(format!(
                "'{s}' is not a valid variant. Must be 'lenient' or 'strict'"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective configuration with source attribution.
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub synthesis: SynthesisConfig,
    pub roles: RolesConfig,
    pub llm: LlmConfig,
    /// Which layer each key was taken from.
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    pub variant: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            variant: Some(EngineVariant::default().as_str().to_string()),
            model: None,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            verbose: Some(false),
        }
    }
}

/// `[synthesis]` section: repair depth of the program loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthesisConfig {
    /// Reference repairs allowed per `program` call in the lenient variant.
    pub reference_repairs: Option<u32>,
    /// Re-check the catalog after each reference repair.
    pub revalidate_references: Option<bool>,
    /// Whole-program attempts when structural verification fails.
    pub program_attempts: Option<u32>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            reference_repairs: Some(1),
            revalidate_references: Some(false),
            program_attempts: Some(1),
        }
    }
}

/// Roles that make oracle calls and so accept a `[roles.<role>]` model.
///
/// Evaluation only compiles the machine, so the evaluator has no model.
pub const MODEL_ROLES: [PromptRole; 3] = [
    PromptRole::Solver,
    PromptRole::Programmer,
    PromptRole::Transition,
];

/// `[roles.<role>]` sections.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RolesConfig {
    pub solver: Option<RoleConfig>,
    pub programmer: Option<RoleConfig>,
    pub transition: Option<RoleConfig>,
}

/// Per-role overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoleConfig {
    pub model: Option<String>,
}

/// `[llm]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub fallback_provider: Option<String>,
    /// Prompt template flavour
    ///
    /// Available templates:
    /// - "default": compatible with all providers
    /// - "claude-optimized": Anthropic only
    /// - "openai-compatible": OpenAI and OpenRouter
    pub prompt_template: Option<String>,
    pub openai: Option<ProviderConfig>,
    pub openrouter: Option<ProviderConfig>,
    pub anthropic: Option<ProviderConfig>,
}

/// HTTP provider settings (`[llm.openai]`, `[llm.openrouter]`, `[llm.anthropic]`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Maximum oracle calls per process.
    pub budget: Option<u32>,
}

impl LlmConfig {
    /// Settings block for a provider name, if configured.
    #[must_use]
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        match provider {
            "openai" => self.openai.as_ref(),
            "openrouter" => self.openrouter.as_ref(),
            "anthropic" => self.anthropic.as_ref(),
            _ => None,
        }
    }
}
