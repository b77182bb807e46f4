use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use statesmith_utils::error::ConfigError;

use super::{
    CliArgs, Config, ConfigSource, DEFAULT_PROVIDER, Defaults, LlmConfig, RolesConfig,
    SynthesisConfig,
};

/// Directory holding the discovered config file.
pub const CONFIG_DIR_NAME: &str = ".statesmith";

/// Environment variable naming a directory that holds `config.toml`.
pub const HOME_ENV: &str = "STATESMITH_HOME";

/// Environment variable overriding the configured provider.
pub const PROVIDER_ENV: &str = "STATESMITH_LLM_PROVIDER";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    defaults: Option<Defaults>,
    synthesis: Option<SynthesisConfig>,
    roles: Option<RolesConfig>,
    llm: Option<LlmConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid depending on the
    /// process working directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut synthesis = SynthesisConfig::default();
        let mut roles = RolesConfig::default();
        let mut llm = LlmConfig::default();

        for key in [
            "variant",
            "timeout_secs",
            "verbose",
            "reference_repairs",
            "revalidate_references",
            "program_attempts",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => Some(explicit_path.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.variant.is_some() {
                    defaults.variant = file_defaults.variant;
                    source_attribution.insert("variant".to_string(), config_source.clone());
                }
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), config_source.clone());
                }
                if file_defaults.timeout_secs.is_some() {
                    defaults.timeout_secs = file_defaults.timeout_secs;
                    source_attribution.insert("timeout_secs".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
            }

            if let Some(file_synthesis) = file_config.synthesis {
                if file_synthesis.reference_repairs.is_some() {
                    synthesis.reference_repairs = file_synthesis.reference_repairs;
                    source_attribution
                        .insert("reference_repairs".to_string(), config_source.clone());
                }
                if file_synthesis.revalidate_references.is_some() {
                    synthesis.revalidate_references = file_synthesis.revalidate_references;
                    source_attribution
                        .insert("revalidate_references".to_string(), config_source.clone());
                }
                if file_synthesis.program_attempts.is_some() {
                    synthesis.program_attempts = file_synthesis.program_attempts;
                    source_attribution
                        .insert("program_attempts".to_string(), config_source.clone());
                }
            }

            if let Some(file_roles) = file_config.roles {
                roles = file_roles;
                source_attribution.insert("roles".to_string(), config_source.clone());
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), config_source.clone());
                }
                if file_llm.fallback_provider.is_some() {
                    llm.fallback_provider = file_llm.fallback_provider;
                    source_attribution
                        .insert("llm_fallback_provider".to_string(), config_source.clone());
                }
                if file_llm.prompt_template.is_some() {
                    llm.prompt_template = file_llm.prompt_template;
                    source_attribution.insert("prompt_template".to_string(), config_source.clone());
                }
                if let Some(openai) = file_llm.openai {
                    llm.openai = Some(openai);
                    source_attribution.insert("llm_openai_config".to_string(), config_source.clone());
                }
                if let Some(openrouter) = file_llm.openrouter {
                    llm.openrouter = Some(openrouter);
                    source_attribution
                        .insert("llm_openrouter_config".to_string(), config_source.clone());
                }
                if let Some(anthropic) = file_llm.anthropic {
                    llm.anthropic = Some(anthropic);
                    source_attribution.insert("llm_anthropic_config".to_string(), config_source);
                }
            }
        }

        // Apply CLI overrides (highest priority)
        if let Some(variant) = &cli_args.variant {
            defaults.variant = Some(variant.clone());
            source_attribution.insert("variant".to_string(), ConfigSource::Cli);
        }
        if let Some(model) = &cli_args.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(timeout_secs) = cli_args.timeout_secs {
            defaults.timeout_secs = Some(timeout_secs);
            source_attribution.insert("timeout_secs".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }

        // Provider precedence: CLI > env > config > default
        if let Ok(env_provider) = env::var(PROVIDER_ENV)
            && !env_provider.is_empty()
        {
            llm.provider = Some(env_provider);
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Env);
        }
        if let Some(provider) = &cli_args.llm_provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if llm.provider.is_none() {
            llm.provider = Some(DEFAULT_PROVIDER.to_string());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Defaults);
        }

        let config = Self {
            defaults,
            synthesis,
            roles,
            llm,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Locate the config file for a starting directory.
    ///
    /// `STATESMITH_HOME/config.toml` wins when it exists. Otherwise walks up
    /// the directory tree looking for `.statesmith/config.toml`, stopping at
    /// repository root markers (.git, .hg, .svn) or the filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        if let Ok(home) = env::var(HOME_ENV)
            && !home.is_empty()
        {
            let home_config = PathBuf::from(home).join("config.toml");
            if home_config.exists() {
                return Ok(Some(home_config));
            }
        }

        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_DIR_NAME).join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read config file {}", path.display())));
            }
        };
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("{}: {e}", path.display())).into()
        })
    }

    /// Discover configuration from environment and filesystem without any CLI
    /// overrides.
    ///
    /// This is the entry point for library consumers who want CLI-like
    /// behavior without constructing [`CliArgs`].
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined, a config
    /// file exists but cannot be parsed, or validation fails.
    pub fn discover_from_env_and_fs() -> Result<Self> {
        Self::discover(&CliArgs::default())
    }
}
