//! Prompt construction for statesmith
//!
//! The synthesis core treats prompt text as opaque. This crate supplies the
//! [`PromptSet`] seam it consumes plus a [`DefaultPrompts`] implementation whose
//! section formatting follows a [`PromptTemplate`] flavour.

mod prompts;

pub use prompts::{DefaultPrompts, PromptPair, PromptRole, PromptSet};

/// Prompt template types for provider-specific optimizations
///
/// Templates only change how prompt sections are delimited; the content is the
/// same across flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    /// Universal template compatible with all providers
    ///
    /// Delimits sections with `###### start <name> ######` banners
    #[default]
    Default,
    /// Optimized for the Anthropic Messages API
    ///
    /// Delimits sections with XML tags
    ClaudeOptimized,
    /// Optimized for OpenAI-compatible chat completion APIs
    ///
    /// Delimits sections with markdown headings
    OpenAiCompatible,
}

impl PromptTemplate {
    /// Parse a template name string into a PromptTemplate
    ///
    /// # Errors
    ///
    /// Returns an error if template name is not recognized.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "claude-optimized" | "claude_optimized" | "claude" => Ok(Self::ClaudeOptimized),
            "openai-compatible" | "openai_compatible" | "openai" | "openrouter" => {
                Ok(Self::OpenAiCompatible)
            }
            _ => Err(format!(
                "Unknown prompt template '{}'. Available templates: default, claude-optimized, openai-compatible",
                s
            )),
        }
    }

    /// Check if this template is compatible with given provider
    ///
    /// Returns `Ok(())` if compatible, or an error message explaining incompatibility.
    pub fn validate_provider_compatibility(&self, provider: &str) -> Result<(), String> {
        if self.compatible_providers().contains(&provider) {
            return Ok(());
        }
        Err(format!(
            "Prompt template '{}' is not compatible with provider '{}'. \
             Compatible providers: {}. \
             Use 'default' template for cross-provider compatibility.",
            self.as_str(),
            provider,
            self.compatible_providers().join(", ")
        ))
    }

    /// Get template name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ClaudeOptimized => "claude-optimized",
            Self::OpenAiCompatible => "openai-compatible",
        }
    }

    /// Get a list of providers compatible with this template
    #[must_use]
    pub const fn compatible_providers(&self) -> &'static [&'static str] {
        match self {
            Self::Default => &["openai", "openrouter", "anthropic"],
            Self::ClaudeOptimized => &["anthropic"],
            Self::OpenAiCompatible => &["openai", "openrouter"],
        }
    }

    /// Wrap `body` in this template's section delimiters.
    #[must_use]
    pub fn section(&self, name: &str, body: &str) -> String {
        match self {
            Self::Default => {
                format!("###### start {name} ######\n{body}\n###### end {name} ######")
            }
            Self::ClaudeOptimized => {
                let tag = name.replace(' ', "_");
                format!("<{tag}>\n{body}\n</{tag}>")
            }
            Self::OpenAiCompatible => format!("## {name}\n\n{body}"),
        }
    }
}
