use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `StatesmithError` is what the CLI and embedding callers see. Each variant
/// wraps the error of the stage that failed so callers can tell whether the
/// oracle, the synthesis loop, or their own configuration was at fault.
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Llm` | Oracle transport/provider failures |
/// | `Reasoning` | Synthesis, verification or transition-selection failures |
/// | `Io` | Reading catalogs, state files, or config |
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes.
///
/// # Example
///
/// ```rust
/// use statesmith_utils::error::{ReasoningError, StatesmithError};
/// use statesmith_utils::exit_codes::ExitCode;
///
/// let err = StatesmithError::Reasoning(ReasoningError::InvalidTransition {
///     response: "t3".to_string(),
/// });
/// assert_eq!(err.to_exit_code(), ExitCode::INVALID_TRANSITION);
/// assert!(err.display_for_user().contains("Suggestions:"));
/// ```
#[derive(Error, Debug)]
pub enum StatesmithError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Reasoning error: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input {what}: {reason}")]
    InvalidInput { what: String, reason: String },
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Oracle,
    Synthesis,
    Verification,
    Selection,
    FileSystem,
    Input,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Oracle => write!(f, "Oracle"),
            Self::Synthesis => write!(f, "Synthesis"),
            Self::Verification => write!(f, "Verification"),
            Self::Selection => write!(f, "Transition Selection"),
            Self::FileSystem => write!(f, "File System"),
            Self::Input => write!(f, "Input"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::ValidationFailed { errors, .. } => {
                format!(
                    "Configuration validation failed with {} errors: {}",
                    errors.len(),
                    errors.join(", ")
                )
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [defaults], [synthesis] and [llm] sections."
                    .to_string(),
            ),
            Self::NotFound { .. } => Some(
                "An explicit --config path must point at an existing file.".to_string(),
            ),
            Self::ValidationFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Compare with the example configuration in the README".to_string(),
            ],
            Self::NotFound { .. } => vec![
                "Check the --config path".to_string(),
                "Omit --config to discover .statesmith/config.toml instead".to_string(),
            ],
            Self::ValidationFailed { .. } => vec![
                "Review each listed problem and fix the corresponding key".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Oracle (LLM backend) errors.
///
/// Every variant is a transport-level failure from the synthesis loop's point
/// of view: none of them is retried by the repair protocol.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed provider payload)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!("LLM budget exceeded: attempted {attempted} calls, limit is {limit}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("Transport errors occur when the LLM backend cannot be reached.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a completion takes longer than the configured limit."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("Budget limits prevent excessive LLM API calls and costs.".to_string())
            }
            Self::Misconfiguration(_) | Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Check network connectivity to the provider".to_string(),
                "Retry the operation later".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Export the API key named by api_key_env in [llm.<provider>]".to_string(),
            ],
            Self::ProviderQuota(_) => vec!["Wait before retrying or raise the quota".to_string()],
            Self::Timeout { .. } => {
                vec!["Increase [defaults] timeout_secs in .statesmith/config.toml".to_string()]
            }
            Self::BudgetExceeded { .. } => vec![
                "Raise the budget via STATESMITH_LLM_BUDGET or [llm.<provider>] budget"
                    .to_string(),
            ],
            Self::Misconfiguration(_) => {
                vec!["Review the [llm] section of .statesmith/config.toml".to_string()]
            }
            Self::Unsupported(_) => {
                vec!["Use one of the supported providers: openai, openrouter, anthropic".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Oracle
    }
}

/// Rejections raised by the execution engine while compiling or instantiating
/// a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine has no states")]
    Empty,

    #[error("duplicate state id '{id}'")]
    DuplicateState { id: String },

    #[error("state '{state}' transitions to unknown target '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("no task implementation registered for state '{id}'")]
    MissingTask { id: String },

    #[error("final state '{id}' must not declare transitions")]
    FinalWithTransitions { id: String },

    #[error("parallel state '{id}' has no child states")]
    EmptyParallel { id: String },

    #[error("instantiation failed: {0}")]
    Instantiation(String),
}

impl UserFriendlyError for MachineError {
    fn user_message(&self) -> String {
        format!("The synthesized machine could not be built: {self}")
    }

    fn context(&self) -> Option<String> {
        Some(
            "Structural verification compiles the state list and instantiates it without running it."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Re-run program; the oracle output is non-deterministic".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Verification
    }
}

/// Failures of the generate/validate/repair pipeline.
///
/// Each variant names the stage that gave up. Repairs are bounded, so every
/// variant here is final for the call that produced it.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// The oracle call itself failed.
    #[error(transparent)]
    Transport(#[from] LlmError),

    /// Oracle output still did not parse after the syntax repair.
    #[error("oracle output is not a valid state list after {attempts} attempt(s): {message}")]
    Syntax {
        message: String,
        response: String,
        attempts: u32,
    },

    /// State ids absent from the catalog, surfaced only when no repair
    /// remains to fix them.
    #[error("Unknown state ID encountered: {}", .ids.join(","))]
    Referential { ids: Vec<String> },

    /// The execution engine rejected the definition set.
    #[error("structural verification failed: {0}")]
    Structural(#[from] MachineError),

    /// The chosen transition is not one of the current state's transitions.
    #[error("Invalid model response: {response}")]
    InvalidTransition { response: String },
}

impl UserFriendlyError for ReasoningError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(e) => e.user_message(),
            Self::Syntax { message, .. } => {
                format!("The model did not produce valid JSON even after a repair: {message}")
            }
            Self::Referential { ids } => format!(
                "The model referenced states that are not in the catalog: {}",
                ids.join(", ")
            ),
            Self::Structural(e) => e.user_message(),
            Self::InvalidTransition { response } => {
                format!("The model chose a transition that does not exist: {response}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(e) => e.context(),
            Self::Syntax { .. } => {
                Some("Only one syntax repair is attempted per program call.".to_string())
            }
            Self::Referential { .. } => Some(
                "Every non-parallel, non-terminal state id must appear in the catalog.".to_string(),
            ),
            Self::Structural(e) => e.context(),
            Self::InvalidTransition { .. } => {
                Some("Only one repair is attempted when choosing a transition.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(e) => e.suggestions(),
            Self::Structural(e) => e.suggestions(),
            Self::Referential { .. } => vec![
                "Make sure the catalog lists every capability the task needs".to_string(),
                "Re-run program".to_string(),
            ],
            Self::Syntax { .. } | Self::InvalidTransition { .. } => {
                vec!["Re-run the operation".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Oracle,
            Self::Syntax { .. } | Self::Referential { .. } => ErrorCategory::Synthesis,
            Self::Structural(_) => ErrorCategory::Verification,
            Self::InvalidTransition { .. } => ErrorCategory::Selection,
        }
    }
}

impl UserFriendlyError for StatesmithError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Reasoning(e) => e.user_message(),
            Self::Io(e) => format!("File system error: {e}"),
            Self::InvalidInput { what, reason } => format!("Invalid {what}: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Reasoning(e) => e.context(),
            Self::Io(_) | Self::InvalidInput { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Reasoning(e) => e.suggestions(),
            Self::Io(_) => vec!["Check that the file exists and is readable".to_string()],
            Self::InvalidInput { .. } => vec!["Check the input file format".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Reasoning(e) => e.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::InvalidInput { .. } => ErrorCategory::Input,
        }
    }
}

impl StatesmithError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {}\n", ctx));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {}\n", suggestion));
            }
        }

        crate::redaction::redact_error_message(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            StatesmithError::Config(_) | StatesmithError::InvalidInput { .. } => ExitCode::CLI_ARGS,
            StatesmithError::Llm(e) | StatesmithError::Reasoning(ReasoningError::Transport(e)) => {
                llm_exit_code(e)
            }
            StatesmithError::Reasoning(ReasoningError::InvalidTransition { .. }) => {
                ExitCode::INVALID_TRANSITION
            }
            StatesmithError::Reasoning(_) => ExitCode::SYNTHESIS_FAILURE,
            StatesmithError::Io(_) => ExitCode::INTERNAL,
        }
    }
}

fn llm_exit_code(err: &LlmError) -> ExitCode {
    match err {
        LlmError::Timeout { .. } => ExitCode::TIMEOUT,
        LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
        LlmError::Transport(_)
        | LlmError::ProviderAuth(_)
        | LlmError::ProviderQuota(_)
        | LlmError::ProviderOutage(_)
        | LlmError::BudgetExceeded { .. } => ExitCode::ORACLE_FAILURE,
    }
}
