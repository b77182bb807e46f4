//! Helpers shared by the command handlers.

use std::future::Future;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use statesmith_config::Config;
use statesmith_engine::{ReasoningEngine, ReasoningError, engine_from_config, with_deadline};
use statesmith_utils::error::StatesmithError;
use tracing::warn;

/// Use the argument when given, otherwise read all of stdin.
pub fn read_argument_or_stdin(argument: Option<String>, what: &str) -> Result<String> {
    let text = match argument {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .with_context(|| format!("Failed to read {what} from stdin"))?;
            buffer
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StatesmithError::InvalidInput {
            what: what.to_string(),
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(trimmed.to_string())
}

/// Read a file, or stdin when the path is `-`.
pub fn read_file_or_stdin(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(StatesmithError::Io)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path)
        .map_err(StatesmithError::Io)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Build the configured engine, reporting a provider fallback on stderr.
pub fn build_engine(config: &Config) -> Result<Box<dyn ReasoningEngine>> {
    let (engine, fallback) = engine_from_config(config).map_err(StatesmithError::Llm)?;

    if let Some(info) = fallback {
        warn!(
            primary = %info.primary_provider,
            fallback = %info.fallback_provider,
            "Using fallback provider"
        );
        eprintln!(
            "⚠ Provider '{}' unavailable ({}); using '{}'",
            info.primary_provider, info.reason, info.fallback_provider
        );
    }

    Ok(engine)
}

/// Await an engine operation, bounded by the optional deadline.
pub async fn bounded<T, Fut>(deadline: Option<Duration>, operation: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T, ReasoningError>>,
{
    let result = match deadline {
        Some(deadline) => with_deadline(deadline, operation).await,
        None => operation.await,
    };
    result.map_err(|e| StatesmithError::Reasoning(e).into())
}
