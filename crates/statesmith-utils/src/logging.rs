//! Logging and observability infrastructure for statesmith
//!
//! Structured logging via `tracing`. Every top-level operation runs inside an
//! [`operation_span`]; oracle calls and repairs emit events inside it.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and NO_COLOR is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise verbose mode logs statesmith crates
/// at debug level with span close events; compact mode logs at info.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("statesmith=debug,info")
            } else {
                EnvFilter::try_new("statesmith=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one top-level operation (solve, program, evaluate, transition).
pub fn operation_span(operation: &str, variant: &str, request_id: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "operation",
        operation = %operation,
        variant = %variant,
        request_id = %request_id,
    )
}

/// Log operation completion with duration
pub fn log_operation_complete(operation: &str, oracle_calls: u32, duration_ms: u128) {
    info!(
        operation = %operation,
        oracle_calls = oracle_calls,
        duration_ms = %duration_ms,
        "Operation completed"
    );
}

/// Log operation failure.
///
/// Error messages are redacted to prevent secrets from appearing in logs.
pub fn log_operation_error(operation: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_error_message(error);

    error!(
        operation = %operation,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Operation failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_span_has_metadata() {
        let span = operation_span("program", "strict", "req-1");
        // Without a subscriber the span is disabled, but construction must not panic.
        let _guard = span.enter();
    }

    #[test]
    fn test_log_helpers_do_not_panic_without_subscriber() {
        log_operation_complete("transition", 2, 15);
        log_operation_error("program", "https://u:p@host failed", 3);
    }
}
