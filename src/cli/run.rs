//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use statesmith_config::{CliArgs, Config};
use statesmith_machine::Catalog;
use statesmith_utils::error::StatesmithError;
use statesmith_utils::exit_codes::ExitCode;
use statesmith_utils::logging::init_tracing;
use statesmith_utils::redaction::redact_error_message;

use super::args::{Cli, Commands};
use super::commands;

/// Main CLI execution function.
///
/// Handles ALL output including errors. On error the message is printed here
/// and the exit code returned; main.rs only exits with it.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = cli_args_from(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "✗ Configuration error: {}",
                redact_error_message(&format!("{err:#}"))
            );
            return Err(ExitCode::CLI_ARGS);
        }
    };

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("⚠ Failed to initialize logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();
    let deadline = cli.deadline.map(Duration::from_secs);

    let result = rt.block_on(dispatch(cli.command, &config, deadline));

    if let Err(error) = result {
        return Err(report_error(&error, operation));
    }

    Ok(())
}

/// Map global flags onto the configuration overrides.
pub(crate) fn cli_args_from(cli: &Cli) -> CliArgs {
    CliArgs {
        config_path: cli.config.clone(),
        variant: cli.variant.clone(),
        model: cli.model.clone(),
        llm_provider: cli.llm_provider.clone(),
        timeout_secs: cli.timeout,
        verbose: Some(cli.verbose),
    }
}

async fn dispatch(command: Commands, config: &Config, deadline: Option<Duration>) -> Result<()> {
    let mut out = std::io::stdout();

    match command {
        Commands::Solve { query } => {
            let query = commands::read_argument_or_stdin(query, "query")?;
            let engine = commands::build_engine(config)?;
            commands::execute_solve_command(engine.as_ref(), &query, deadline, &mut out).await
        }
        Commands::Program {
            query,
            catalog,
            catalog_file,
            evaluate,
        } => {
            let catalog_text = match (catalog, catalog_file) {
                (Some(text), _) => text,
                (None, Some(path)) => commands::read_file_or_stdin(&path)?,
                (None, None) => {
                    return Err(StatesmithError::InvalidInput {
                        what: "catalog".to_string(),
                        reason: "pass --catalog or --catalog-file".to_string(),
                    }
                    .into());
                }
            };
            let query = commands::read_argument_or_stdin(query, "query")?;
            let engine = commands::build_engine(config)?;
            commands::execute_program_command(
                engine.as_ref(),
                &query,
                &Catalog::from(catalog_text.as_str()),
                evaluate,
                deadline,
                &mut out,
            )
            .await
        }
        Commands::Evaluate { states_file, query } => {
            let states_json = commands::read_file_or_stdin(&states_file)?;
            commands::execute_evaluate_command(config.variant(), &states_json, &query, &mut out)
        }
        Commands::Transition {
            state,
            payload,
            task_list,
        } => {
            let engine = commands::build_engine(config)?;
            commands::execute_transition_command(
                engine.as_ref(),
                &task_list,
                &state,
                &payload,
                deadline,
                &mut out,
            )
            .await
        }
        Commands::Config { json } => commands::execute_config_command(config, json, &mut out),
    }
}

/// Print an error for the user and pick the exit code.
pub(crate) fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(statesmith_error) = error.downcast_ref::<StatesmithError>() {
        eprintln!("✗ {operation} failed");
        eprintln!("{}", statesmith_error.display_for_user());
        return statesmith_error.to_exit_code();
    }

    eprintln!(
        "✗ Unexpected error during {operation}: {}",
        redact_error_message(&format!("{error:#}"))
    );
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}
