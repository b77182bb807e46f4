//! CLI tests module
//!
//! Argument parsing, flag mapping, command output and error reporting.

use std::sync::Arc;

use clap::Parser;
use statesmith_config::{Config, EngineVariant};
use statesmith_engine::{ReasoningEngine, engine_for};
use statesmith_llm::ScriptedBackend;
use statesmith_machine::Catalog;
use statesmith_utils::error::{ReasoningError, StatesmithError};
use statesmith_utils::exit_codes::ExitCode;

use super::args::{Cli, Commands};
use super::commands;
use super::run::{cli_args_from, report_error};

const VALID_MACHINE: &str = r#"[{"id":"fetchData","type":"normal","transitions":["success"]},{"id":"success","type":"final"}]"#;

fn scripted_engine(responses: &[&str]) -> (Arc<ScriptedBackend>, Box<dyn ReasoningEngine>) {
    let backend = Arc::new(ScriptedBackend::new(responses.iter().copied()));
    let engine = engine_for(&Config::minimal_for_testing(), backend.clone());
    (backend, engine)
}

fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).unwrap()
}

#[test]
fn test_parse_program_with_catalog() {
    let cli = Cli::try_parse_from([
        "statesmith",
        "--variant",
        "strict",
        "program",
        "email the report",
        "--catalog",
        "fetchData, sendEmail",
        "--evaluate",
    ])
    .unwrap();

    assert_eq!(cli.variant.as_deref(), Some("strict"));
    match cli.command {
        Commands::Program {
            query,
            catalog,
            catalog_file,
            evaluate,
        } => {
            assert_eq!(query.as_deref(), Some("email the report"));
            assert_eq!(catalog.as_deref(), Some("fetchData, sendEmail"));
            assert!(catalog_file.is_none());
            assert!(evaluate);
        }
        other => panic!("Expected Program, got {other:?}"),
    }
}

#[test]
fn test_program_requires_a_catalog() {
    assert!(Cli::try_parse_from(["statesmith", "program", "q"]).is_err());
}

#[test]
fn test_catalog_and_catalog_file_conflict() {
    let result = Cli::try_parse_from([
        "statesmith",
        "program",
        "q",
        "--catalog",
        "fetchData",
        "--catalog-file",
        "tools.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_transition_defaults() {
    let cli = Cli::try_parse_from(["statesmith", "transition", "--state", "t1,t2"]).unwrap();

    match cli.command {
        Commands::Transition {
            state,
            payload,
            task_list,
        } => {
            assert_eq!(state, "t1,t2");
            assert_eq!(payload, "{}");
            assert_eq!(task_list, "");
        }
        other => panic!("Expected Transition, got {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "statesmith",
        "config",
        "--json",
        "--timeout",
        "30",
        "--llm-provider",
        "anthropic",
        "-v",
    ])
    .unwrap();

    let args = cli_args_from(&cli);
    assert_eq!(args.timeout_secs, Some(30));
    assert_eq!(args.llm_provider.as_deref(), Some("anthropic"));
    assert_eq!(args.verbose, Some(true));
    assert!(args.variant.is_none());
    assert_eq!(cli.command.operation(), "config");
}

#[tokio::test]
async fn test_solve_writes_answer() {
    let (backend, engine) = scripted_engine(&["Paris"]);
    let mut out = Vec::new();

    commands::execute_solve_command(engine.as_ref(), "capital of France?", None, &mut out)
        .await
        .unwrap();

    assert_eq!(output(out), "Paris\n");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_program_writes_state_list() {
    let (_, engine) = scripted_engine(&[VALID_MACHINE]);
    let mut out = Vec::new();

    commands::execute_program_command(
        engine.as_ref(),
        "fetch then finish",
        &Catalog::from("fetchData, sendEmail"),
        false,
        None,
        &mut out,
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(2));
    assert_eq!(json[0]["id"], "fetchData");
}

#[tokio::test]
async fn test_program_with_evaluation() {
    let (_, engine) = scripted_engine(&[VALID_MACHINE]);
    let mut out = Vec::new();

    commands::execute_program_command(
        engine.as_ref(),
        "q",
        &Catalog::from("fetchData"),
        true,
        None,
        &mut out,
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(json["states"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["evaluation"]["rating"], 5);
    assert_eq!(json["evaluation"]["correct"], true);
}

#[tokio::test]
async fn test_program_syntax_failure_maps_to_synthesis_exit_code() {
    let (_, engine) = scripted_engine(&["not json", "still not json"]);
    let mut out = Vec::new();

    let err = commands::execute_program_command(
        engine.as_ref(),
        "q",
        &Catalog::from("fetchData"),
        false,
        None,
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(out.is_empty());
    assert_eq!(report_error(&err, "program"), ExitCode::SYNTHESIS_FAILURE);
}

#[tokio::test]
async fn test_transition_writes_choice() {
    let (_, engine) = scripted_engine(&[" t2 \n"]);
    let mut out = Vec::new();

    commands::execute_transition_command(engine.as_ref(), "", "t1,t2", "{}", None, &mut out)
        .await
        .unwrap();

    assert_eq!(output(out), "t2\n");
}

#[tokio::test]
async fn test_invalid_transition_exit_code() {
    let (_, engine) = scripted_engine(&["t3", "t3"]);
    let mut out = Vec::new();

    let err = commands::execute_transition_command(
        engine.as_ref(),
        "",
        "t1,t2",
        "{}",
        None,
        &mut out,
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<StatesmithError>() {
        Some(StatesmithError::Reasoning(ReasoningError::InvalidTransition { response })) => {
            assert_eq!(response, "t3");
        }
        other => panic!("Expected InvalidTransition, got {other:?}"),
    }
    assert_eq!(report_error(&err, "transition"), ExitCode::INVALID_TRANSITION);
}

#[test]
fn test_evaluate_compiling_machine() {
    let mut out = Vec::new();

    commands::execute_evaluate_command(EngineVariant::Strict, VALID_MACHINE, "q", &mut out)
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(json["rating"], 1);
    assert!(json.get("error").is_none());
}

#[test]
fn test_evaluate_rejected_machine_still_prints_outcome() {
    let broken = r#"[{"id":"fetchData","transitions":["nowhere"]}]"#;
    let mut out = Vec::new();

    let err = commands::execute_evaluate_command(EngineVariant::Lenient, broken, "q", &mut out)
        .unwrap_err();

    let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(json["rating"], 0);
    assert_eq!(json["correct"], false);
    assert_eq!(report_error(&err, "evaluate"), ExitCode::SYNTHESIS_FAILURE);
}

#[test]
fn test_evaluate_malformed_json_is_invalid_input() {
    let mut out = Vec::new();

    let err = commands::execute_evaluate_command(EngineVariant::Lenient, "[{", "q", &mut out)
        .unwrap_err();

    assert!(out.is_empty());
    assert_eq!(report_error(&err, "evaluate"), ExitCode::CLI_ARGS);
}

#[test]
fn test_config_table_lists_sources() {
    let mut out = Vec::new();

    commands::execute_config_command(&Config::minimal_for_testing(), false, &mut out).unwrap();

    let text = output(out);
    let variant_line = text
        .lines()
        .find(|line| line.starts_with("variant"))
        .unwrap();
    assert!(variant_line.contains("= lenient"));
    assert!(variant_line.ends_with("(default)"));
}

#[test]
fn test_config_json() {
    let mut out = Vec::new();

    commands::execute_config_command(&Config::minimal_for_testing(), true, &mut out).unwrap();

    let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(json["variant"]["value"], "lenient");
    assert_eq!(json["variant"]["source"], "default");
    assert_eq!(json["timeout_secs"]["value"], "120");
}

#[test]
fn test_unexpected_errors_are_internal() {
    let err = anyhow::anyhow!("something else");
    assert_eq!(report_error(&err, "solve"), ExitCode::INTERNAL);
}
