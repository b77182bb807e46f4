//! `statesmith program`

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use statesmith_engine::{EvaluationInput, ReasoningEngine};
use statesmith_machine::Catalog;

use super::common::bounded;

/// Synthesize a state list and write it as pretty JSON.
///
/// With `evaluate` the output is `{"states": [...], "evaluation": {...}}`.
pub async fn execute_program_command(
    engine: &dyn ReasoningEngine,
    query: &str,
    catalog: &Catalog,
    evaluate: bool,
    deadline: Option<Duration>,
    out: &mut dyn Write,
) -> Result<()> {
    let states = bounded(deadline, engine.program(query, catalog)).await?;

    let document = if evaluate {
        let outcome = engine.evaluate(&EvaluationInput::new(query, states.clone()));
        json!({ "states": states, "evaluation": outcome })
    } else {
        serde_json::to_value(&states).context("Failed to serialize state list")?
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
    Ok(())
}
