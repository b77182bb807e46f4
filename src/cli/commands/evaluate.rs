//! `statesmith evaluate`
//!
//! Runs structural verification only, so no oracle backend is needed.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use statesmith_engine::{EngineVariant, EvaluationInput, Verifier};
use statesmith_machine::{Interpreter, parse_states};
use statesmith_utils::error::{ReasoningError, StatesmithError};

/// Evaluate a JSON state list and write the outcome as JSON.
///
/// The outcome is written even when the machine is rejected; the rejection
/// is then returned as a structural error.
pub fn execute_evaluate_command(
    variant: EngineVariant,
    states_json: &str,
    query: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let states = parse_states(states_json).map_err(|e| StatesmithError::InvalidInput {
        what: "state list".to_string(),
        reason: e.to_string(),
    })?;

    let verifier = Verifier::for_variant(variant, Arc::new(Interpreter));
    let outcome = verifier.evaluate(&EvaluationInput::new(query, states));

    writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;

    match outcome.error {
        Some(error) => Err(StatesmithError::Reasoning(ReasoningError::Structural(error)).into()),
        None => Ok(()),
    }
}
