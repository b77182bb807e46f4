//! `statesmith transition`

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use statesmith_engine::ReasoningEngine;

use super::common::bounded;

/// Choose a transition and write its id.
pub async fn execute_transition_command(
    engine: &dyn ReasoningEngine,
    task_list: &str,
    current_state: &str,
    payload: &str,
    deadline: Option<Duration>,
    out: &mut dyn Write,
) -> Result<()> {
    let choice = bounded(
        deadline,
        engine.transition(task_list, current_state, payload),
    )
    .await?;
    writeln!(out, "{choice}")?;
    Ok(())
}
