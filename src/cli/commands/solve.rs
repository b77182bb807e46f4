//! `statesmith solve`

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use statesmith_engine::ReasoningEngine;

use super::common::bounded;

/// Answer a query and write the raw answer.
pub async fn execute_solve_command(
    engine: &dyn ReasoningEngine,
    query: &str,
    deadline: Option<Duration>,
    out: &mut dyn Write,
) -> Result<()> {
    let answer = bounded(deadline, engine.solve(query)).await?;
    writeln!(out, "{answer}")?;
    Ok(())
}
