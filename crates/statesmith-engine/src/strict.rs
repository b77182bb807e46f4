//! Strict variant: no reference repair, and `program` only returns states
//! that pass structural verification.

use std::sync::Arc;

use async_trait::async_trait;
use statesmith_config::{Config, EngineVariant};
use statesmith_llm::LlmBackend;
use statesmith_machine::{Catalog, MachineError, StateDefinition};
use statesmith_utils::error::ReasoningError;
use tracing::warn;

use crate::facade::{EngineCore, ReasoningEngine, traced};
use crate::synthesizer::{ReferencePolicy, Synthesizer};
use crate::verifier::{EvaluationInput, EvaluationOutcome};

/// Rating reported for a machine that compiles.
pub const STRICT_SUCCESS_RATING: u8 = 1;

#[derive(Debug, Clone)]
pub struct StrictEngine {
    core: EngineCore,
    program_attempts: u32,
}

impl StrictEngine {
    /// A single `program` attempt.
    #[must_use]
    pub fn new(core: EngineCore) -> Self {
        Self {
            core,
            program_attempts: 1,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, backend: Arc<dyn LlmBackend>) -> Self {
        Self::new(EngineCore::from_config(config, backend))
            .with_program_attempts(config.program_attempts())
    }

    /// Whole runs of `program` allowed when verification rejects the result.
    #[must_use]
    pub fn with_program_attempts(mut self, attempts: u32) -> Self {
        self.program_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn program_attempts(&self) -> u32 {
        self.program_attempts
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }
}

#[async_trait]
impl ReasoningEngine for StrictEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Strict
    }

    async fn solve(&self, query: &str) -> Result<String, ReasoningError> {
        self.core.solve(self.variant(), query).await
    }

    /// Runs the synthesis loop, then verifies the result. A rejected machine
    /// starts a fresh run while attempts remain; the last rejection is
    /// surfaced as `Structural`.
    async fn program(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Vec<StateDefinition>, ReasoningError> {
        traced("program", self.variant(), |request_id| async move {
            let synthesizer = Synthesizer::new(
                self.core.generator(),
                self.core.prompts(),
                ReferencePolicy::Reject,
            );
            let verifier = self.core.verifier(self.variant());

            let mut oracle_calls = 0;
            let mut last_error = None;
            for attempt in 1..=self.program_attempts {
                let synthesis = synthesizer.synthesize(&request_id, query, catalog).await?;
                oracle_calls += synthesis.oracle_calls;

                let input = EvaluationInput::new(query, synthesis.states)
                    .with_instructions(synthesis.instructions);
                let outcome = verifier.evaluate(&input);
                if !outcome.is_failure() {
                    return Ok((input.states, oracle_calls));
                }

                warn!(
                    attempt,
                    attempts = self.program_attempts,
                    "Synthesized machine failed structural verification"
                );
                last_error = outcome.error;
            }

            let error = last_error.unwrap_or_else(|| {
                MachineError::Instantiation("verification rejected the machine".to_string())
            });
            Err(ReasoningError::Structural(error))
        })
        .await
    }

    fn evaluate(&self, input: &EvaluationInput) -> EvaluationOutcome {
        self.core.evaluate(self.variant(), input)
    }

    async fn transition(
        &self,
        task_list: &str,
        current_state: &str,
        payload: &str,
    ) -> Result<String, ReasoningError> {
        self.core
            .transition(self.variant(), task_list, current_state, payload)
            .await
    }
}
