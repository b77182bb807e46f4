//! Lenient variant: reference repair, no verification inside `program`.

use std::sync::Arc;

use async_trait::async_trait;
use statesmith_config::{Config, EngineVariant};
use statesmith_llm::LlmBackend;
use statesmith_machine::{Catalog, StateDefinition};
use statesmith_utils::error::ReasoningError;

use crate::facade::{EngineCore, ReasoningEngine, traced};
use crate::synthesizer::{ReferencePolicy, Synthesizer};
use crate::verifier::{EvaluationInput, EvaluationOutcome};

/// Rating reported for a machine that compiles.
pub const LENIENT_SUCCESS_RATING: u8 = 5;

#[derive(Debug, Clone)]
pub struct LenientEngine {
    core: EngineCore,
    references: ReferencePolicy,
}

impl LenientEngine {
    /// One unchecked reference repair.
    #[must_use]
    pub fn new(core: EngineCore) -> Self {
        Self {
            core,
            references: ReferencePolicy::RepairUnchecked,
        }
    }

    /// `[synthesis] revalidate_references` switches to checked repairs,
    /// bounded by `reference_repairs`.
    #[must_use]
    pub fn from_config(config: &Config, backend: Arc<dyn LlmBackend>) -> Self {
        let references = if config.revalidate_references() {
            ReferencePolicy::RepairRevalidated {
                attempts: config.reference_repairs(),
            }
        } else {
            ReferencePolicy::RepairUnchecked
        };
        Self::new(EngineCore::from_config(config, backend)).with_reference_policy(references)
    }

    #[must_use]
    pub fn with_reference_policy(mut self, references: ReferencePolicy) -> Self {
        self.references = references;
        self
    }

    #[must_use]
    pub fn reference_policy(&self) -> ReferencePolicy {
        self.references
    }

    #[must_use]
    pub fn core(&self) -> &EngineCore {
        &self.core
    }
}

#[async_trait]
impl ReasoningEngine for LenientEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Lenient
    }

    async fn solve(&self, query: &str) -> Result<String, ReasoningError> {
        self.core.solve(self.variant(), query).await
    }

    async fn program(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Vec<StateDefinition>, ReasoningError> {
        traced("program", self.variant(), |request_id| async move {
            let synthesis =
                Synthesizer::new(self.core.generator(), self.core.prompts(), self.references)
                    .synthesize(&request_id, query, catalog)
                    .await?;
            Ok((synthesis.states, synthesis.oracle_calls))
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
