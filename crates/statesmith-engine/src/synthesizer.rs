//! The generate, validate and repair loop behind `program`.
//!
//! One programmer conversation per run. The answer is extracted and parsed;
//! a parse failure earns one syntax repair, and ids missing from the catalog
//! are handled according to the [`ReferencePolicy`]. Every repair is bounded,
//! so a run makes at most `2 + reference repairs` oracle calls.

use statesmith_extraction::extract_json;
use statesmith_machine::{Catalog, StateDefinition, parse_states, unknown_state_ids};
use statesmith_prompt_template::{PromptRole, PromptSet};
use statesmith_utils::error::ReasoningError;
use tracing::{debug, warn};

use crate::generator::{Conversation, Generator};
use crate::repair;

/// What to do when the parsed states reference ids outside the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Fail with [`ReasoningError::Referential`].
    Reject,
    /// One repair request; its answer is returned without another check.
    RepairUnchecked,
    /// Repair and re-check up to `attempts` times, then fail.
    RepairRevalidated { attempts: u32 },
}

/// Result of one successful run.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub states: Vec<StateDefinition>,
    /// The programmer user prompt the states were generated from.
    pub instructions: String,
    pub oracle_calls: u32,
}

/// Turns a query and a catalog into a parsed state list.
pub struct Synthesizer<'a> {
    generator: &'a Generator,
    prompts: &'a dyn PromptSet,
    policy: ReferencePolicy,
}

impl<'a> Synthesizer<'a> {
    #[must_use]
    pub fn new(
        generator: &'a Generator,
        prompts: &'a dyn PromptSet,
        policy: ReferencePolicy,
    ) -> Self {
        Self {
            generator,
            prompts,
            policy,
        }
    }

    /// Run the loop once.
    ///
    /// # Errors
    ///
    /// - `Transport` as soon as any oracle call fails
    /// - `Syntax` when an answer still does not parse after the syntax repair
    /// - `Referential` when the policy rejects, or revalidation runs out
    pub async fn synthesize(
        &self,
        request_id: &str,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Synthesis, ReasoningError> {
        let prompt = self.prompts.programmer(query, catalog.as_str());
        let mut run = Run {
            generator: self.generator,
            conversation: Conversation::new(PromptRole::Programmer, request_id, &prompt),
            last_answer: String::new(),
            syntax_repair_used: false,
        };

        let mut states = run.generate_states().await?;

        let mut unknown = unknown_state_ids(&states, catalog);
        if !unknown.is_empty() {
            states = match self.policy {
                ReferencePolicy::Reject => {
                    warn!(
                        ids = %unknown.join(","),
                        "Unknown state ids, no reference repair allowed"
                    );
                    return Err(ReasoningError::Referential { ids: unknown });
                }
                ReferencePolicy::RepairUnchecked => {
                    let repaired = run.repair_references(&unknown, catalog).await?;
                    let remaining = unknown_state_ids(&repaired, catalog);
                    if !remaining.is_empty() {
                        warn!(
                            ids = %remaining.join(","),
                            "Reference repair left unknown ids; accepting unchecked result"
                        );
                    }
                    repaired
                }
                ReferencePolicy::RepairRevalidated { attempts } => {
                    let mut repaired = states;
                    for attempt in 1..=attempts {
                        repaired = run.repair_references(&unknown, catalog).await?;
                        unknown = unknown_state_ids(&repaired, catalog);
                        if unknown.is_empty() {
                            break;
                        }
                        debug!(
                            attempt,
                            ids = %unknown.join(","),
                            "Repaired states still reference unknown ids"
                        );
                    }
                    if !unknown.is_empty() {
                        return Err(ReasoningError::Referential { ids: unknown });
                    }
                    repaired
                }
            };
        }

        debug!(
            states = states.len(),
            oracle_calls = run.conversation.calls(),
            "Programmer produced state list"
        );

        Ok(Synthesis {
            states,
            instructions: prompt.user,
            oracle_calls: run.conversation.calls(),
        })
    }
}

/// Mutable state of one synthesis run.
struct Run<'a> {
    generator: &'a Generator,
    conversation: Conversation,
    last_answer: String,
    syntax_repair_used: bool,
}

impl Run<'_> {
    async fn ask(&mut self) -> Result<String, ReasoningError> {
        self.last_answer = self.generator.complete(&mut self.conversation).await?;
        Ok(extract_json(&self.last_answer).to_string())
    }

    /// Ask for an answer and parse it, spending the syntax repair if needed.
    async fn generate_states(&mut self) -> Result<Vec<StateDefinition>, ReasoningError> {
        let unwrapped = self.ask().await?;
        debug!(response = %unwrapped, "Programmer generated unchecked solution");

        let parse_error = match parse_states(&unwrapped) {
            Ok(states) => return Ok(states),
            Err(e) => e.to_string(),
        };

        if self.syntax_repair_used {
            return Err(self.syntax_error(parse_error, unwrapped));
        }
        self.syntax_repair_used = true;

        warn!(error = %parse_error, "Programmer output is not valid JSON, requesting syntax repair");
        let instruction = repair::syntax_repair(&unwrapped, &parse_error);
        self.conversation.push_repair(&self.last_answer, instruction);

        let unwrapped = self.ask().await?;
        parse_states(&unwrapped).map_err(|e| self.syntax_error(e.to_string(), unwrapped))
    }

    async fn repair_references(
        &mut self,
        unknown: &[String],
        catalog: &Catalog,
    ) -> Result<Vec<StateDefinition>, ReasoningError> {
        warn!(ids = %unknown.join(","), "Unknown state ids, requesting reference repair");
        let instruction = repair::reference_repair(unknown, catalog);
        self.conversation.push_repair(&self.last_answer, instruction);
        self.generate_states().await
    }

    fn syntax_error(&self, message: String, response: String) -> ReasoningError {
        ReasoningError::Syntax {
            message,
            response,
            attempts: self.conversation.calls(),
        }
    }
}
