//! Structural smoke test for a state list.
//!
//! The state list is compiled and instantiated with a neutral context. No
//! event is delivered, so nothing runs to a terminal state.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use statesmith_config::EngineVariant;
use statesmith_machine::{
    MachineContext, MachineEngine, MachineError, StateDefinition, TaskRegistry,
};
use tracing::{debug, warn};

use crate::{LENIENT_SUCCESS_RATING, STRICT_SUCCESS_RATING};

/// What the evaluator looks at.
#[derive(Debug, Clone)]
pub struct EvaluationInput {
    pub query: String,
    pub states: Vec<StateDefinition>,
    /// The programmer instructions the states came from, when known.
    pub instructions: Option<String>,
    /// Real capability implementations supplied by the caller.
    pub tools: Option<TaskRegistry>,
}

impl EvaluationInput {
    #[must_use]
    pub fn new(query: impl Into<String>, states: Vec<StateDefinition>) -> Self {
        Self {
            query: query.into(),
            states,
            instructions: None,
            tools: None,
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: TaskRegistry) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Coarse verdict: rating 0 means the machine could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationOutcome {
    pub rating: u8,
    pub correct: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<MachineError>,
}

impl EvaluationOutcome {
    #[must_use]
    pub fn passed(rating: u8) -> Self {
        Self {
            rating,
            correct: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: MachineError) -> Self {
        Self {
            rating: 0,
            correct: false,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.rating == 0
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<MachineError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Where the task registry used for compilation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    /// The caller's tools when supplied, placeholders otherwise.
    CallerOrPlaceholders,
    /// A placeholder for every state id, ignoring caller tools.
    Placeholders,
}

/// Builds a machine through the engine collaborator and rates the attempt.
#[derive(Clone)]
pub struct Verifier {
    engine: Arc<dyn MachineEngine>,
    success_rating: u8,
    tasks: TaskSource,
}

impl Verifier {
    #[must_use]
    pub fn new(engine: Arc<dyn MachineEngine>, success_rating: u8, tasks: TaskSource) -> Self {
        Self {
            engine,
            success_rating,
            tasks,
        }
    }

    /// The rating and task source a variant evaluates with.
    #[must_use]
    pub fn for_variant(variant: EngineVariant, engine: Arc<dyn MachineEngine>) -> Self {
        match variant {
            EngineVariant::Lenient => Self::new(
                engine,
                LENIENT_SUCCESS_RATING,
                TaskSource::CallerOrPlaceholders,
            ),
            EngineVariant::Strict => {
                Self::new(engine, STRICT_SUCCESS_RATING, TaskSource::Placeholders)
            }
        }
    }

    /// Never fails: a rejected build is reported as rating 0 with its error.
    #[must_use]
    pub fn evaluate(&self, input: &EvaluationInput) -> EvaluationOutcome {
        let placeholders;
        let registry = match (self.tasks, input.tools.as_ref()) {
            (TaskSource::CallerOrPlaceholders, Some(tools)) => tools,
            _ => {
                placeholders = TaskRegistry::placeholders_for(&input.states);
                &placeholders
            }
        };

        match self
            .engine
            .try_build(&input.states, registry, MachineContext::neutral())
        {
            Ok(()) => {
                debug!(
                    states = input.states.len(),
                    rating = self.success_rating,
                    "Machine compiled and instantiated"
                );
                EvaluationOutcome::passed(self.success_rating)
            }
            Err(e) => {
                warn!(error = %e, "Structural verification failed");
                EvaluationOutcome::failed(e)
            }
        }
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("success_rating", &self.success_rating)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statesmith_machine::{Interpreter, PlaceholderTask};

    fn states() -> Vec<StateDefinition> {
        vec![
            StateDefinition::normal("fetchData", ["sendEmail"]),
            StateDefinition::normal("sendEmail", ["success", "failure"]),
            StateDefinition::final_state("success"),
            StateDefinition::final_state("failure"),
        ]
    }

    #[derive(Debug)]
    struct RecordingEngine {
        seen: std::sync::Mutex<Vec<MachineContext>>,
    }

    impl MachineEngine for RecordingEngine {
        fn try_build(
            &self,
            _states: &[StateDefinition],
            _tasks: &TaskRegistry,
            context: MachineContext,
        ) -> Result<(), MachineError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(context);
            }
            Ok(())
        }
    }

    #[test]
    fn test_compiling_machine_gets_success_rating() {
        let verifier = Verifier::new(Arc::new(Interpreter), 5, TaskSource::CallerOrPlaceholders);

        let outcome = verifier.evaluate(&EvaluationInput::new("q", states()));

        assert_eq!(outcome, EvaluationOutcome::passed(5));
    }

    #[test]
    fn test_rejected_machine_gets_rating_zero() {
        let verifier = Verifier::new(Arc::new(Interpreter), 1, TaskSource::Placeholders);
        let broken = vec![StateDefinition::normal("fetchData", ["nowhere"])];

        let outcome = verifier.evaluate(&EvaluationInput::new("q", broken));

        assert!(outcome.is_failure());
        assert!(!outcome.correct);
        match outcome.error {
            Some(MachineError::UnknownTarget { state, target }) => {
                assert_eq!(state, "fetchData");
                assert_eq!(target, "nowhere");
            }
            other => panic!("Expected UnknownTarget, got {other:?}"),
        }
    }

    #[test]
    fn test_caller_tools_are_used_when_allowed() {
        let mut tools = TaskRegistry::new();
        tools.register(Arc::new(PlaceholderTask::new("fetchData")));
        let input = EvaluationInput::new("q", states()).with_tools(tools);

        let lenient = Verifier::new(Arc::new(Interpreter), 5, TaskSource::CallerOrPlaceholders);
        match lenient.evaluate(&input).error {
            Some(MachineError::MissingTask { id }) => assert_eq!(id, "sendEmail"),
            other => panic!("Expected MissingTask, got {other:?}"),
        }

        let strict = Verifier::new(Arc::new(Interpreter), 1, TaskSource::Placeholders);
        assert_eq!(strict.evaluate(&input), EvaluationOutcome::passed(1));
    }

    #[test]
    fn test_context_is_neutral_and_fresh() {
        let engine = Arc::new(RecordingEngine {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let verifier = Verifier::new(engine.clone(), 1, TaskSource::Placeholders);

        verifier.evaluate(&EvaluationInput::new("q", states()));
        verifier.evaluate(&EvaluationInput::new("q", states()));

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|c| c.status == 0 && c.stack.is_empty()));
        assert_ne!(seen[0].request_id, seen[1].request_id);
    }

    #[test]
    fn test_outcome_serializes_error_as_text() {
        let json = serde_json::to_value(EvaluationOutcome::failed(MachineError::Empty)).unwrap();
        assert_eq!(json["rating"], 0);
        assert_eq!(json["error"], "machine has no states");

        let json = serde_json::to_value(EvaluationOutcome::passed(5)).unwrap();
        assert!(json.get("error").is_none());
    }
}
