//! Pick the next transition of a running machine.

use statesmith_prompt_template::{PromptRole, PromptSet};
use statesmith_utils::error::ReasoningError;
use tracing::{debug, warn};

use crate::generator::{Conversation, Generator};
use crate::repair;

/// A transition id that occurs in the current state's description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionChoice {
    pub id: String,
    pub oracle_calls: u32,
}

/// Asks the oracle for a transition, with one repair.
pub struct TransitionSelector<'a> {
    generator: &'a Generator,
    prompts: &'a dyn PromptSet,
}

impl<'a> TransitionSelector<'a> {
    #[must_use]
    pub fn new(generator: &'a Generator, prompts: &'a dyn PromptSet) -> Self {
        Self { generator, prompts }
    }

    /// Choose a transition for `payload` out of `current_state`.
    ///
    /// A choice is valid when, after trimming surrounding whitespace, it is
    /// non-empty and occurs verbatim in `current_state`.
    ///
    /// # Errors
    ///
    /// - `Transport` if an oracle call fails
    /// - `InvalidTransition` if the repaired answer is still not valid
    pub async fn select(
        &self,
        request_id: &str,
        task_list: &str,
        current_state: &str,
        payload: &str,
    ) -> Result<TransitionChoice, ReasoningError> {
        let prompt = self.prompts.transition(task_list, current_state, payload);
        let mut conversation = Conversation::new(PromptRole::Transition, request_id, &prompt);

        let answer = self.generator.complete(&mut conversation).await?;
        debug!(answer = %answer, "Transition oracle answered");

        if let Some(id) = valid_choice(&answer, current_state) {
            return Ok(TransitionChoice {
                id,
                oracle_calls: conversation.calls(),
            });
        }

        warn!(answer = %answer, "Answer is not one of the state's transitions, requesting repair");
        conversation.push_repair(&answer, repair::transition_repair(&answer));
        let repaired = self.generator.complete(&mut conversation).await?;

        match valid_choice(&repaired, current_state) {
            Some(id) => Ok(TransitionChoice {
                id,
                oracle_calls: conversation.calls(),
            }),
            None => Err(ReasoningError::InvalidTransition { response: repaired }),
        }
    }
}

fn valid_choice(answer: &str, current_state: &str) -> Option<String> {
    let choice = answer.trim();
    (!choice.is_empty() && current_state.contains(choice)).then(|| choice.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use statesmith_llm::ScriptedBackend;
    use statesmith_prompt_template::DefaultPrompts;
    use std::sync::Arc;
    use std::time::Duration;

    async fn select(
        responses: &[&str],
        current_state: &str,
    ) -> (Arc<ScriptedBackend>, Result<TransitionChoice, ReasoningError>) {
        let backend = Arc::new(ScriptedBackend::new(responses.iter().copied()));
        let generator = Generator::new(backend.clone(), Duration::from_secs(5));
        let prompts = DefaultPrompts::default();
        let result = TransitionSelector::new(&generator, &prompts)
            .select("req", "tasks", current_state, r#"{"ok":true}"#)
            .await;
        (backend, result)
    }

    #[tokio::test]
    async fn test_valid_choice_first_time() {
        let (backend, result) = select(&["t1"], "t1,t2").await;

        assert_eq!(
            result.unwrap(),
            TransitionChoice {
                id: "t1".to_string(),
                oracle_calls: 1
            }
        );
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_choice_repaired() {
        let (backend, result) = select(&["t3", "t2"], "t1,t2").await;

        assert_eq!(result.unwrap().id, "t2");
        assert_eq!(backend.call_count(), 2);
        let repair = &backend.messages_of(1)[3].content;
        assert!(repair.contains("t3"));
        assert!(repair.contains("does not include a valid transition ID"));
    }

    #[tokio::test]
    async fn test_invalid_after_repair_fails() {
        let (backend, result) = select(&["t3", "t3", "t1"], "t1,t2").await;

        match result {
            Err(ReasoningError::InvalidTransition { response }) => assert_eq!(response, "t3"),
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_whitespace_is_trimmed_and_empty_rejected() {
        let (_, result) = select(&["  t2\n"], "t1,t2").await;
        assert_eq!(result.unwrap().id, "t2");

        let (_, result) = select(&["", "   "], "t1,t2").await;
        assert!(matches!(
            result,
            Err(ReasoningError::InvalidTransition { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_accepted_choice_is_contained(answer in ".{0,12}", state in "[a-z0-9,]{0,24}") {
            if let Some(choice) = valid_choice(&answer, &state) {
                prop_assert!(state.contains(choice.as_str()));
                prop_assert!(!choice.is_empty());
            }
        }
    }
}
