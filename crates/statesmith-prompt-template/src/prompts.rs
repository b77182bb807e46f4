use serde::{Deserialize, Serialize};

use crate::PromptTemplate;

/// Role a prompt is built for. Each role may run on its own model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    Solver,
    Programmer,
    Evaluator,
    Transition,
}

impl PromptRole {
    pub const ALL: [PromptRole; 4] = [
        PromptRole::Solver,
        PromptRole::Programmer,
        PromptRole::Evaluator,
        PromptRole::Transition,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Solver => "solver",
            Self::Programmer => "programmer",
            Self::Evaluator => "evaluator",
            Self::Transition => "transition",
        }
    }
}

impl std::fmt::Display for PromptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A system prompt and the user prompt that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Builds the prompt pair for each role.
///
/// Implementations must be pure: the same arguments always yield the same
/// prompts, and no oracle call happens here.
pub trait PromptSet: Send + Sync {
    fn solver(&self, query: &str) -> PromptPair;

    fn programmer(&self, query: &str, catalog: &str) -> PromptPair;

    fn evaluator(&self, query: &str, states_json: &str) -> PromptPair;

    fn transition(&self, task_list: &str, current_state: &str, payload: &str) -> PromptPair;
}

const SOLVER_SYSTEM: &str = "You are a careful problem solver. Work through the task step by step \
and answer with the solution only.";

const PROGRAMMER_SYSTEM: &str = r#"You translate a task into a finite state machine.
Respond with a JSON array of state objects and nothing else. Each state has:
- "id": the name of a function from the function catalog, or "success" / "failure"
- "type": "normal", "parallel" or "final" (defaults to "normal")
- "transitions": an array of transitions; each is either a target state id or
  an object {"on": "<EVENT>", "target": "<state id>"}
- "states": child states, only for "parallel" states
The first state is the initial state. Always include final states with ids
"success" and "failure". Do not invent function names."#;

const EVALUATOR_SYSTEM: &str = r#"You review a finite state machine written to solve a task.
Respond with JSON {"rating": <0-5>, "correct": <true|false>} and nothing else."#;

const TRANSITION_SYSTEM: &str = "You drive a running state machine. Given the current state and \
the event payload, pick the single transition to take. Respond with the transition id only, \
exactly as written in the state's transitions array. Do not be chatty.";

/// Built-in prompts, formatted according to a [`PromptTemplate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts {
    template: PromptTemplate,
}

impl DefaultPrompts {
    #[must_use]
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    #[must_use]
    pub fn template(&self) -> PromptTemplate {
        self.template
    }
}

impl PromptSet for DefaultPrompts {
    fn solver(&self, query: &str) -> PromptPair {
        PromptPair::new(SOLVER_SYSTEM, self.template.section("task", query))
    }

    fn programmer(&self, query: &str, catalog: &str) -> PromptPair {
        let user = format!(
            "{}\n\n{}\n\nOnly respond with the JSON array. Your response will be sent to a JSON parser.",
            self.template.section("task", query),
            self.template.section("function catalog", catalog),
        );
        PromptPair::new(PROGRAMMER_SYSTEM, user)
    }

    fn evaluator(&self, query: &str, states_json: &str) -> PromptPair {
        let user = format!(
            "{}\n\n{}",
            self.template.section("task", query),
            self.template.section("state machine", states_json),
        );
        PromptPair::new(EVALUATOR_SYSTEM, user)
    }

    fn transition(&self, task_list: &str, current_state: &str, payload: &str) -> PromptPair {
        let user = format!(
            "{}\n\n{}\n\n{}",
            self.template.section("task list", task_list),
            self.template.section("current state", current_state),
            self.template.section("event payload", payload),
        );
        PromptPair::new(TRANSITION_SYSTEM, user)
    }
}
