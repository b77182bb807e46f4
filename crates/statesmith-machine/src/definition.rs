use serde::{Deserialize, Serialize};

/// Id of the terminal state reached when the task succeeds.
pub const SUCCESS_STATE_ID: &str = "success";

/// Id of the terminal state reached when the task fails.
pub const FAILURE_STATE_ID: &str = "failure";

/// Declared `type` of a state as written by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    #[default]
    #[serde(alias = "atomic")]
    Normal,
    Parallel,
    #[serde(alias = "terminal")]
    Final,
}

/// Semantic kind of a state, derived from its type and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Normal,
    Parallel,
    TerminalSuccess,
    TerminalFailure,
}

/// One transition out of a state.
///
/// Written either as a bare target id (`"success"`) or as an event-labelled
/// object (`{"on": "DONE", "target": "success"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transition {
    Target(String),
    Event { on: String, target: String },
}

impl Transition {
    /// Identifier the transition is chosen by: the event name when present,
    /// otherwise the target.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Target(target) => target,
            Self::Event { on, .. } => on,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Target(target) | Self::Event { target, .. } => target,
        }
    }
}

impl From<&str> for Transition {
    fn from(target: &str) -> Self {
        Self::Target(target.to_string())
    }
}

/// One node of a synthesized machine.
///
/// Unknown fields in model output are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    pub id: String,
    #[serde(rename = "type", default)]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    /// Child states; only meaningful for parallel states.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateDefinition>,
}

impl StateDefinition {
    #[must_use]
    pub fn normal<I, T>(id: impl Into<String>, transitions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Transition>,
    {
        Self {
            id: id.into(),
            state_type: StateType::Normal,
            transitions: transitions.into_iter().map(Into::into).collect(),
            states: Vec::new(),
        }
    }

    #[must_use]
    pub fn parallel(id: impl Into<String>, states: Vec<StateDefinition>) -> Self {
        Self {
            id: id.into(),
            state_type: StateType::Parallel,
            transitions: Vec::new(),
            states,
        }
    }

    #[must_use]
    pub fn final_state(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state_type: StateType::Final,
            transitions: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Whether the id is one of the two terminal sentinels.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id == SUCCESS_STATE_ID || self.id == FAILURE_STATE_ID
    }

    /// Final states named `failure` are terminal failures; every other final
    /// state counts as a terminal success.
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self.state_type {
            StateType::Normal => StateKind::Normal,
            StateType::Parallel => StateKind::Parallel,
            StateType::Final if self.id == FAILURE_STATE_ID => StateKind::TerminalFailure,
            StateType::Final => StateKind::TerminalSuccess,
        }
    }

    /// Transition identifiers in declaration order.
    pub fn transition_ids(&self) -> impl Iterator<Item = &str> {
        self.transitions.iter().map(Transition::id)
    }
}

/// Parse model output into a state list.
///
/// This is the syntax boundary of the synthesis loop: anything that is not a
/// JSON array of state objects is rejected with the parser's message.
///
/// # Errors
///
/// Returns the `serde_json` error when `json` is not a valid state list.
pub fn parse_states(json: &str) -> Result<Vec<StateDefinition>, serde_json::Error> {
    serde_json::from_str(json)
}
