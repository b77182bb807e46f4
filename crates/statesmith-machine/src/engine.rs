//! Compile and instantiate a state list.
//!
//! Structural verification only needs to know whether construction and
//! instantiation succeed, so [`MachineEngine`] is that single capability. The
//! built-in [`Interpreter`] compiles a [`MachineDefinition`], seeds it with a
//! context and instantiates it without delivering any event.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use statesmith_utils::error::MachineError;
use tracing::debug;

use crate::definition::{FAILURE_STATE_ID, SUCCESS_STATE_ID, StateDefinition, StateKind};
use crate::task::{MachineContext, Task, TaskRegistry};

/// Execution-engine collaborator used for structural verification.
pub trait MachineEngine: Send + Sync {
    /// Build and instantiate a machine, discarding the instance.
    ///
    /// # Errors
    ///
    /// Returns the reason construction or instantiation was rejected.
    fn try_build(
        &self,
        states: &[StateDefinition],
        tasks: &TaskRegistry,
        context: MachineContext,
    ) -> Result<(), MachineError>;
}

/// The built-in engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl MachineEngine for Interpreter {
    fn try_build(
        &self,
        states: &[StateDefinition],
        tasks: &TaskRegistry,
        context: MachineContext,
    ) -> Result<(), MachineError> {
        let instance = MachineDefinition::compile(states, tasks)?
            .with_context(context)
            .interpret()?;
        debug!(initial = %instance.current_state(), "machine instantiated");
        Ok(())
    }
}

/// A compiled, context-free machine.
#[derive(Debug, Clone)]
pub struct MachineDefinition {
    states: BTreeMap<String, StateDefinition>,
    initial: String,
    tasks: BTreeMap<String, Arc<dyn Task>>,
}

impl MachineDefinition {
    /// Compile a state list against a task registry.
    ///
    /// The first state is the initial state. Undeclared `success` and
    /// `failure` targets resolve to implicit final states.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, duplicate ids, final states with transitions,
    /// parallel states without children, unknown transition targets, or a
    /// normal state with no registered task.
    pub fn compile(states: &[StateDefinition], tasks: &TaskRegistry) -> Result<Self, MachineError> {
        let first = states.first().ok_or(MachineError::Empty)?;

        let mut index = BTreeMap::new();
        flatten(states, &mut index)?;

        let declared: HashSet<&str> = index.keys().map(String::as_str).collect();
        let mut bound = BTreeMap::new();

        for state in index.values() {
            match state.kind() {
                StateKind::TerminalSuccess | StateKind::TerminalFailure => {
                    if !state.transitions.is_empty() {
                        return Err(MachineError::FinalWithTransitions {
                            id: state.id.clone(),
                        });
                    }
                }
                StateKind::Parallel => {
                    if state.states.is_empty() {
                        return Err(MachineError::EmptyParallel {
                            id: state.id.clone(),
                        });
                    }
                }
                StateKind::Normal => {
                    if !state.is_sentinel() {
                        let task = tasks.get(&state.id).ok_or_else(|| MachineError::MissingTask {
                            id: state.id.clone(),
                        })?;
                        bound.insert(state.id.clone(), Arc::clone(task));
                    }
                }
            }

            for transition in &state.transitions {
                let target = transition.target();
                let implicit = target == SUCCESS_STATE_ID || target == FAILURE_STATE_ID;
                if !implicit && !declared.contains(target) {
                    return Err(MachineError::UnknownTarget {
                        state: state.id.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            initial: first.id.clone(),
            states: index,
            tasks: bound,
        })
    }

    #[must_use]
    pub fn initial(&self) -> &str {
        &self.initial
    }

    #[must_use]
    pub fn state(&self, id: &str) -> Option<&StateDefinition> {
        self.states.get(id)
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    /// Seed the definition with its starting context.
    #[must_use]
    pub fn with_context(self, context: MachineContext) -> Machine {
        Machine {
            definition: self,
            context,
        }
    }
}

fn flatten(
    states: &[StateDefinition],
    index: &mut BTreeMap<String, StateDefinition>,
) -> Result<(), MachineError> {
    for state in states {
        if index.insert(state.id.clone(), state.clone()).is_some() {
            return Err(MachineError::DuplicateState {
                id: state.id.clone(),
            });
        }
        flatten(&state.states, index)?;
    }
    Ok(())
}

/// A definition seeded with context, ready to instantiate.
#[derive(Debug, Clone)]
pub struct Machine {
    definition: MachineDefinition,
    context: MachineContext,
}

impl Machine {
    /// Create a running instance positioned at the initial state.
    ///
    /// # Errors
    ///
    /// Fails when the context is not neutral or the initial state is the
    /// failure terminal.
    pub fn interpret(self) -> Result<MachineInstance, MachineError> {
        if !self.context.stack.is_empty() {
            return Err(MachineError::Instantiation(
                "context call stack must start empty".to_string(),
            ));
        }
        let initial = self.definition.initial.clone();
        if let Some(state) = self.definition.state(&initial)
            && state.kind() == StateKind::TerminalFailure
        {
            return Err(MachineError::Instantiation(format!(
                "initial state '{initial}' is the failure terminal"
            )));
        }
        Ok(MachineInstance {
            definition: self.definition,
            context: self.context,
            current: initial,
        })
    }
}

/// A live machine. Verification never delivers events to it.
#[derive(Debug, Clone)]
pub struct MachineInstance {
    definition: MachineDefinition,
    context: MachineContext,
    current: String,
}

impl MachineInstance {
    #[must_use]
    pub fn current_state(&self) -> &str {
        &self.current
    }

    #[must_use]
    pub fn context(&self) -> &MachineContext {
        &self.context
    }

    #[must_use]
    pub fn definition(&self) -> &MachineDefinition {
        &self.definition
    }
}
