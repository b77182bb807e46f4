//! Capability implementations bound to state ids, and the context a machine
//! is seeded with.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::StateDefinition;

/// Neutral context a machine instance starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineContext {
    pub status: i64,
    pub request_id: String,
    #[serde(default)]
    pub stack: Vec<String>,
}

impl MachineContext {
    /// Status 0, a fresh request id and an empty call stack.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            status: 0,
            request_id: uuid::Uuid::new_v4().to_string(),
            stack: Vec::new(),
        }
    }
}

impl Default for MachineContext {
    fn default() -> Self {
        Self::neutral()
    }
}

/// An event delivered to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl MachineEvent {
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// A capability implementation invoked when the machine enters a state.
pub trait Task: Send + Sync + std::fmt::Debug {
    /// Identifier the task is registered under.
    fn id(&self) -> &str;

    /// Handle an event and return the event to forward.
    fn call(&self, event: &MachineEvent) -> MachineEvent;
}

/// Identity stub: records every event it receives and forwards it unchanged.
#[derive(Debug)]
pub struct PlaceholderTask {
    id: String,
    received: Mutex<Vec<MachineEvent>>,
}

impl PlaceholderTask {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Events received so far, oldest first.
    #[must_use]
    pub fn received(&self) -> Vec<MachineEvent> {
        self.received
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Task for PlaceholderTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn call(&self, event: &MachineEvent) -> MachineEvent {
        if let Ok(mut events) = self.received.lock() {
            events.push(event.clone());
        }
        event.clone()
    }
}

/// Mapping from state id to capability implementation.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<dyn Task>>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`PlaceholderTask`] for every state id, children included.
    #[must_use]
    pub fn placeholders_for(states: &[StateDefinition]) -> Self {
        let mut registry = Self::new();
        registry.add_placeholders(states);
        registry
    }

    fn add_placeholders(&mut self, states: &[StateDefinition]) {
        for state in states {
            if !self.contains(&state.id) {
                self.register(Arc::new(PlaceholderTask::new(state.id.clone())));
            }
            self.add_placeholders(&state.states);
        }
    }

    /// Register a task under its own id, replacing any previous one.
    pub fn register(&mut self, task: Arc<dyn Task>) {
        self.tasks.insert(task.id().to_string(), task);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}
