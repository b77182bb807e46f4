//! Scripted oracle for tests.
//!
//! Replays canned outcomes in order and records every invocation so tests can
//! assert call counts and the exact message history each call carried.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// Backend that answers from a script.
///
/// Once the script runs out every further call fails with a transport error,
/// which makes an unexpected extra call visible in the test.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    /// Script of successful responses, returned in order.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        for response in responses {
            backend.push_response(response);
        }
        backend
    }

    /// Always answer with the same text, for `limit` calls.
    pub fn repeating(response: &str, limit: usize) -> Self {
        Self::new(std::iter::repeat_n(response, limit))
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response.into()));
        }
    }

    pub fn push_error(&self, error: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// Every invocation received so far, oldest first.
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Messages of the n-th call (0-based).
    pub fn messages_of(&self, call: usize) -> Vec<Message> {
        self.invocations()
            .get(call)
            .map(|inv| inv.messages.clone())
            .unwrap_or_default()
    }

    /// Outcomes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(inv);
        }

        let next = self
            .script
            .lock()
            .map_err(|_| LlmError::Transport("scripted backend poisoned".to_string()))?
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(LlmResult::new(text, "scripted", model)),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::Transport(
                "scripted backend has no response left".to_string(),
            )),
        }
    }
}
