//! Budgeted backend wrapper for oracle call limiting
//!
//! Wraps any `LlmBackend` and bounds the number of invocations over the
//! wrapper's lifetime. The budget is opt-in: without `STATESMITH_LLM_BUDGET`
//! or `[llm.<provider>] budget` backends are not wrapped at all, so a
//! long-lived engine keeps working across any number of operations.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Environment variable for overriding the budget limit
pub const BUDGET_ENV_VAR: &str = "STATESMITH_LLM_BUDGET";

/// A wrapper around an `LlmBackend` that enforces a budget limit on invocations.
///
/// The budget tracks attempted calls, not successful requests: a failed call
/// still consumes its slot, so retry loops cannot bypass the limit.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit = limit, "Creating BudgetedBackend");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Resolve the configured limit, if any
    ///
    /// Budget limit precedence (highest to lowest):
    /// 1. Environment variable (`STATESMITH_LLM_BUDGET`)
    /// 2. Config file (`[llm.<provider>] budget`)
    ///
    /// With neither set there is no limit.
    #[must_use]
    pub fn limit_from_config(config_budget: Option<u32>) -> Option<u32> {
        let env_limit = std::env::var(BUDGET_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<u32>().ok());

        match (env_limit, config_budget) {
            (Some(limit), _) => {
                debug!(limit, "Using budget limit from environment variable {BUDGET_ENV_VAR}");
                Some(limit)
            }
            (None, Some(limit)) => {
                debug!(limit, "Using budget limit from config file");
                Some(limit)
            }
            (None, None) => None,
        }
    }

    /// Wrap `inner` when a limit is configured, otherwise return it unchanged.
    #[must_use]
    pub fn wrap_from_config(
        inner: Box<dyn LlmBackend>,
        config_budget: Option<u32>,
    ) -> Box<dyn LlmBackend> {
        match Self::limit_from_config(config_budget) {
            Some(limit) => Box::new(Self::new(inner, limit)),
            None => inner,
        }
    }

    /// Calls attempted so far, including rejected ones
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Counted before the call so attempts, not successes, are budgeted
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(
                limit = self.limit,
                attempted = attempted,
                "Budget limit exceeded"
            );
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        debug!(
            call_count = current + 1,
            limit = self.limit,
            "Budget check passed, invoking inner backend"
        );

        let result = self.inner.invoke(inv).await;

        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                limit = self.limit,
                error = %e,
                "Inner backend invocation failed (budget slot still consumed)"
            );
        }

        result
    }
}
