//! The four-operation contract and the building blocks both variants share.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use statesmith_config::{Config, EngineVariant};
use statesmith_llm::{LlmBackend, LlmError, LlmFallbackInfo};
use statesmith_machine::{Catalog, Interpreter, MachineEngine, StateDefinition};
use statesmith_prompt_template::{DefaultPrompts, PromptRole, PromptSet};
use statesmith_utils::error::ReasoningError;
use statesmith_utils::logging::{log_operation_complete, log_operation_error, operation_span};
use tracing::Instrument;

use crate::generator::Generator;
use crate::selector::TransitionSelector;
use crate::verifier::{EvaluationInput, EvaluationOutcome, Verifier};
use crate::{LenientEngine, StrictEngine};

/// Solver, programmer, evaluator and transition logic behind one interface.
///
/// Every call is self-contained: nothing is shared between calls except the
/// configured collaborators, so an engine may be used from many tasks at once.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    fn variant(&self) -> EngineVariant;

    /// Free-text answer to a query.
    async fn solve(&self, query: &str) -> Result<String, ReasoningError>;

    /// Synthesize a state list whose ids come from `catalog`.
    async fn program(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Vec<StateDefinition>, ReasoningError>;

    /// Structural smoke test; failures are reported in the outcome.
    fn evaluate(&self, input: &EvaluationInput) -> EvaluationOutcome;

    /// Pick one transition id out of `current_state`.
    async fn transition(
        &self,
        task_list: &str,
        current_state: &str,
        payload: &str,
    ) -> Result<String, ReasoningError>;
}

/// Collaborators shared by both variants.
#[derive(Clone)]
pub struct EngineCore {
    generator: Generator,
    prompts: Arc<dyn PromptSet>,
    machine: Arc<dyn MachineEngine>,
}

impl EngineCore {
    /// Core with the built-in prompts and interpreter.
    #[must_use]
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            prompts: Arc::new(DefaultPrompts::default()),
            machine: Arc::new(Interpreter),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, backend: Arc<dyn LlmBackend>) -> Self {
        Self::new(Generator::from_config(backend, config))
            .with_prompts(Arc::new(DefaultPrompts::new(config.prompt_template())))
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: Arc<dyn PromptSet>) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_machine_engine(mut self, machine: Arc<dyn MachineEngine>) -> Self {
        self.machine = machine;
        self
    }

    #[must_use]
    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    #[must_use]
    pub fn prompts(&self) -> &dyn PromptSet {
        self.prompts.as_ref()
    }

    /// Verifier for a variant, backed by this core's machine engine.
    #[must_use]
    pub fn verifier(&self, variant: EngineVariant) -> Verifier {
        Verifier::for_variant(variant, Arc::clone(&self.machine))
    }

    pub(crate) async fn solve(
        &self,
        variant: EngineVariant,
        query: &str,
    ) -> Result<String, ReasoningError> {
        traced("solve", variant, |request_id| async move {
            let prompt = self.prompts.solver(query);
            let answer = self
                .generator
                .generate(PromptRole::Solver, &request_id, &prompt)
                .await?;
            Ok((answer, 1))
        })
        .await
    }

    pub(crate) async fn transition(
        &self,
        variant: EngineVariant,
        task_list: &str,
        current_state: &str,
        payload: &str,
    ) -> Result<String, ReasoningError> {
        traced("transition", variant, |request_id| async move {
            let choice = TransitionSelector::new(&self.generator, self.prompts())
                .select(&request_id, task_list, current_state, payload)
                .await?;
            Ok((choice.id, choice.oracle_calls))
        })
        .await
    }

    pub(crate) fn evaluate(
        &self,
        variant: EngineVariant,
        input: &EvaluationInput,
    ) -> EvaluationOutcome {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = operation_span("evaluate", variant.as_str(), &request_id);
        let started = Instant::now();
        span.in_scope(|| {
            let outcome = self.verifier(variant).evaluate(input);
            let elapsed = started.elapsed().as_millis();
            match &outcome.error {
                Some(e) => log_operation_error("evaluate", &e.to_string(), elapsed),
                None => log_operation_complete("evaluate", 0, elapsed),
            }
            outcome
        })
    }
}

impl std::fmt::Debug for EngineCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCore")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

/// Run one operation inside its span and log how it ended.
///
/// The body receives a fresh request id and returns its value together with
/// the number of oracle calls it made.
pub(crate) async fn traced<T, F, Fut>(
    operation: &'static str,
    variant: EngineVariant,
    body: F,
) -> Result<T, ReasoningError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<(T, u32), ReasoningError>>,
{
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = operation_span(operation, variant.as_str(), &request_id);
    let started = Instant::now();

    let result = body(request_id).instrument(span.clone()).await;
    let elapsed = started.elapsed().as_millis();

    span.in_scope(|| match result {
        Ok((value, oracle_calls)) => {
            log_operation_complete(operation, oracle_calls, elapsed);
            Ok(value)
        }
        Err(e) => {
            log_operation_error(operation, &e.to_string(), elapsed);
            Err(e)
        }
    })
}

/// Bound a whole operation by a deadline.
///
/// Operations are not cancellable between oracle calls, so callers that
/// need a ceiling wrap the call here; running out of time is reported as a
/// transport timeout.
///
/// # Errors
///
/// Returns the operation's own error, or `Transport(Timeout)` on expiry.
pub async fn with_deadline<T, Fut>(deadline: Duration, operation: Fut) -> Result<T, ReasoningError>
where
    Fut: Future<Output = Result<T, ReasoningError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(ReasoningError::Transport(LlmError::Timeout { duration: deadline })),
    }
}

/// Build the variant named in the configuration.
#[must_use]
pub fn engine_for(config: &Config, backend: Arc<dyn LlmBackend>) -> Box<dyn ReasoningEngine> {
    match config.variant() {
        EngineVariant::Lenient => Box::new(LenientEngine::from_config(config, backend)),
        EngineVariant::Strict => Box::new(StrictEngine::from_config(config, backend)),
    }
}

/// Build the configured backend and engine, honouring `llm.fallback_provider`.
///
/// When the fallback backend is used, per-role models are resolved against
/// the fallback provider rather than the primary.
///
/// # Errors
///
/// Returns the backend construction error when no provider can be built.
pub fn engine_from_config(
    config: &Config,
) -> Result<(Box<dyn ReasoningEngine>, Option<LlmFallbackInfo>), LlmError> {
    let (backend, fallback) = statesmith_llm::from_config_with_fallback(config)?;
    let engine = engine_for_backend(config, Arc::from(backend), fallback.as_ref());
    Ok((engine, fallback))
}

fn engine_for_backend(
    config: &Config,
    backend: Arc<dyn LlmBackend>,
    fallback: Option<&LlmFallbackInfo>,
) -> Box<dyn ReasoningEngine> {
    match fallback {
        Some(info) => engine_for(&config.with_provider(&info.fallback_provider), backend),
        None => engine_for(config, backend),
    }
}
