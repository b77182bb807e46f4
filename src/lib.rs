//! statesmith - synthesize validated state machines with a text oracle
//!
//! statesmith asks a language model for a finite-state-machine definition that
//! solves a natural-language task, checks that every state references a known
//! function, repairs malformed answers by replaying the conversation with
//! corrective instructions, and verifies that the result compiles.
//!
//! statesmith can be used in two ways:
//! - **CLI**: run `statesmith program`, `evaluate`, `transition`, `solve` or `config`
//! - **Library**: build a [`ReasoningEngine`] and call it from your application
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Synthesize a machine for a task
//! statesmith program "email me the weekly report" --catalog "fetchData, sendEmail"
//!
//! # Check an existing state list
//! statesmith evaluate --states-file machine.json
//! ```
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use statesmith::{Catalog, Config, engine_from_config};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::minimal_for_testing();
//! let (engine, _fallback) = engine_from_config(&config)?;
//!
//! let states = engine
//!     .program("fetch the data, then email it", &Catalog::from("fetchData, sendEmail"))
//!     .await?;
//! assert!(!states.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Variants
//!
//! - [`LenientEngine`] repairs unknown state ids once and does not verify inside `program`.
//! - [`StrictEngine`] rejects unknown state ids and only returns machines that compile.
//!
//! [`Config::variant`] picks one; [`engine_from_config`] builds it.

pub mod cli;

pub use statesmith_config::{CliArgs, Config, EngineVariant};
pub use statesmith_engine::{
    EngineCore, EvaluationInput, EvaluationOutcome, Generator, LENIENT_SUCCESS_RATING,
    LenientEngine, ReasoningEngine, ReferencePolicy, STRICT_SUCCESS_RATING, StrictEngine,
    Synthesizer, TaskSource, TransitionSelector, Verifier, engine_for, engine_from_config,
    with_deadline,
};
pub use statesmith_extraction::extract_json;
pub use statesmith_machine::{
    Catalog, Interpreter, MachineContext, MachineEngine, PlaceholderTask, StateDefinition, Task,
    TaskRegistry, parse_states,
};
pub use statesmith_prompt_template::{DefaultPrompts, PromptPair, PromptRole, PromptSet};
pub use statesmith_utils::error::{
    ConfigError, LlmError, MachineError, ReasoningError, StatesmithError,
};
pub use statesmith_utils::exit_codes::ExitCode;

/// Oracle backends and their construction from configuration.
pub mod llm {
    pub use statesmith_llm::{
        LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, Message, Role, from_config,
        from_config_with_fallback,
    };

    #[cfg(feature = "test-utils")]
    pub use statesmith_llm::ScriptedBackend;
}
