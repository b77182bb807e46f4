//! Reasoning engine for statesmith
//!
//! Turns an unreliable text oracle into a source of valid state machines.
//! The [`Synthesizer`] runs the generate, validate and repair loop, the
//! [`Verifier`] checks that a state list compiles and instantiates, and the
//! [`TransitionSelector`] picks transitions at run time. Both variants,
//! [`LenientEngine`] and [`StrictEngine`], expose them through
//! [`ReasoningEngine`].
//!
//! ```no_run
//! use statesmith_config::Config;
//! use statesmith_engine::engine_from_config;
//! use statesmith_machine::Catalog;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::minimal_for_testing();
//! let (engine, _fallback) = engine_from_config(&config)?;
//! let states = engine
//!     .program("email the weekly report", &Catalog::from("fetchData, sendEmail"))
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&states)?);
//! # Ok(())
//! # }
//! ```

mod facade;
mod generator;
mod lenient;
pub mod repair;
mod selector;
mod strict;
mod synthesizer;
mod verifier;

pub use facade::{EngineCore, ReasoningEngine, engine_for, engine_from_config, with_deadline};
pub use generator::{Conversation, Generator};
pub use lenient::{LENIENT_SUCCESS_RATING, LenientEngine};
pub use selector::{TransitionChoice, TransitionSelector};
pub use strict::{STRICT_SUCCESS_RATING, StrictEngine};
pub use synthesizer::{ReferencePolicy, Synthesis, Synthesizer};
pub use verifier::{EvaluationInput, EvaluationOutcome, TaskSource, Verifier};

pub use statesmith_config::EngineVariant;
pub use statesmith_utils::error::ReasoningError;
