//! Machine data model and execution-engine collaborator for statesmith
//!
//! - [`StateDefinition`] and [`Catalog`]: what the oracle is asked to produce
//!   and what it may reference
//! - [`MachineEngine`]: compile + instantiate, the only engine capability the
//!   synthesis core needs
//! - [`TaskRegistry`]: identifier to capability implementation mapping

mod catalog;
mod definition;
mod engine;
mod task;

pub use catalog::{Catalog, unknown_state_ids};
pub use definition::{
    FAILURE_STATE_ID, SUCCESS_STATE_ID, StateDefinition, StateKind, StateType, Transition,
    parse_states,
};
pub use engine::{Interpreter, Machine, MachineDefinition, MachineEngine, MachineInstance};
pub use statesmith_utils::error::MachineError;
pub use task::{MachineContext, MachineEvent, PlaceholderTask, Task, TaskRegistry};
