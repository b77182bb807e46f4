//! CLI command implementations.
//!
//! Each handler writes its result to the given writer so tests can capture
//! output; `run.rs` passes stdout.

mod common;
mod config;
mod evaluate;
mod program;
mod solve;
mod transition;

pub use common::{bounded, build_engine, read_argument_or_stdin, read_file_or_stdin};
pub use config::execute_config_command;
pub use evaluate::execute_evaluate_command;
pub use program::execute_program_command;
pub use solve::execute_solve_command;
pub use transition::execute_transition_command;
