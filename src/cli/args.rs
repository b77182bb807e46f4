//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// statesmith - synthesize state machines with a text oracle
#[derive(Parser, Debug)]
#[command(name = "statesmith")]
#[command(about = "Synthesize validated finite-state-machine definitions from natural-language tasks")]
#[command(long_about = r#"
statesmith asks a language model for a state machine that solves a task,
checks the answer against a catalog of allowed functions, repairs it when the
model gets it wrong, and verifies that the result compiles.

EXAMPLES:
  # Synthesize a machine from a query and a function catalog
  statesmith program "email me the weekly report" --catalog "fetchData, sendEmail"

  # Same, with the catalog read from a file and the strict variant
  statesmith --variant strict program "email me the report" --catalog-file tools.txt

  # Check that a state list compiles
  statesmith evaluate --states-file machine.json

  # Pick the next transition of a running machine
  statesmith transition --state '{"id":"fetchData","transitions":["ok","retry"]}' --payload '{"status":200}'

  # Show the effective configuration and where each value came from
  statesmith config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .statesmith/config.toml
  Use --config to specify an explicit config file path

EXIT CODES:
  0 success, 2 configuration, 10 timeout, 70 oracle failure,
  75 synthesis failure, 76 invalid transition
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Engine variant: lenient or strict
    #[arg(long, global = true)]
    pub variant: Option<String>,

    /// Model to use for every role without a role override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// LLM provider to use (openai, openrouter, anthropic)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// Per-call oracle timeout in seconds (default: 120)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Deadline for the whole operation in seconds
    #[arg(long, global = true)]
    pub deadline: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a query in free text
    ///
    /// EXAMPLES:
    ///   statesmith solve "What is the capital of France?"
    ///   echo "Summarize this" | statesmith solve
    Solve {
        /// Query to answer; read from stdin when omitted
        query: Option<String>,
    },

    /// Synthesize a state list for a query
    ///
    /// Prints the state list as JSON on success.
    Program {
        /// Task to turn into a state machine; read from stdin when omitted
        query: Option<String>,

        /// Function catalog text
        #[arg(long, conflicts_with = "catalog_file", required_unless_present = "catalog_file")]
        catalog: Option<String>,

        /// File holding the function catalog
        #[arg(long)]
        catalog_file: Option<PathBuf>,

        /// Also print the structural evaluation of the result
        #[arg(long)]
        evaluate: bool,
    },

    /// Check that a state list compiles and instantiates
    ///
    /// Exits with 75 when the machine cannot be built.
    Evaluate {
        /// JSON file with the state list; `-` reads stdin
        #[arg(long)]
        states_file: PathBuf,

        /// Query the states were written for
        #[arg(long, default_value = "")]
        query: String,
    },

    /// Choose the next transition for an event
    Transition {
        /// Description of the current state, including its transitions
        #[arg(long)]
        state: String,

        /// Event payload to react to
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Task list of the running machine
        #[arg(long, default_value = "")]
        task_list: String,
    },

    /// Print the effective configuration
    Config {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Solve { .. } => "solve",
            Self::Program { .. } => "program",
            Self::Evaluate { .. } => "evaluate",
            Self::Transition { .. } => "transition",
            Self::Config { .. } => "config",
        }
    }
}

/// Build the clap command, for completions and help rendering.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
