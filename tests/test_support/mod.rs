//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use statesmith::llm::{LlmBackend, LlmInvocation, LlmResult};
use statesmith::{CliArgs, Config, LlmError, ReasoningEngine, engine_for};
use statesmith_llm::ScriptedBackend;
use tempfile::TempDir;

pub const CATALOG: &str = "fetchData, sendEmail, archiveReport";

pub const FETCH_THEN_SUCCEED: &str = r#"[
  {"id": "fetchData", "type": "normal", "transitions": ["success"]},
  {"id": "success", "type": "final"}
]"#;

pub const FETCH_EMAIL: &str = r#"```json
[
  {"id": "fetchData", "transitions": ["sendEmail", "failure"]},
  {"id": "sendEmail", "transitions": ["success", "failure"]},
  {"id": "success", "type": "final"},
  {"id": "failure", "type": "final"}
]
```"#;

/// Parses, references only catalog ids, but does not compile.
pub const DANGLING_TARGET: &str = r#"[{"id": "fetchData", "transitions": ["sendEmail"]}]"#;

pub const UNKNOWN_ID: &str = r#"[
  {"id": "unknownFn", "transitions": ["success"]},
  {"id": "success", "type": "final"}
]"#;

/// Config loaded from a TOML file in a temp dir, the way the CLI loads it.
pub struct ConfigFixture {
    pub config: Config,
    _dir: TempDir,
}

pub fn config_from_toml(toml: &str) -> ConfigFixture {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("config.toml");
    std::fs::write(&path, toml).unwrap();

    let cli_args = CliArgs {
        config_path: Some(path),
        llm_provider: Some("openai".to_string()),
        ..Default::default()
    };
    let config = Config::discover_from(dir.path(), &cli_args).unwrap();

    ConfigFixture { config, _dir: dir }
}

pub fn scripted(
    config: &Config,
    responses: &[&str],
) -> (Arc<ScriptedBackend>, Box<dyn ReasoningEngine>) {
    let backend = Arc::new(ScriptedBackend::new(responses.iter().copied()));
    let engine = engine_for(config, backend.clone());
    (backend, engine)
}

/// Answers every call after a fixed delay.
#[derive(Debug)]
pub struct SlowBackend {
    pub delay: Duration,
    pub answer: String,
}

#[async_trait]
impl LlmBackend for SlowBackend {
    async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(LlmResult::new(self.answer.clone(), "slow", "slow-model"))
    }
}
