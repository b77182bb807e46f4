//! End-to-end reasoning scenarios through the public API.
//!
//! Every oracle answer comes from a script, so each test pins the exact
//! number of oracle calls an operation makes.

use statesmith::llm::Role;
use statesmith::{Catalog, Config, EngineVariant, EvaluationInput, MachineError, ReasoningError};
use statesmith_llm::ScriptedBackend;

#[allow(clippy::duplicate_mod)]
#[path = "test_support/mod.rs"]
mod test_support;

use test_support::*;

fn lenient() -> Config {
    Config::minimal_for_testing()
}

fn strict() -> ConfigFixture {
    config_from_toml("[defaults]\nvariant = \"strict\"\n")
}

#[tokio::test]
async fn test_valid_first_answer_needs_one_call() {
    for config in [lenient(), strict().config] {
        let (backend, engine) = scripted(&config, &[FETCH_THEN_SUCCEED]);

        let states = engine
            .program("fetch the data", &Catalog::from(CATALOG))
            .await
            .unwrap();

        assert_eq!(states.len(), 2, "variant {}", engine.variant());
        assert_eq!(backend.call_count(), 1);
    }
}

#[tokio::test]
async fn test_fenced_answer_is_unwrapped() {
    let (_, engine) = scripted(&lenient(), &[FETCH_EMAIL]);

    let states = engine
        .program("fetch and email", &Catalog::from(CATALOG))
        .await
        .unwrap();

    let ids: Vec<&str> = states.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["fetchData", "sendEmail", "success", "failure"]);
}

#[tokio::test]
async fn test_syntax_repair_replays_the_conversation() {
    let (backend, engine) = scripted(&lenient(), &["[{\"id\": \"fetchData\",", FETCH_THEN_SUCCEED]);

    engine
        .program("fetch the data", &Catalog::from(CATALOG))
        .await
        .unwrap();

    assert_eq!(backend.call_count(), 2);
    let repair = backend.messages_of(1);
    assert_eq!(repair.len(), 4);
    assert_eq!(repair[0].role, Role::System);
    assert_eq!(repair[2].role, Role::Assistant);
    assert_eq!(repair[2].content, "[{\"id\": \"fetchData\",");
    assert_eq!(repair[3].role, Role::User);
}

#[tokio::test]
async fn test_second_syntax_failure_is_terminal() {
    let (backend, engine) = scripted(&lenient(), &["nope", "still nope", FETCH_THEN_SUCCEED]);

    match engine.program("q", &Catalog::from(CATALOG)).await {
        Err(ReasoningError::Syntax { attempts, response, .. }) => {
            assert_eq!(attempts, 2);
            assert_eq!(response, "still nope");
        }
        other => panic!("Expected Syntax, got {other:?}"),
    }
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_unknown_ids_by_variant() {
    let (backend, engine) = scripted(&lenient(), &[UNKNOWN_ID, FETCH_THEN_SUCCEED]);
    let states = engine.program("q", &Catalog::from(CATALOG)).await.unwrap();
    assert_eq!(states[0].id, "fetchData");
    assert_eq!(backend.call_count(), 2);

    let fixture = strict();
    let (backend, engine) = scripted(&fixture.config, &[UNKNOWN_ID, FETCH_THEN_SUCCEED]);
    match engine.program("q", &Catalog::from(CATALOG)).await {
        Err(ReasoningError::Referential { ids }) => assert_eq!(ids, ["unknownFn"]),
        other => panic!("Expected Referential, got {other:?}"),
    }
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_revalidated_reference_repair_gives_up() {
    let fixture = config_from_toml(
        "[synthesis]\nrevalidate_references = true\nreference_repairs = 1\n",
    );
    let (backend, engine) = scripted(&fixture.config, &[UNKNOWN_ID, UNKNOWN_ID]);

    match engine.program("q", &Catalog::from(CATALOG)).await {
        Err(ReasoningError::Referential { ids }) => assert_eq!(ids, ["unknownFn"]),
        other => panic!("Expected Referential, got {other:?}"),
    }
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_strict_program_only_returns_compiling_machines() {
    let fixture = strict();
    let (_, engine) = scripted(&fixture.config, &[DANGLING_TARGET]);

    match engine.program("q", &Catalog::from(CATALOG)).await {
        Err(ReasoningError::Structural(MachineError::UnknownTarget { target, .. })) => {
            assert_eq!(target, "sendEmail");
        }
        other => panic!("Expected Structural, got {other:?}"),
    }

    // The lenient variant hands the same answer back unverified.
    let (_, engine) = scripted(&lenient(), &[DANGLING_TARGET]);
    let states = engine.program("q", &Catalog::from(CATALOG)).await.unwrap();
    assert!(engine.evaluate(&EvaluationInput::new("q", states)).is_failure());
}

#[tokio::test]
async fn test_strict_program_attempts_from_config() {
    let fixture = config_from_toml(
        "[defaults]\nvariant = \"strict\"\n\n[synthesis]\nprogram_attempts = 2\n",
    );
    let (backend, engine) = scripted(&fixture.config, &[DANGLING_TARGET, FETCH_THEN_SUCCEED]);

    let states = engine.program("q", &Catalog::from(CATALOG)).await.unwrap();

    assert_eq!(states.len(), 2);
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn test_evaluate_never_calls_the_oracle() {
    let backend = std::sync::Arc::new(ScriptedBackend::default());
    let engine = statesmith::engine_for(&lenient(), backend.clone());
    let states = statesmith::parse_states(FETCH_THEN_SUCCEED).unwrap();

    let outcome = engine.evaluate(&EvaluationInput::new("q", states));

    assert_eq!(outcome.rating, statesmith::LENIENT_SUCCESS_RATING);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_transition_repair_then_invalid() {
    for config in [lenient(), strict().config] {
        let (backend, engine) = scripted(&config, &["t3", "t2"]);
        let choice = engine.transition("tasks", "t1,t2", "{}").await.unwrap();
        assert_eq!(choice, "t2");
        assert_eq!(backend.call_count(), 2);

        let (backend, engine) = scripted(&config, &["t3", "t9"]);
        match engine.transition("tasks", "t1,t2", "{}").await {
            Err(ReasoningError::InvalidTransition { response }) => assert_eq!(response, "t9"),
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(backend.call_count(), 2);
    }
}

#[tokio::test]
async fn test_variant_selected_from_config_file() {
    let fixture = strict();
    let (_, engine) = scripted(&fixture.config, &[]);
    assert_eq!(engine.variant(), EngineVariant::Strict);

    let (_, engine) = scripted(&lenient(), &[]);
    assert_eq!(engine.variant(), EngineVariant::Lenient);
}

#[tokio::test]
async fn test_unbudgeted_engine_serves_many_program_calls() {
    let config = lenient();
    let scripted = ScriptedBackend::repeating(FETCH_THEN_SUCCEED, 30);
    let backend = statesmith_llm::BudgetedBackend::wrap_from_config(Box::new(scripted), None);
    let engine = statesmith::engine_for(&config, std::sync::Arc::from(backend));

    for call in 0..25 {
        let result = engine
            .program("fetch the data", &Catalog::from(CATALOG))
            .await;
        assert!(result.is_ok(), "program call {call} failed: {result:?}");
    }
}
