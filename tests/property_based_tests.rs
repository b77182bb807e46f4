//! Property tests over the synthesis and transition loops.

use std::sync::Arc;

use proptest::prelude::*;
use statesmith::{Catalog, ReasoningError, StateDefinition, engine_for};
use statesmith_llm::ScriptedBackend;

#[allow(clippy::duplicate_mod)]
#[path = "test_support/mod.rs"]
mod test_support;

use test_support::config_from_toml;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn linear_machine(ids: &[String]) -> String {
    let mut states: Vec<StateDefinition> = ids
        .windows(2)
        .map(|pair| StateDefinition::normal(pair[0].as_str(), [pair[1].as_str()]))
        .collect();
    if let Some(last) = ids.last() {
        states.push(StateDefinition::normal(last.as_str(), ["success"]));
    }
    states.push(StateDefinition::final_state("success"));
    serde_json::to_string(&states).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Strict synthesis only returns states whose non-final ids are in the catalog.
    #[test]
    fn prop_strict_results_stay_in_catalog(
        catalog_ids in prop::collection::btree_set("fn[a-z]{3,8}", 1..5),
        extra in "[A-Z][a-z]{3,8}",
        include_extra in any::<bool>(),
    ) {
        let catalog_ids: Vec<String> = catalog_ids.into_iter().collect();
        let catalog = Catalog::from(catalog_ids.join(", ").as_str());

        let mut answer_ids = catalog_ids.clone();
        if include_extra {
            answer_ids.push(extra.clone());
        }
        let answer = linear_machine(&answer_ids);

        let fixture = config_from_toml("[defaults]\nvariant = \"strict\"\n");
        let backend = Arc::new(ScriptedBackend::new([answer]));
        let engine = engine_for(&fixture.config, backend);

        let result = runtime().block_on(engine.program("q", &catalog));

        match result {
            Ok(states) => {
                prop_assert!(!include_extra);
                for state in states.iter().filter(|s| s.id != "success") {
                    prop_assert!(catalog.contains(&state.id));
                }
            }
            Err(ReasoningError::Referential { ids }) => {
                prop_assert!(include_extra);
                prop_assert_eq!(ids, vec![extra]);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// An accepted transition is always a substring of the current state text.
    #[test]
    fn prop_transition_is_substring_of_state(
        first in "[a-z ]{0,12}",
        second in "[a-z ]{0,12}",
    ) {
        let backend = Arc::new(ScriptedBackend::new([first.clone(), second.clone()]));
        let engine = engine_for(&statesmith::Config::minimal_for_testing(), backend);
        let current_state = "fetch data, send email";

        match runtime().block_on(engine.transition("", current_state, "{}")) {
            Ok(choice) => {
                prop_assert!(!choice.is_empty());
                prop_assert!(current_state.contains(&choice));
            }
            Err(ReasoningError::InvalidTransition { response }) => {
                prop_assert_eq!(response, second);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
