use serde::{Deserialize, Serialize};

use crate::definition::{StateDefinition, StateType};

/// Caller-supplied text enumerating the identifiers a machine may reference.
///
/// The catalog is never parsed: an id is valid when the text contains it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(String);

impl Catalog {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Catalog {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Catalog {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collect the ids that break the catalog invariant, in first-seen order.
///
/// Parallel states and the `success`/`failure` sentinels are exempt. Children
/// of parallel states are checked too.
#[must_use]
pub fn unknown_state_ids(states: &[StateDefinition], catalog: &Catalog) -> Vec<String> {
    let mut unknown = Vec::new();
    collect_unknown(states, catalog, &mut unknown);
    unknown
}

fn collect_unknown(states: &[StateDefinition], catalog: &Catalog, unknown: &mut Vec<String>) {
    for state in states {
        if state.state_type != StateType::Parallel
            && !state.is_sentinel()
            && !catalog.contains(&state.id)
            && !unknown.contains(&state.id)
        {
            unknown.push(state.id.clone());
        }
        collect_unknown(&state.states, catalog, unknown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_substring_test() {
        let catalog = Catalog::from("fetchData, sendEmail");
        assert!(catalog.contains("fetchData"));
        assert!(catalog.contains("send"));
        assert!(!catalog.contains("unknownFn"));
    }

    #[test]
    fn test_valid_states_have_no_unknown_ids() {
        let catalog = Catalog::from("fetchData, sendEmail");
        let states = vec![
            StateDefinition::normal("fetchData", ["sendEmail"]),
            StateDefinition::normal("sendEmail", ["success", "failure"]),
            StateDefinition::final_state("success"),
            StateDefinition::final_state("failure"),
        ];
        assert!(unknown_state_ids(&states, &catalog).is_empty());
    }

    #[test]
    fn test_unknown_ids_are_collected_once_in_order() {
        let catalog = Catalog::from("fetchData");
        let states = vec![
            StateDefinition::normal("unknownFn", ["other"]),
            StateDefinition::normal("fetchData", ["success"]),
            StateDefinition::normal("other", ["success"]),
            StateDefinition::normal("unknownFn", ["success"]),
        ];
        assert_eq!(
            unknown_state_ids(&states, &catalog),
            vec!["unknownFn".to_string(), "other".to_string()]
        );
    }

    #[test]
    fn test_parallel_is_exempt_but_children_are_checked() {
        let catalog = Catalog::from("fetchData");
        let states = vec![StateDefinition::parallel(
            "fanOut",
            vec![
                StateDefinition::normal("fetchData", Vec::<&str>::new()),
                StateDefinition::normal("ghost", Vec::<&str>::new()),
            ],
        )];
        assert_eq!(unknown_state_ids(&states, &catalog), vec!["ghost".to_string()]);
    }

    #[test]
    fn test_sentinels_are_exempt_regardless_of_type() {
        let catalog = Catalog::from("");
        let states = vec![
            StateDefinition::normal("success", Vec::<&str>::new()),
            StateDefinition::final_state("failure"),
        ];
        assert!(unknown_state_ids(&states, &catalog).is_empty());
    }
}
