//! Repair instructions sent back to the oracle after a rejected answer.

use statesmith_machine::Catalog;

/// The answer did not parse as a state list.
#[must_use]
pub fn syntax_repair(unwrapped: &str, parse_error: &str) -> String {
    format!(
        "your generated solution:\n{unwrapped}\ngenerated the following error:\n{parse_error}\n\
         Ensure the JSON is valid and does not contain any trailing commas, correct quotes, etc\n\
         Only respond with the updated JSON! Your response will be sent to JSON.parse"
    )
}

/// The answer used state ids that are not in the catalog.
#[must_use]
pub fn reference_repair(unknown_ids: &[String], catalog: &Catalog) -> String {
    format!(
        "your previous answer generated the following errors:\n\
         Unknown state ID encountered: {}\n\
         Replace the unknown state IDs with valid IDs found in the function catalog below:\n\
         ###### start function catalog ######\n{catalog}\n###### end function catalog ######\n\
         Do not modify the state machine in any other way!\n\
         Only respond with the updated JSON and don't be chatty! Your response will be sent to JSON.parse",
        unknown_ids.join(",")
    )
}

/// The chosen transition is not one of the current state's transitions.
#[must_use]
pub fn transition_repair(choice: &str) -> String {
    format!(
        "your generated solution:\n{choice}\ndoes not include a valid transition ID! \
         Make sure your are picking a transition ID from the provided state's transitions array\n\
         Do not be chatty!"
    )
}
