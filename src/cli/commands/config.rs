//! `statesmith config`

use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value, json};
use statesmith_config::Config;

/// Write the effective configuration with the source of each value.
pub fn execute_config_command(config: &Config, as_json: bool, out: &mut dyn Write) -> Result<()> {
    let effective = config.effective_config();

    if as_json {
        let entries: Map<String, Value> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, json!({ "value": value, "source": source })))
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&Value::Object(entries))?)?;
        return Ok(());
    }

    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in effective {
        writeln!(out, "{key:<width$} = {value}  ({source})")?;
    }
    Ok(())
}
