use schemars::schema_for;

use crate::config::ConfigFile;

/// Generate and print the JSON Schema for the config file.
pub fn run() -> anyhow::Result<()> {
    let schema = schema_for!(ConfigFile);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(())
}
