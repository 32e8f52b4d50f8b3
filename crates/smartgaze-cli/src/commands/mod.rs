pub mod analyze;
pub mod config;
pub mod results;
pub mod score;
pub mod session;

use std::path::Path;

use serde::de::DeserializeOwned;

/// Read a JSON input file into a typed value.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a value as pretty JSON, to a file or stdout.
pub fn write_json<T: serde::Serialize>(
    value: &T,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}
