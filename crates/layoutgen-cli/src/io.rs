#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use serde_json::Value;

use crate::client::CliError;

/// Read a generation request file. Only the JSON shape is checked here; the
/// server reports schema violations.
pub async fn read_request(path: &Path) -> Result<Value, CliError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::InputFile {
            path: path.display().to_string(),
            source,
        })?;
    let value: Value = serde_json::from_slice(&data)
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", path.display())))?;
    if !value.is_array() {
        return Err(CliError::InvalidInput(format!(
            "{}: expected an array of layout documents",
            path.display()
        )));
    }
    Ok(value)
}

pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CliError::OutputFile {
            path: path.display().to_string(),
            source,
        })
}

/// Last path segment of an artifact URL.
pub fn file_name_of(url: &str) -> Result<String, CliError> {
    let parsed = url::Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back().map(str::to_string))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CliError::InvalidInput(format!("no file name in {url}")))
}
