//! Config file loading with the format picked from the file extension

use crate::{Result, ToolingError};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and deserialize a `.toml`, `.yaml`/`.yml` or `.json` file.
pub fn load_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| ToolingError::Config(format!("no file extension on {}", path.display())))?;

    let content = std::fs::read_to_string(path)?;
    let parse_err = |e: String| ToolingError::Config(format!("{}: {}", path.display(), e));

    match extension.as_str() {
        "toml" => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        other => Err(ToolingError::Config(format!(
            "unsupported config format '{}' for {}",
            other,
            path.display()
        ))),
    }
}
