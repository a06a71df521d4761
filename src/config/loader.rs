//! Settings file loading and saving.

use std::fs;
use std::path::Path;

use crate::config::schema::Settings;
use crate::error::{ConsoleError, Result};

/// Load settings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConsoleError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConsoleError::Io(e)
        }
    })?;

    parse_settings(&content, path)
}

/// Parse YAML content into [`Settings`].
///
/// An empty document yields the defaults.
pub fn parse_settings(content: &str, source_path: &Path) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings =
        serde_yaml::from_str(content).map_err(|e| ConsoleError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;
    settings
        .validate()
        .map_err(|e| ConsoleError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(settings)
}

/// Write settings to a YAML file, replacing its contents.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let content = serde_yaml::to_string(settings).map_err(anyhow::Error::from)?;
    fs::write(path, content)?;
    Ok(())
}
