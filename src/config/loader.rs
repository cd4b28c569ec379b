//! Workspace config discovery and loading.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{WorkspaceConfig, CONFIG_FILE_NAME};
use crate::config::validator::{validate_references, validate_structure};
use crate::error::{FleetError, Result};

/// Resolve the config path for a workspace root.
///
/// An override is taken relative to the root unless it is absolute.
pub fn config_path(root: &Path, config_override: Option<&Path>) -> PathBuf {
    match config_override {
        Some(path) => root.join(path),
        None => root.join(CONFIG_FILE_NAME),
    }
}

/// Parse and validate config content.
///
/// # Arguments
///
/// * `content` - The JSON document
/// * `source_path` - Path for error reporting
pub fn parse_config(content: &str, source_path: &Path) -> Result<WorkspaceConfig> {
    let doc: Value = serde_json::from_str(content).map_err(|e| FleetError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let errors = validate_structure(&doc);
    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FleetError::ConfigValidationError { message });
    }

    let config: WorkspaceConfig =
        serde_json::from_value(doc).map_err(|e| FleetError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_references(&config)?;
    Ok(config)
}

/// Load a config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist, `ConfigParseError`
/// for invalid JSON, and the validation errors of [`parse_config`].
pub fn load_config_file(path: &Path) -> Result<WorkspaceConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FleetError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            FleetError::Io(e)
        }
    })?;

    let config = parse_config(&content, path)?;
    tracing::debug!(
        "Loaded {} project(s) from {}",
        config.projects.len(),
        path.display()
    );
    Ok(config)
}

/// Load the workspace config for a root with optional path override.
pub fn load_config(root: &Path, config_override: Option<&Path>) -> Result<WorkspaceConfig> {
    load_config_file(&config_path(root, config_override))
}
