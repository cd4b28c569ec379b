//! Error types for fleetenv operations.
//!
//! This module defines [`FleetError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration problems (bad JSON, unknown `dependsOn` targets, cycles)
//!   are fatal and surface as `FleetError` variants
//! - Missing env files and missing or corrupt state are *not* errors; the
//!   loaders degrade to empty results instead
//! - Provider implementations use `anyhow` internally and convert through
//!   `FleetError::Other`

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fleetenv operations.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Workspace configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse workspace configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A project declares a dependency on a project that does not exist.
    #[error("Project '{project}' depends on unknown project '{dependency}'")]
    UnknownDependency { project: String, dependency: String },

    /// Project dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// Selection filters matched nothing.
    #[error("No matching projects in config")]
    NoMatchingProjects,

    /// No provider adapter is registered under this id.
    #[error("No provider adapter registered for '{provider}'")]
    UnknownProvider { provider: String },

    /// A provider action reported failure.
    #[error("Provider '{provider}' failed: {message}")]
    ProviderFailed { provider: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for fleetenv operations.
pub type Result<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = FleetError::ConfigNotFound {
            path: PathBuf::from("/ws/fleetenv.config.json"),
        };
        assert!(err.to_string().contains("/ws/fleetenv.config.json"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = FleetError::ConfigParseError {
            path: PathBuf::from("/config.json"),
            message: "expected value".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn unknown_dependency_names_both_projects() {
        let err = FleetError::UnknownDependency {
            project: "web".into(),
            dependency: "api".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'web'"));
        assert!(msg.contains("'api'"));
    }

    #[test]
    fn circular_dependency_displays_cycle() {
        let err = FleetError::CircularDependency {
            cycle: "x -> y -> x".into(),
        };
        assert!(err.to_string().contains("x -> y -> x"));
    }

    #[test]
    fn provider_failed_displays_provider_and_message() {
        let err = FleetError::ProviderFailed {
            provider: "virtual".into(),
            message: "remote unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("virtual"));
        assert!(msg.contains("remote unavailable"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FleetError = io_err.into();
        assert!(matches!(err, FleetError::Io(_)));
    }

    #[test]
    fn anyhow_error_converts_to_other() {
        let err: FleetError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, FleetError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
