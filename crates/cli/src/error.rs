//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration invalid after command-line overrides
    #[error("Configuration invalid after overrides: {message}")]
    InvalidOverride { message: String },

    /// A runtime component could not be constructed
    #[error("Failed to set up {component}: {message}")]
    Setup { component: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            message: message.into(),
        }
    }

    pub fn setup(component: impl Into<String>, message: impl ToString) -> Self {
        Self::Setup {
            component: component.into(),
            message: message.to_string(),
        }
    }
}
