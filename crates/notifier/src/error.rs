//! Notifier error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

pub type NotifierResult<T> = Result<T, NotifierError>;

/// Notifier-specific errors
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Bot token environment variable not set
    #[error("bot token variable '{var}' is not set")]
    MissingToken { var: String },

    /// Bot API answered with `ok: false`
    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },

    /// Subscriber store could not be read or written
    #[error("subscriber store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker queue closed
    #[error("notifier worker is not running")]
    Closed,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifierError {
    pub fn api(method: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            description: description.into(),
        }
    }

    pub fn into_contract(self, channel: &str) -> ContractError {
        ContractError::notify(channel, self.to_string())
    }
}
