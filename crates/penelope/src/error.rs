//! Error Types for Penelope

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PenelopeError>;

/// Shown to the user whenever an upstream data source cannot be read
pub const UNAVAILABLE_MESSAGE: &str = "Unable to fetch the data. Please check the token name and try again.";

#[derive(Error, Debug)]
pub enum PenelopeError {
    #[error("{source_name} returned HTTP {status} for {path}")]
    Upstream {
        source_name: &'static str,
        status: u16,
        path: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PenelopeError {
    /// Displayable failure value handed back to the model
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(what) => format!("No data found for {what}."),
            _ => UNAVAILABLE_MESSAGE.into(),
        }
    }
}

impl From<PenelopeError> for AgentError {
    fn from(err: PenelopeError) -> Self {
        match err {
            PenelopeError::Config(msg) => Self::Config(msg),
            PenelopeError::Network(e) if e.is_connect() || e.is_timeout() => Self::ProviderUnavailable(e.to_string()),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}
