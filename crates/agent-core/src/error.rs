//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Model output could not be read as a tool selection
    #[error("Malformed model output: {0}")]
    Parse(String),

    /// A thread run ended in a terminal non-success status
    #[error("Run failed with status: {0}")]
    RunFailed(String),

    /// Maximum polling iterations reached
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// History store error
    #[error("History error: {0}")]
    History(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is transient
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_)
                | Self::RateLimited(_)
                | Self::RunFailed(_)
                | Self::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Parse(_) => "The assistant returned a response that could not be understood.".into(),
            Self::RunFailed(status) => format!("The assistant run ended with status '{status}'."),
            Self::MaxIterations(_) => "The request took too long to process. Please try a simpler query.".into(),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::ProviderUnavailable("503".into()).is_retryable());
        assert!(AgentError::RunFailed("expired".into()).is_retryable());
        assert!(!AgentError::ToolNotFound("nope".into()).is_retryable());
        assert!(!AgentError::Parse("{".into()).is_retryable());
    }

    #[test]
    fn test_user_message_names_tool() {
        let msg = AgentError::ToolNotFound("get_weather".into()).user_message();
        assert!(msg.contains("get_weather"));
    }
}
