//! Shared HTTP error mapping for hosted backends

use agent_core::AgentError;
use reqwest::{Response, StatusCode};

/// Map a non-success HTTP status to an agent error
pub fn status_error(status: StatusCode, body: String) -> AgentError {
    match status.as_u16() {
        401 | 403 => AgentError::Auth(body),
        429 => AgentError::RateLimited(body),
        500..=599 => AgentError::ProviderUnavailable(format!("HTTP {status}: {body}")),
        _ => AgentError::Provider(format!("HTTP {status}: {body}")),
    }
}

/// Map a transport failure. Connection problems and timeouts are retryable.
pub fn transport_error(e: &reqwest::Error) -> AgentError {
    if e.is_connect() || e.is_timeout() {
        AgentError::ProviderUnavailable(e.to_string())
    } else {
        AgentError::Provider(e.to_string())
    }
}

/// Pass successful responses through, turn the rest into errors
pub async fn check(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}
