//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for Penelope.
//! Upstream failures come back as failed `ToolResult`s carrying a
//! displayable message, so the turn still reaches the summarizing pass.

mod fees_revenue;
mod latest_news;
mod llama_chains;
mod token_data;
mod web_search;

pub use fees_revenue::FeesRevenueTool;
pub use latest_news::LatestNewsTool;
pub use llama_chains::LlamaChainsTool;
pub use token_data::TokenDataTool;
pub use web_search::WebSearchTool;

use agent_core::{AgentError, Result as CoreResult, ToolCall};

/// String argument that must be present
fn required_str<'a>(call: &'a ToolCall, key: &str) -> CoreResult<&'a str> {
    call.str_arg(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AgentError::ToolValidation(format!("'{key}' must be a non-empty string")))
}
