//! Web Search Tool

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::required_str;
use crate::search::TavilyClient;

pub struct WebSearchTool {
    client: Arc<TavilyClient>,
}

impl WebSearchTool {
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "web_search".into(),
            description: "Search the web for recent information not covered by the other tools. \
                Returns titles, URLs and snippets."
                .into(),
            parameters: vec![ParameterSchema::required_string("query", "Search query")],
            category: Some("search".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = required_str(call, "query")?;

        match self.client.search(query).await {
            Ok(results) => Ok(ToolResult::structured("web_search", serde_json::to_value(&results)?)),
            Err(e) => {
                warn!(query, error = %e, "Web search failed");
                Ok(ToolResult::failure("web_search", e.user_message()))
            }
        }
    }
}
