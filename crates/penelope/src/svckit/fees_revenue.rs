//! Protocol Fees & Revenue Tool

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::required_str;
use crate::defillama::DefiLlamaClient;

pub struct FeesRevenueTool {
    client: Arc<DefiLlamaClient>,
}

impl FeesRevenueTool {
    pub fn new(client: Arc<DefiLlamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FeesRevenueTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_fees_revenue".into(),
            description: "Get daily fees and revenue of a DeFi protocol from DefiLlama: revenue, user fees, \
                holders revenue and protocol revenue."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "token_name",
                "DefiLlama slug of the protocol (e.g., 'uniswap', 'aave')",
            )],
            category: Some("defi".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let protocol = required_str(call, "token_name")?.to_lowercase();

        match self.client.fees_revenue(&protocol).await {
            Ok(fees) => Ok(ToolResult::structured("get_fees_revenue", serde_json::to_value(&fees)?)),
            Err(e) => {
                warn!(protocol = %protocol, error = %e, "DefiLlama fees lookup failed");
                Ok(ToolResult::failure("get_fees_revenue", e.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema() {
        let tool = FeesRevenueTool::new(Arc::new(DefiLlamaClient::new("https://api.llama.fi").unwrap()));
        let schema = tool.schema();
        assert_eq!(schema.name, "get_fees_revenue");
        assert!(schema.parameters[0].required);
    }
}
