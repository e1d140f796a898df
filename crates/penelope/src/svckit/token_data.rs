//! Token Data Tool
//!
//! Market snapshot(s) for a free-text coin name.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::required_str;
use crate::market::{MarketDataClient, token_data};

pub struct TokenDataTool {
    market: Arc<dyn MarketDataClient>,
}

impl TokenDataTool {
    pub fn new(market: Arc<dyn MarketDataClient>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for TokenDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_token_data".into(),
            description: "Fetch market data about a cryptocurrency token: current price, price a year ago, \
                market cap, volume, supply figures and model, all-time high, categories, chains and contracts."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "coin",
                "Name, symbol or id of the token (e.g., 'solana', 'BTC')",
            )],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin = required_str(call, "coin")?;

        match token_data(self.market.as_ref(), coin).await {
            Ok(snapshots) => Ok(ToolResult::structured("get_token_data", serde_json::to_value(&snapshots)?)),
            Err(e) => {
                warn!(coin, error = %e, "{} lookup failed", self.market.name());
                Ok(ToolResult::failure("get_token_data", e.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::stub::StubMarket;
    use serde_json::json;

    fn tool() -> TokenDataTool {
        TokenDataTool::new(Arc::new(
            StubMarket::default().with_coin("Solana", "sol", "solana", 142.5, 66_000_000_000.0),
        ))
    }

    #[tokio::test]
    async fn test_snapshot_output() {
        let result = tool().execute(&ToolCall::new("get_token_data", json!({"coin": "Solana"}))).await.unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data[0]["id"], "solana");
        assert_eq!(data[0]["supply_model"], "Inflationary");
        assert!(result.output.contains("142.5"));
    }

    #[tokio::test]
    async fn test_missing_coin_is_validation_error() {
        let err = tool().execute(&ToolCall::new("get_token_data", json!({"coin": "  "}))).await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::ToolValidation(_)));
    }
}
