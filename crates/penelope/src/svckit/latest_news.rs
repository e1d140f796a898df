//! Latest News Tool

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::required_str;
use crate::market::MarketDataClient;
use crate::news::{NewsClient, latest_news};

pub struct LatestNewsTool {
    market: Arc<dyn MarketDataClient>,
    news: Arc<dyn NewsClient>,
}

impl LatestNewsTool {
    pub fn new(market: Arc<dyn MarketDataClient>, news: Arc<dyn NewsClient>) -> Self {
        Self { market, news }
    }
}

#[async_trait]
impl Tool for LatestNewsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_latest_news".into(),
            description: "Retrieve the latest news articles about a cryptocurrency token, with their dates.".into(),
            parameters: vec![ParameterSchema::required_string("coin", "Name or symbol of the token")],
            category: Some("news".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin = required_str(call, "coin")?;

        match latest_news(self.market.as_ref(), self.news.as_ref(), coin).await {
            Ok(Some(articles)) => Ok(ToolResult::structured("get_latest_news", serde_json::to_value(&articles)?)),
            Ok(None) => Ok(ToolResult::failure("get_latest_news", format!("No news found for {coin}."))),
            Err(e) => {
                warn!(coin, error = %e, "News lookup failed");
                Ok(ToolResult::failure("get_latest_news", e.user_message()))
            }
        }
    }
}
