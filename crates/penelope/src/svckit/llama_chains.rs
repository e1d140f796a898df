//! Chain TVL Tool

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::required_str;
use crate::defillama::{Chain, DefiLlamaClient, find_chain};

pub struct LlamaChainsTool {
    client: Arc<DefiLlamaClient>,
}

impl LlamaChainsTool {
    pub fn new(client: Arc<DefiLlamaClient>) -> Self {
        Self { client }
    }
}

fn describe_tvl(chains: &mut [Chain], symbol: &str) -> String {
    find_chain(chains, symbol).map_or_else(
        || "Protocol not found".to_string(),
        |chain| format!("current tvl of {} is {}", chain.name, chain.tvl),
    )
}

#[async_trait]
impl Tool for LlamaChainsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_llama_chains".into(),
            description: "Get the current total value locked (TVL) of a blockchain from DefiLlama, \
                looked up by the chain's token symbol."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "token_symbol",
                "Token symbol of the chain (e.g., 'ETH', 'SOL')",
            )],
            category: Some("defi".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = required_str(call, "token_symbol")?;

        match self.client.chains().await {
            Ok(mut chains) => Ok(ToolResult::success("get_llama_chains", describe_tvl(&mut chains, symbol))),
            Err(e) => {
                warn!(symbol, error = %e, "DefiLlama chains lookup failed");
                Ok(ToolResult::failure("get_llama_chains", e.user_message()))
            }
        }
    }
}
