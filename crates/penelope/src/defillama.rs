//! DefiLlama
//!
//! Chain TVL and protocol fee/revenue overviews.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::{PenelopeError, Result};

/// Entry of `/v2/chains`
#[derive(Clone, Debug, Deserialize)]
pub struct Chain {
    pub name: String,
    #[serde(rename = "tokenSymbol", default)]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub tvl: f64,
}

/// Daily fee and revenue figures for one protocol
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeesRevenue {
    #[serde(default)]
    pub chain: Option<Value>,
    #[serde(default)]
    pub daily_revenue: Option<f64>,
    #[serde(default)]
    pub daily_user_fees: Option<f64>,
    #[serde(default)]
    pub daily_holders_revenue: Option<f64>,
    #[serde(default)]
    pub daily_protocol_revenue: Option<f64>,
}

/// First chain whose token symbol equals `symbol`, ignoring case. Chains are
/// scanned in token-symbol order.
pub fn find_chain<'a>(chains: &'a mut [Chain], symbol: &str) -> Option<&'a Chain> {
    chains.sort_by(|a, b| {
        a.token_symbol
            .as_deref()
            .unwrap_or_default()
            .cmp(b.token_symbol.as_deref().unwrap_or_default())
    });

    let symbol = symbol.to_lowercase();
    chains
        .iter()
        .find(|c| c.token_symbol.as_deref().is_some_and(|s| s.to_lowercase() == symbol))
}

pub struct DefiLlamaClient {
    client: Client,
    base_url: String,
}

impl DefiLlamaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let response = self.client.get(format!("{}{path}", self.base_url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PenelopeError::Upstream {
                source_name: "defillama",
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    pub async fn chains(&self) -> Result<Vec<Chain>> {
        self.get("/v2/chains").await
    }

    #[instrument(skip(self))]
    pub async fn fees_revenue(&self, protocol: &str) -> Result<FeesRevenue> {
        self.get(&format!(
            "/overview/fees/{protocol}?excludeTotalDataChart=true&excludeTotalDataChartBreakdown=true&dataType=dailyFees"
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_chain_by_symbol() {
        let mut chains: Vec<Chain> = serde_json::from_value(json!([
            {"name": "Ethereum", "tokenSymbol": "ETH", "tvl": 55000000000.5},
            {"name": "Solana", "tokenSymbol": "SOL", "tvl": 4500000000.0},
            {"name": "Base", "tokenSymbol": null, "tvl": 1.0}
        ]))
        .unwrap();

        let chain = find_chain(&mut chains, "sol").unwrap();
        assert_eq!(chain.name, "Solana");
        assert!(find_chain(&mut chains, "doge").is_none());
    }

    #[test]
    fn test_fees_revenue_fields() {
        let fees: FeesRevenue = serde_json::from_value(json!({
            "name": "uniswap",
            "chain": ["Ethereum", "Arbitrum"],
            "dailyRevenue": 12000.5,
            "dailyUserFees": 980000.0
        }))
        .unwrap();

        assert_eq!(fees.daily_revenue, Some(12000.5));
        assert_eq!(fees.daily_holders_revenue, None);
        assert!(fees.chain.is_some());
    }
}
