//! # penelope
//!
//! Crypto research assistant domain: coin catalog matching, CoinGecko market
//! snapshots, news bots, DefiLlama figures and web search, exposed to the
//! agent as tools.
//!
//! ## Turn flow
//!
//! ```text
//! "what is the price of solana"
//!        │
//!        ▼
//!  decision pass ──► get_token_data {coin: "solana"}
//!                          │
//!                          ▼
//!           /coins/list ─► best_matches ─► /coins/{id} + /history
//!                          │
//!                          ▼
//!                 [TokenSnapshot, ...] ──► summarizing pass ──► answer
//! ```

pub mod config;
pub mod defillama;
pub mod error;
pub mod market;
pub mod matcher;
pub mod model;
pub mod news;
pub mod search;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use config::PenelopeConfig;
pub use error::{PenelopeError, Result};
pub use market::{CoinGeckoClient, MarketDataClient};
pub use model::{CatalogEntry, NewsArticle, SupplyModel, TokenSnapshot};
pub use news::{BotNewsClient, NewsClient};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{FeesRevenueTool, LatestNewsTool, LlamaChainsTool, TokenDataTool, WebSearchTool};
}

/// Register every tool the configuration has credentials for
pub fn build_tools(config: &PenelopeConfig) -> Result<ToolRegistry> {
    let market: Arc<dyn MarketDataClient> = Arc::new(CoinGeckoClient::from_config(config)?);
    let llama = Arc::new(defillama::DefiLlamaClient::new(&config.defillama_base_url)?);

    let mut registry = ToolRegistry::new();
    registry.register(tools::TokenDataTool::new(market.clone()));
    registry.register(tools::LlamaChainsTool::new(llama.clone()));
    registry.register(tools::FeesRevenueTool::new(llama));

    if let Some(base_url) = &config.news_base_url {
        let news: Arc<dyn NewsClient> = Arc::new(BotNewsClient::new(base_url)?);
        registry.register(tools::LatestNewsTool::new(market, news));
    }

    if let Some(key) = &config.tavily_api_key {
        registry.register(tools::WebSearchTool::new(Arc::new(search::TavilyClient::new(key)?)));
    }

    tracing::info!(tools = ?registry.names(), "Registered tools");
    Ok(registry)
}

/// Persona for the decision pass
pub const PENELOPE_PROMPT: &str = "You are Penelope, an exceptionally polite and intelligent AI Assistant. \
You specialize in creating detailed analyses, writing concise summaries, conducting thorough information \
searches, and retrieving real-time data efficiently. You focus on cryptocurrencies: prices, market data, \
supply, news and DeFi metrics. Prefer fresh data from your tools over what you remember.";

/// Persona for the summarizing pass
pub const SUMMARY_PROMPT: &str = "You are an AI Assistant, called Penelope. You are very polite and smart, \
an expert in creating analysis and writing summaries. Quote figures exactly as given and mention when data \
could not be fetched.";
