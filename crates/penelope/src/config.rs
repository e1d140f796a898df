//! Configuration
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file by the binary).

use std::path::PathBuf;

use crate::error::{PenelopeError, Result};

const DEFAULT_COINGECKO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";
const DEFAULT_DEFILLAMA_BASE_URL: &str = "https://api.llama.fi";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_PERPLEXITY_MODEL: &str = "llama-3-sonar-large-32k-online";

#[derive(Clone, Debug)]
pub struct PenelopeConfig {
    /// CoinGecko Pro key, sent as `x-cg-pro-api-key`
    pub coingecko_api_key: String,
    pub coingecko_base_url: String,

    /// News-bot service; the news tool is only registered when set
    pub news_base_url: Option<String>,

    pub defillama_base_url: String,

    /// Tavily key; the web search tool is only registered when set
    pub tavily_api_key: Option<String>,

    /// Model for the decision pass
    pub openai_model: String,

    /// Model for the summarizing pass when Perplexity is configured
    pub perplexity_model: String,

    /// Hosted assistant for assistant mode
    pub assistant_id: Option<String>,

    /// Persist history as JSON files here instead of in memory
    pub history_dir: Option<PathBuf>,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl PenelopeConfig {
    pub fn from_env() -> Result<Self> {
        let coingecko_api_key = optional("COINGECKO_API_KEY")
            .ok_or_else(|| PenelopeError::Config("COINGECKO_API_KEY environment variable not set".into()))?;

        Ok(Self {
            coingecko_api_key,
            coingecko_base_url: optional("COINGECKO_BASE_URL").unwrap_or_else(|| DEFAULT_COINGECKO_BASE_URL.into()),
            news_base_url: optional("NEWS_BASE_URL"),
            defillama_base_url: optional("DEFILLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_DEFILLAMA_BASE_URL.into()),
            tavily_api_key: optional("TAVILY_API_KEY"),
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
            perplexity_model: optional("PERPLEXITY_MODEL").unwrap_or_else(|| DEFAULT_PERPLEXITY_MODEL.into()),
            assistant_id: optional("PENELOPE_ASSISTANT_ID"),
            history_dir: optional("PENELOPE_HISTORY_DIR").map(PathBuf::from),
        })
    }
}
