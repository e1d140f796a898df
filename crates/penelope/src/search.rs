//! Web Search (Tavily)

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{PenelopeError, Result};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": MAX_RESULTS,
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PenelopeError::Upstream {
                source_name: "tavily",
                status: status.as_u16(),
                path: "/search".into(),
            });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.results)
    }
}
