//! CoinGecko Pro API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{CoinDetail, CoinHistory, MarketDataClient};
use crate::config::PenelopeConfig;
use crate::error::{PenelopeError, Result};
use crate::model::CatalogEntry;

const API_KEY_HEADER: &str = "x-cg-pro-api-key";

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &PenelopeConfig) -> Result<Self> {
        Self::new(&config.coingecko_base_url, &config.coingecko_api_key)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PenelopeError::Upstream {
                source_name: "coingecko",
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    #[instrument(skip(self))]
    async fn coin_list(&self) -> Result<Vec<CatalogEntry>> {
        let catalog: Vec<CatalogEntry> = self.get("/coins/list").await?;
        debug!(entries = catalog.len(), "Fetched coin catalog");
        Ok(catalog)
    }

    #[instrument(skip(self))]
    async fn coin(&self, id: &str) -> Result<CoinDetail> {
        self.get(&format!("/coins/{id}")).await
    }

    #[instrument(skip(self))]
    async fn coin_history(&self, id: &str, date: &str) -> Result<CoinHistory> {
        self.get(&format!("/coins/{id}/history?date={date}")).await
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
