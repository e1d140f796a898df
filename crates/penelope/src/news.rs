//! News Bots
//!
//! The news service runs one bot per tracked token, named after the token's
//! symbol. A coin name is resolved to symbols through the catalog, symbols to
//! bots by exact case-insensitive name, and articles are pulled per bot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{PenelopeError, Result};
use crate::market::MarketDataClient;
use crate::matcher::best_match_symbols;
use crate::model::{Bot, BotId, NewsArticle};

/// Articles requested per bot
pub const ARTICLES_PER_BOT: usize = 10;

#[async_trait]
pub trait NewsClient: Send + Sync {
    async fn bots(&self) -> Result<Vec<Bot>>;

    async fn articles(&self, bot_id: &BotId, limit: usize) -> Result<Vec<NewsArticle>>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// HTTP client for the news-bot service
pub struct BotNewsClient {
    client: Client,
    base_url: String,
}

impl BotNewsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<Vec<T>> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PenelopeError::Upstream {
                source_name: "news",
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let envelope: DataEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl NewsClient for BotNewsClient {
    async fn bots(&self) -> Result<Vec<Bot>> {
        self.get("/bots").await
    }

    #[instrument(skip(self))]
    async fn articles(&self, bot_id: &BotId, limit: usize) -> Result<Vec<NewsArticle>> {
        self.get(&format!("/get_articles?bot_id={bot_id}&limit={limit}")).await
    }
}

/// Bots whose name equals `symbol`, ignoring case
fn bots_named<'a>(bots: &'a [Bot], symbol: &str) -> impl Iterator<Item = &'a Bot> {
    let symbol = symbol.to_lowercase();
    bots.iter().filter(move |bot| bot.name.to_lowercase() == symbol)
}

/// Latest articles for `coin`, or `None` when nothing was found
pub async fn latest_news(
    market: &dyn MarketDataClient,
    news: &dyn NewsClient,
    coin: &str,
) -> Result<Option<Vec<NewsArticle>>> {
    let catalog = market.coin_list().await?;
    let symbols = best_match_symbols(coin.trim(), &catalog);
    let bots = news.bots().await?;
    debug!(symbols = ?symbols, bots = bots.len(), "Resolving news bots");

    let mut articles = Vec::new();
    for symbol in &symbols {
        for bot in bots_named(&bots, symbol) {
            match news.articles(&bot.id, ARTICLES_PER_BOT).await {
                Ok(batch) => articles.extend(batch),
                Err(e) => warn!(bot = %bot.id, error = %e, "Failed to fetch articles"),
            }
        }
    }

    Ok((!articles.is_empty()).then_some(articles))
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;

    /// Bots with canned articles; bot ids listed in `failing` return HTTP 500
    #[derive(Default)]
    pub struct StubNews {
        pub bots: Vec<Bot>,
        pub failing: Vec<BotId>,
    }

    impl StubNews {
        pub fn with_bot(mut self, id: i64, name: &str) -> Self {
            self.bots.push(Bot {
                id: BotId::Number(id),
                name: name.into(),
            });
            self
        }
    }

    #[async_trait]
    impl NewsClient for StubNews {
        async fn bots(&self) -> Result<Vec<Bot>> {
            Ok(self.bots.clone())
        }

        async fn articles(&self, bot_id: &BotId, limit: usize) -> Result<Vec<NewsArticle>> {
            if self.failing.contains(bot_id) {
                return Err(PenelopeError::Upstream {
                    source_name: "stub",
                    status: 500,
                    path: format!("/get_articles?bot_id={bot_id}"),
                });
            }
            Ok((0..limit.min(2))
                .map(|n| NewsArticle {
                    content: format!("bot {bot_id} article {n}"),
                    date: "2024-06-01".into(),
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubNews;
    use super::*;
    use crate::market::stub::StubMarket;

    fn market() -> StubMarket {
        StubMarket::default()
            .with_coin("Bitcoin", "btc", "bitcoin", 67000.0, 1.3e12)
            .with_coin("Solana", "sol", "solana", 150.0, 7.0e10)
    }

    #[tokio::test]
    async fn test_bot_names_match_case_insensitively() {
        let news = StubNews::default().with_bot(1, "BTC").with_bot(2, "SOL");

        let articles = latest_news(&market(), &news, "bitcoin").await.unwrap().unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.content.starts_with("bot 1 ")));
    }

    #[tokio::test]
    async fn test_failing_bot_is_skipped() {
        let mut news = StubNews::default().with_bot(1, "sol").with_bot(2, "sol");
        news.failing.push(BotId::Number(1));

        let articles = latest_news(&market(), &news, "solana").await.unwrap().unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles[0].content.starts_with("bot 2 "));
    }

    #[tokio::test]
    async fn test_no_bots_is_none() {
        let news = StubNews::default().with_bot(9, "doge");
        assert!(latest_news(&market(), &news, "bitcoin").await.unwrap().is_none());
    }
}
