//! Market Data
//!
//! Abstraction over the market-data provider plus the token lookup flow:
//! catalog, fuzzy match, then one snapshot per candidate.

mod coingecko;
mod payload;

pub use coingecko::CoinGeckoClient;
pub use payload::{CoinDetail, CoinHistory};

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::Result;
use crate::matcher::best_matches;
use crate::model::{CatalogEntry, TokenSnapshot};

/// Snapshots below this market cap are dropped from multi-coin lookups
pub const MARKET_CAP_FLOOR: Decimal = dec!(100000);

/// Market-data client trait (Strategy pattern)
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Full coin catalog
    async fn coin_list(&self) -> Result<Vec<CatalogEntry>>;

    /// Current data for one coin
    async fn coin(&self, id: &str) -> Result<CoinDetail>;

    /// Data for one coin as of `date` (`DD-MM-YYYY`)
    async fn coin_history(&self, id: &str, date: &str) -> Result<CoinHistory>;

    /// Provider name
    fn name(&self) -> &str;
}

/// `DD-MM-YYYY` of the day 365 days before `today`
pub fn year_ago(today: NaiveDate) -> String {
    today
        .checked_sub_days(Days::new(365))
        .unwrap_or(today)
        .format("%d-%m-%Y")
        .to_string()
}

/// Snapshot of one coin. Both requests must succeed; there are no partial
/// snapshots.
pub async fn fetch_token(client: &dyn MarketDataClient, id: &str, today: NaiveDate) -> Result<TokenSnapshot> {
    let coin = client.coin(id).await;
    let history = client.coin_history(id, &year_ago(today)).await;

    Ok(TokenSnapshot::from_payloads(coin?, &history?))
}

/// Resolve `coin` against the catalog and return a snapshot for every
/// candidate above [`MARKET_CAP_FLOOR`]. Per-candidate failures are skipped.
pub async fn token_data(client: &dyn MarketDataClient, coin: &str) -> Result<Vec<TokenSnapshot>> {
    let catalog = client.coin_list().await?;
    let query = coin.trim().to_lowercase();
    let candidates = best_matches(&query, &catalog);
    debug!(query = %query, candidates = ?candidates, "Matched catalog entries");

    let today = Utc::now().date_naive();
    let mut snapshots = Vec::new();

    for id in candidates {
        match fetch_token(client, &id, today).await {
            Ok(snapshot) if snapshot.market_cap_usd.is_some_and(|cap| cap > MARKET_CAP_FLOOR) => {
                snapshots.push(snapshot);
            }
            Ok(_) => debug!(id = %id, "Below market cap floor"),
            Err(e) => warn!(id = %id, error = %e, "Skipping candidate"),
        }
    }

    Ok(snapshots)
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;

    use super::*;
    use crate::error::PenelopeError;

    /// Serves fixed payloads; unknown ids get HTTP 404
    #[derive(Default)]
    pub struct StubMarket {
        pub catalog: Vec<CatalogEntry>,
        pub coins: HashMap<String, serde_json::Value>,
        pub history_missing: Vec<String>,
    }

    impl StubMarket {
        pub fn with_coin(mut self, name: &str, symbol: &str, id: &str, price: f64, market_cap: f64) -> Self {
            self.catalog.push(CatalogEntry::new(id, name, symbol));
            self.coins.insert(
                id.to_string(),
                serde_json::json!({
                    "id": id,
                    "symbol": symbol,
                    "market_data": {
                        "current_price": {"usd": price},
                        "market_cap": {"usd": market_cap},
                        "max_supply": null
                    }
                }),
            );
            self
        }

        fn not_found(path: String) -> PenelopeError {
            PenelopeError::Upstream {
                source_name: "stub",
                status: 404,
                path,
            }
        }
    }

    #[async_trait]
    impl MarketDataClient for StubMarket {
        async fn coin_list(&self) -> Result<Vec<CatalogEntry>> {
            Ok(self.catalog.clone())
        }

        async fn coin(&self, id: &str) -> Result<CoinDetail> {
            let value = self.coins.get(id).cloned().ok_or_else(|| Self::not_found(format!("/coins/{id}")))?;
            Ok(serde_json::from_value(value)?)
        }

        async fn coin_history(&self, id: &str, date: &str) -> Result<CoinHistory> {
            if self.history_missing.iter().any(|m| m == id) || !self.coins.contains_key(id) {
                return Err(Self::not_found(format!("/coins/{id}/history?date={date}")));
            }
            Ok(CoinHistory::default())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubMarket;
    use super::*;

    #[test]
    fn test_year_ago_format() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(year_ago(today), "16-06-2023");
    }

    #[tokio::test]
    async fn test_history_404_fails_the_snapshot() {
        let market = StubMarket {
            history_missing: vec!["solana".into()],
            ..Default::default()
        }
        .with_coin("Solana", "sol", "solana", 150.0, 70_000_000_000.0);

        let today = Utc::now().date_naive();
        assert!(fetch_token(&market, "solana", today).await.is_err());
    }

    #[tokio::test]
    async fn test_token_data_applies_market_cap_floor() {
        // solana-inu is matched first on the way up to the exact hit
        let market = StubMarket::default()
            .with_coin("Solana Inu", "soli", "solana-inu", 0.0001, 5_000.0)
            .with_coin("Solana", "sol", "solana", 150.0, 70_000_000_000.0);

        let snapshots = token_data(&market, "  Solana ").await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, "solana");
        assert_eq!(snapshots[0].current_price, Some(dec!(150)));
    }

    #[tokio::test]
    async fn test_token_data_skips_failed_candidates() {
        let mut market = StubMarket::default().with_coin("Solana", "sol", "solana", 150.0, 70_000_000_000.0);
        market.catalog.insert(0, CatalogEntry::new("solana-ghost", "Solana", "sol"));

        let snapshots = token_data(&market, "solana").await.unwrap();
        assert_eq!(snapshots.len(), 1);
    }
}
