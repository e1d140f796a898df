//! Domain Models
//!
//! Uses `rust_decimal` for USD figures. Supply counts and percentages are
//! plain `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of the market-data catalog (`/coins/list`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Provider identifier (e.g., "solana")
    pub id: String,

    /// Display name (e.g., "Solana")
    pub name: String,

    /// Ticker symbol, lowercase as the provider returns it (e.g., "sol")
    pub symbol: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Whether the token has a hard supply cap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyModel {
    Inflationary,
    Deflationary,
}

impl SupplyModel {
    /// `Deflationary` exactly when a maximum supply is published
    pub const fn from_max_supply(max_supply: Option<f64>) -> Self {
        if max_supply.is_some() {
            Self::Deflationary
        } else {
            Self::Inflationary
        }
    }
}

impl std::fmt::Display for SupplyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inflationary => write!(f, "Inflationary"),
            Self::Deflationary => write!(f, "Deflationary"),
        }
    }
}

/// Token contract on one platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub platform: String,
    pub address: String,
}

/// Point-in-time market data for one token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub id: String,
    pub symbol: String,
    pub logo: Option<String>,
    pub description: Option<String>,

    /// Market capitalization in USD
    pub market_cap_usd: Option<Decimal>,

    /// 24h trading volume in USD
    pub total_volume: Option<Decimal>,

    /// First non-blank homepage link
    pub website: Option<String>,

    pub total_supply: Option<f64>,
    pub circulating_supply: Option<f64>,

    /// `circulating / total * 100`, absent when either is missing or zero
    pub percentage_circulating_supply: Option<f64>,

    pub max_supply: Option<f64>,
    pub supply_model: SupplyModel,

    pub current_price: Option<Decimal>,
    pub price_a_year_ago: Option<Decimal>,
    pub price_change_percentage_1y: Option<f64>,

    /// All-time high in USD
    pub ath: Option<Decimal>,
    pub ath_change_percentage: Option<f64>,

    pub coingecko_link: String,

    /// Category tags that are not ecosystems
    pub categories: Option<Vec<String>>,

    /// Ecosystem tags
    pub chains: Option<Vec<String>>,

    pub contracts: Vec<Contract>,
    pub fully_diluted_valuation: Option<Decimal>,
}

/// One news article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub content: String,
    pub date: String,
}

/// News bot identifier; the service has used both numbers and strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for BotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A news bot, one per tracked token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_model() {
        assert_eq!(SupplyModel::from_max_supply(Some(21_000_000.0)), SupplyModel::Deflationary);
        assert_eq!(SupplyModel::from_max_supply(None), SupplyModel::Inflationary);
        assert_eq!(SupplyModel::Deflationary.to_string(), "Deflationary");
    }

    #[test]
    fn test_bot_ids_accept_numbers_and_strings() {
        let bots: Vec<Bot> = serde_json::from_str(r#"[{"id": 1, "name": "btc"}, {"id": "7f", "name": "sol"}]"#).unwrap();
        assert_eq!(bots[0].id.to_string(), "1");
        assert_eq!(bots[1].id.to_string(), "7f");
    }
}
