//! CoinGecko payloads and their normalization into [`TokenSnapshot`]
//!
//! Every field is optional on the wire. A missing, `null` or unreadable
//! field becomes an absent snapshot value instead of failing the fetch.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{Contract, SupplyModel, TokenSnapshot};

/// `null` reads as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// USD figure; values outside `Decimal`'s range or of the wrong type read as `None`
fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_u64().map(Decimal::from))
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
        }
        _ => None,
    })
}

/// Supply count or percentage; non-numeric values read as `None`
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `{"usd": ..., "eur": ..., ...}` keyed by currency
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UsdAmount {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usd: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UsdPercent {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MarketData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: UsdAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: UsdAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_volume: UsdAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fully_diluted_valuation: UsdAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ath: UsdAmount,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ath_change_percentage: UsdPercent,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change_percentage_1y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_supply: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub circulating_supply: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_supply: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub small: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Links {
    #[serde(default, deserialize_with = "null_as_default")]
    pub homepage: Vec<Option<String>>,
}

/// `/coins/{id}`
#[derive(Clone, Debug, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: Description,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: Image,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Links,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Option<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: BTreeMap<String, Option<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_data: MarketData,
}

/// `/coins/{id}/history?date=DD-MM-YYYY`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CoinHistory {
    #[serde(default)]
    pub market_data: Option<HistoricalMarketData>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HistoricalMarketData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: UsdAmount,
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    (!list.is_empty()).then_some(list)
}

impl TokenSnapshot {
    /// Build a snapshot from the current and year-old payloads
    pub fn from_payloads(coin: CoinDetail, history: &CoinHistory) -> Self {
        let market = coin.market_data;

        let percentage_circulating_supply = match (market.circulating_supply, market.total_supply) {
            (Some(circulating), Some(total)) if circulating != 0.0 && total != 0.0 => {
                Some(circulating / total * 100.0)
            }
            _ => None,
        };

        let website = coin
            .links
            .homepage
            .into_iter()
            .flatten()
            .find(|link| !link.trim().is_empty());

        let (chains, categories): (Vec<String>, Vec<String>) = coin
            .categories
            .into_iter()
            .flatten()
            .partition(|tag| tag.to_lowercase().contains("ecosystem"));

        let contracts = coin
            .platforms
            .into_iter()
            .filter_map(|(platform, address)| {
                let address = address.filter(|a| !a.is_empty())?;
                (!platform.is_empty()).then_some(Contract { platform, address })
            })
            .collect();

        let price_a_year_ago = history.market_data.as_ref().and_then(|m| m.current_price.usd);

        Self {
            coingecko_link: format!("https://www.coingecko.com/en/coins/{}", coin.id),
            id: coin.id,
            symbol: coin.symbol,
            logo: coin.image.small,
            description: coin.description.en,
            market_cap_usd: market.market_cap.usd,
            total_volume: market.total_volume.usd,
            website,
            total_supply: market.total_supply,
            circulating_supply: market.circulating_supply,
            percentage_circulating_supply,
            max_supply: market.max_supply,
            supply_model: SupplyModel::from_max_supply(market.max_supply),
            current_price: market.current_price.usd,
            price_a_year_ago,
            price_change_percentage_1y: market.price_change_percentage_1y,
            ath: market.ath.usd,
            ath_change_percentage: market.ath_change_percentage.usd,
            categories: non_empty(categories),
            chains: non_empty(chains),
            contracts,
            fully_diluted_valuation: market.fully_diluted_valuation.usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn bitcoin() -> CoinDetail {
        serde_json::from_value(json!({
            "id": "bitcoin",
            "symbol": "btc",
            "description": {"en": "Bitcoin is the first decentralized cryptocurrency."},
            "image": {"small": "https://assets.coingecko.com/coins/images/1/small/bitcoin.png"},
            "links": {"homepage": ["", "http://www.bitcoin.org", null]},
            "categories": ["Cryptocurrency", "Layer 1 (L1)", "Bitcoin Ecosystem", null],
            "platforms": {"": ""},
            "market_data": {
                "current_price": {"usd": 67000.5, "eur": 61000},
                "market_cap": {"usd": 1320000000000_u64},
                "total_volume": {"usd": 25000000000_u64},
                "fully_diluted_valuation": {"usd": 1407000000000_u64},
                "ath": {"usd": 73738},
                "ath_change_percentage": {"usd": -9.1},
                "price_change_percentage_1y": 120.4,
                "total_supply": 21000000,
                "circulating_supply": 19700000,
                "max_supply": 21000000
            }
        }))
        .unwrap()
    }

    fn history(price: serde_json::Value) -> CoinHistory {
        serde_json::from_value(json!({"market_data": {"current_price": {"usd": price}}})).unwrap()
    }

    #[test]
    fn test_full_payload() {
        let snapshot = TokenSnapshot::from_payloads(bitcoin(), &history(json!(30000)));

        assert_eq!(snapshot.id, "bitcoin");
        assert_eq!(snapshot.current_price, Some(dec!(67000.5)));
        assert_eq!(snapshot.market_cap_usd, Some(dec!(1320000000000)));
        assert_eq!(snapshot.price_a_year_ago, Some(dec!(30000)));
        assert_eq!(snapshot.website.as_deref(), Some("http://www.bitcoin.org"));
        assert_eq!(snapshot.supply_model, SupplyModel::Deflationary);
        assert_eq!(snapshot.chains, Some(vec!["Bitcoin Ecosystem".to_string()]));
        assert_eq!(
            snapshot.categories,
            Some(vec!["Cryptocurrency".to_string(), "Layer 1 (L1)".to_string()])
        );
        assert!(snapshot.contracts.is_empty());
        assert_eq!(snapshot.coingecko_link, "https://www.coingecko.com/en/coins/bitcoin");

        let pct = snapshot.percentage_circulating_supply.unwrap();
        assert!((pct - 93.809_523_8).abs() < 1e-4);
    }

    #[test]
    fn test_missing_max_supply_is_inflationary() {
        let coin: CoinDetail = serde_json::from_value(json!({
            "id": "ethereum",
            "symbol": "eth",
            "market_data": {"max_supply": null, "total_supply": 120000000, "circulating_supply": 0}
        }))
        .unwrap();

        let snapshot = TokenSnapshot::from_payloads(coin, &CoinHistory::default());
        assert_eq!(snapshot.supply_model, SupplyModel::Inflationary);
        assert_eq!(snapshot.percentage_circulating_supply, None);
        assert_eq!(snapshot.price_a_year_ago, None);
        assert_eq!(snapshot.categories, None);
        assert_eq!(snapshot.chains, None);
    }

    #[test]
    fn test_unreadable_fields_are_absent() {
        let coin: CoinDetail = serde_json::from_value(json!({
            "id": "meme",
            "symbol": "meme",
            "categories": null,
            "links": null,
            "image": null,
            "description": null,
            "platforms": null,
            "market_data": {
                "current_price": {"usd": "0.00042"},
                "market_cap": {"usd": 5000000},
                "fully_diluted_valuation": {"usd": 1.2e30},
                "total_volume": null,
                "ath": {"usd": "n/a"},
                "ath_change_percentage": {"usd": null},
                "total_supply": "1000000000",
                "circulating_supply": 400000000
            }
        }))
        .unwrap();

        let snapshot = TokenSnapshot::from_payloads(coin, &history(json!(null)));
        assert_eq!(snapshot.market_cap_usd, Some(dec!(5000000)));
        assert_eq!(snapshot.current_price, Some(dec!(0.00042)));
        assert_eq!(snapshot.fully_diluted_valuation, None);
        assert_eq!(snapshot.total_volume, None);
        assert_eq!(snapshot.ath, None);
        assert_eq!(snapshot.price_a_year_ago, None);
        assert_eq!(snapshot.categories, None);
        assert_eq!(snapshot.website, None);
        assert!(snapshot.contracts.is_empty());
        let pct = snapshot.percentage_circulating_supply.unwrap();
        assert!((pct - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_market_data_is_empty() {
        let coin: CoinDetail =
            serde_json::from_value(json!({"id": "ghost", "symbol": null, "market_data": null})).unwrap();

        let snapshot = TokenSnapshot::from_payloads(coin, &CoinHistory::default());
        assert_eq!(snapshot.symbol, "");
        assert_eq!(snapshot.market_cap_usd, None);
        assert_eq!(snapshot.supply_model, SupplyModel::Inflationary);
    }

    #[test]
    fn test_contracts_skip_blank_entries() {
        let coin: CoinDetail = serde_json::from_value(json!({
            "id": "chainlink",
            "symbol": "link",
            "platforms": {
                "ethereum": "0x514910771af9ca656af840dff83e8264ecf986ca",
                "solana": "",
                "energi": null
            }
        }))
        .unwrap();

        let snapshot = TokenSnapshot::from_payloads(coin, &CoinHistory::default());
        assert_eq!(snapshot.contracts.len(), 1);
        assert_eq!(snapshot.contracts[0].platform, "ethereum");
    }
}
