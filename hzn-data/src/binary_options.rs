//! Binary option market queries.

use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// Transaction type recorded for a bid.
pub const BID: &str = "bid";

/// A binary option market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub address: String,
    pub timestamp: i64,
    pub creator: String,
    pub currency_key: String,
    pub strike_price: f64,
    pub bidding_end_date: i64,
    pub maturity_date: i64,
    pub expiry_date: i64,
    pub is_open: bool,
    pub long_price: f64,
    pub short_price: f64,
    pub pool_size: f64,
    pub result: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarket {
    id: String,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    creator: String,
    currency_key: String,
    #[serde(deserialize_with = "de::wei")]
    strike_price: f64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    bidding_end_date: i64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    maturity_date: i64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    expiry_date: i64,
    is_open: bool,
    #[serde(deserialize_with = "de::wei")]
    long_price: f64,
    #[serde(deserialize_with = "de::wei")]
    short_price: f64,
    #[serde(deserialize_with = "de::wei")]
    pool_size: f64,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

impl From<RawMarket> for Market {
    fn from(raw: RawMarket) -> Self {
        let result = raw.result.and_then(|r| match r {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        Self {
            address: raw.id,
            timestamp: raw.timestamp,
            creator: raw.creator,
            currency_key: de::hex_to_ascii(&raw.currency_key),
            strike_price: raw.strike_price,
            bidding_end_date: raw.bidding_end_date,
            maturity_date: raw.maturity_date,
            expiry_date: raw.expiry_date,
            is_open: raw.is_open,
            long_price: raw.long_price,
            short_price: raw.short_price,
            pool_size: raw.pool_size,
            result,
        }
    }
}

/// A bid, refund, claim or exercise on a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTransaction {
    pub hash: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: String,
    pub currency_key: Option<String>,
    /// `long` or `short`.
    pub side: String,
    pub amount: f64,
    pub market: String,
    pub fee: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptionTransaction {
    id: String,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    #[serde(rename = "type")]
    kind: String,
    account: String,
    #[serde(default)]
    currency_key: Option<String>,
    #[serde(deserialize_with = "de::uint")]
    side: u64,
    #[serde(deserialize_with = "de::wei")]
    amount: f64,
    market: String,
    #[serde(default, deserialize_with = "de::opt_wei")]
    fee: Option<f64>,
}

impl From<RawOptionTransaction> for OptionTransaction {
    fn from(raw: RawOptionTransaction) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            timestamp: raw.timestamp,
            kind: raw.kind,
            account: raw.account,
            currency_key: raw.currency_key.as_deref().map(de::hex_to_ascii),
            side: if raw.side == 0 { "long" } else { "short" }.to_string(),
            amount: raw.amount,
            market: raw.market,
            fee: raw.fee,
        }
    }
}

/// Option prices on a market at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalOptionPrice {
    pub timestamp: i64,
    pub long_price: f64,
    pub short_price: f64,
    pub pool_size: f64,
    pub market: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHistoricalOptionPrice {
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    #[serde(deserialize_with = "de::wei")]
    long_price: f64,
    #[serde(deserialize_with = "de::wei")]
    short_price: f64,
    #[serde(deserialize_with = "de::wei")]
    pool_size: f64,
    market: String,
}

impl From<RawHistoricalOptionPrice> for HistoricalOptionPrice {
    fn from(raw: RawHistoricalOptionPrice) -> Self {
        Self {
            timestamp: raw.timestamp,
            long_price: raw.long_price,
            short_price: raw.short_price,
            pool_size: raw.pool_size,
            market: raw.market,
        }
    }
}

/// Filters for [`markets`].
#[derive(Debug, Clone, Default)]
pub struct MarketOptions {
    pub creator: Option<String>,
    pub is_open: Option<bool>,
    /// Seconds.
    pub min_timestamp: Option<i64>,
    /// Seconds.
    pub max_timestamp: Option<i64>,
    pub max: Option<u32>,
}

/// Filters for [`option_transactions`].
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    pub market: Option<String>,
    pub account: Option<String>,
    pub kind: Option<String>,
    pub max: Option<u32>,
}

/// Filters for [`historical_option_price`].
#[derive(Debug, Clone, Default)]
pub struct PriceOptions {
    pub market: Option<String>,
    /// Seconds.
    pub min_timestamp: Option<i64>,
    /// Seconds.
    pub max_timestamp: Option<i64>,
    pub max: Option<u32>,
}

pub(crate) fn markets_query(opts: &MarketOptions) -> EntityQuery {
    EntityQuery::new("markets")
        .order_by("timestamp")
        .filter("creator", opts.creator.clone())
        .filter("isOpen", opts.is_open)
        .filter("timestamp_gte", opts.min_timestamp)
        .filter("timestamp_lte", opts.max_timestamp)
        .properties(&[
            "id",
            "timestamp",
            "creator",
            "currencyKey",
            "strikePrice",
            "biddingEndDate",
            "maturityDate",
            "expiryDate",
            "isOpen",
            "longPrice",
            "shortPrice",
            "poolSize",
            "result",
        ])
}

pub(crate) fn transactions_query(opts: &TransactionOptions) -> EntityQuery {
    EntityQuery::new("optionTransactions")
        .order_by("timestamp")
        .filter("market", opts.market.clone())
        .filter("account", opts.account.clone())
        .filter("type", opts.kind.clone())
        .properties(&[
            "id",
            "timestamp",
            "type",
            "account",
            "currencyKey",
            "side",
            "amount",
            "market",
            "fee",
        ])
}

/// Markets, newest first.
pub async fn markets(client: &GraphClient, opts: MarketOptions) -> Result<Vec<Market>> {
    let raw: Vec<RawMarket> = client
        .page_results(Subgraph::BinaryOptions, &markets_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(Market::from).collect())
}

/// Option transactions, newest first.
pub async fn option_transactions(
    client: &GraphClient,
    opts: TransactionOptions,
) -> Result<Vec<OptionTransaction>> {
    let raw: Vec<RawOptionTransaction> = client
        .page_results(Subgraph::BinaryOptions, &transactions_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(OptionTransaction::from).collect())
}

/// Addresses of the markets an account has bid on, most recent bid first.
pub async fn markets_bid_on(
    client: &GraphClient,
    account: Option<String>,
    max: Option<u32>,
) -> Result<Vec<String>> {
    let bids = option_transactions(
        client,
        TransactionOptions {
            account,
            kind: Some(BID.to_string()),
            max,
            ..Default::default()
        },
    )
    .await?;
    Ok(distinct_markets(&bids))
}

fn distinct_markets(transactions: &[OptionTransaction]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    transactions
        .iter()
        .filter(|tx| tx.kind == BID)
        .filter(|tx| seen.insert(tx.market.as_str()))
        .map(|tx| tx.market.clone())
        .collect()
}

/// Price history of a market, newest first.
pub async fn historical_option_price(
    client: &GraphClient,
    opts: PriceOptions,
) -> Result<Vec<HistoricalOptionPrice>> {
    let query = EntityQuery::new("historicalOptionPrices")
        .order_by("timestamp")
        .filter("market", opts.market.clone())
        .filter("timestamp_gte", opts.min_timestamp)
        .filter("timestamp_lte", opts.max_timestamp)
        .properties(&[
            "id",
            "timestamp",
            "longPrice",
            "shortPrice",
            "poolSize",
            "market",
        ]);
    let raw: Vec<RawHistoricalOptionPrice> = client
        .page_results(Subgraph::BinaryOptions, &query, opts.max)
        .await?;
    Ok(raw.into_iter().map(HistoricalOptionPrice::from).collect())
}
