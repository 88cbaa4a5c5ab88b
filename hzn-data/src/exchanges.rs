//! Zasset exchange queries against the exchanges subgraph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::{EntityQuery, TimeSeries};
use crate::subgraph::Subgraph;
use crate::subscribe::{self, ReconnectPolicy, Subscription};

const EXCHANGE_PROPERTIES: &[&str] = &[
    "id",
    "from",
    "gasPrice",
    "fromAmount",
    "fromAmountInUSD",
    "fromCurrencyKey",
    "toCurrencyKey",
    "toAddress",
    "toAmount",
    "toAmountInUSD",
    "feesInUSD",
    "block",
    "timestamp",
];

const TOTAL_PROPERTIES: &[&str] = &[
    "id",
    "trades",
    "exchangers",
    "exchangeUSDTally",
    "totalFeesGeneratedInUSD",
];

/// A single zasset exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub gas_price: f64,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub hash: String,
    pub from_address: String,
    pub from_amount: f64,
    pub from_currency_key: String,
    pub from_currency_key_bytes: String,
    #[serde(rename = "fromAmountInUSD")]
    pub from_amount_in_usd: f64,
    pub to_amount: f64,
    #[serde(rename = "toAmountInUSD")]
    pub to_amount_in_usd: f64,
    pub to_currency_key: String,
    pub to_currency_key_bytes: String,
    pub to_address: String,
    #[serde(rename = "feesInUSD")]
    pub fees_in_usd: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExchange {
    id: String,
    from: String,
    #[serde(deserialize_with = "de::gwei")]
    gas_price: f64,
    #[serde(deserialize_with = "de::wei")]
    from_amount: f64,
    #[serde(rename = "fromAmountInUSD", deserialize_with = "de::wei")]
    from_amount_in_usd: f64,
    from_currency_key: String,
    to_currency_key: String,
    to_address: String,
    #[serde(deserialize_with = "de::wei")]
    to_amount: f64,
    #[serde(rename = "toAmountInUSD", deserialize_with = "de::wei")]
    to_amount_in_usd: f64,
    #[serde(rename = "feesInUSD", deserialize_with = "de::wei")]
    fees_in_usd: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawExchange> for Exchange {
    fn from(raw: RawExchange) -> Self {
        Self {
            gas_price: raw.gas_price,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            hash: de::hash_from_id(&raw.id),
            from_address: raw.from,
            from_amount: raw.from_amount,
            from_currency_key: de::hex_to_ascii(&raw.from_currency_key),
            from_currency_key_bytes: raw.from_currency_key,
            from_amount_in_usd: raw.from_amount_in_usd,
            to_amount: raw.to_amount,
            to_amount_in_usd: raw.to_amount_in_usd,
            to_currency_key: de::hex_to_ascii(&raw.to_currency_key),
            to_currency_key_bytes: raw.to_currency_key,
            to_address: raw.to_address,
            fees_in_usd: raw.fees_in_usd,
        }
    }
}

/// Lifetime exchange totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTotals {
    pub trades: u64,
    pub exchangers: u64,
    #[serde(rename = "exchangeUSDTally")]
    pub exchange_usd_tally: f64,
    #[serde(rename = "totalFeesGeneratedInUSD")]
    pub total_fees_generated_in_usd: f64,
}

/// Exchange totals for one time series period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAggregate {
    pub id: String,
    pub timestamp: i64,
    pub trades: u64,
    pub exchangers: u64,
    #[serde(rename = "exchangeUSDTally")]
    pub exchange_usd_tally: f64,
    #[serde(rename = "totalFeesGeneratedInUSD")]
    pub total_fees_generated_in_usd: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTotal {
    #[serde(default)]
    id: Option<String>,
    #[serde(deserialize_with = "de::uint")]
    trades: u64,
    #[serde(deserialize_with = "de::uint")]
    exchangers: u64,
    #[serde(rename = "exchangeUSDTally", deserialize_with = "de::wei")]
    exchange_usd_tally: f64,
    #[serde(rename = "totalFeesGeneratedInUSD", deserialize_with = "de::wei")]
    total_fees_generated_in_usd: f64,
}

impl From<RawTotal> for ExchangeTotals {
    fn from(raw: RawTotal) -> Self {
        Self {
            trades: raw.trades,
            exchangers: raw.exchangers,
            exchange_usd_tally: raw.exchange_usd_tally,
            total_fees_generated_in_usd: raw.total_fees_generated_in_usd,
        }
    }
}

impl RawTotal {
    fn into_aggregate(self, series: TimeSeries) -> ExchangeAggregate {
        let id = self.id.unwrap_or_default();
        let period: i64 = id.parse().unwrap_or(0);
        ExchangeAggregate {
            timestamp: period * series.period_secs() * 1000,
            id,
            trades: self.trades,
            exchangers: self.exchangers,
            exchange_usd_tally: self.exchange_usd_tally,
            total_fees_generated_in_usd: self.total_fees_generated_in_usd,
        }
    }
}

/// Whether a settlement gave value back to or took it from the exchanger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Rebate,
    Reclaim,
}

impl SettlementKind {
    fn entity(self) -> &'static str {
        match self {
            SettlementKind::Rebate => "exchangeRebates",
            SettlementKind::Reclaim => "exchangeReclaims",
        }
    }
}

/// A post-exchange rebate or reclaim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub gas_price: f64,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub hash: String,
    pub account: String,
    pub amount: f64,
    #[serde(rename = "amountInUSD")]
    pub amount_in_usd: f64,
    pub currency_key: String,
    pub currency_key_bytes: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettlement {
    id: String,
    account: String,
    #[serde(deserialize_with = "de::wei")]
    amount: f64,
    #[serde(rename = "amountInUSD", deserialize_with = "de::wei")]
    amount_in_usd: f64,
    currency_key: String,
    #[serde(deserialize_with = "de::gwei")]
    gas_price: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawSettlement> for Settlement {
    fn from(raw: RawSettlement) -> Self {
        Self {
            gas_price: raw.gas_price,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            hash: de::hash_from_id(&raw.id),
            account: raw.account,
            amount: raw.amount,
            amount_in_usd: raw.amount_in_usd,
            currency_key: de::hex_to_ascii(&raw.currency_key),
            currency_key_bytes: raw.currency_key,
        }
    }
}

/// Filters for [`since`].
#[derive(Debug, Clone, Default)]
pub struct SinceOptions {
    /// Oldest timestamp to include, in seconds.
    pub min_timestamp: Option<i64>,
    pub min_block: Option<u64>,
    pub max_block: Option<u64>,
    pub from_address: Option<String>,
    pub max: Option<u32>,
}

/// Filters for [`settlements`].
#[derive(Debug, Clone, Default)]
pub struct SettlementOptions {
    /// Oldest timestamp to include, in seconds.
    pub min_timestamp: Option<i64>,
    pub min_block: Option<u64>,
    pub account: Option<String>,
    pub max: Option<u32>,
}

pub(crate) fn since_query(opts: &SinceOptions) -> EntityQuery {
    EntityQuery::new("synthExchanges")
        .order_by("timestamp")
        .filter("timestamp_gte", opts.min_timestamp)
        .filter("block_gte", opts.min_block)
        .filter("block_lte", opts.max_block)
        .filter("from", opts.from_address.clone())
        .properties(EXCHANGE_PROPERTIES)
}

pub(crate) fn settlement_query(kind: SettlementKind, opts: &SettlementOptions) -> EntityQuery {
    EntityQuery::new(kind.entity())
        .order_by("timestamp")
        .filter("timestamp_gte", opts.min_timestamp)
        .filter("block_gte", opts.min_block)
        .filter("account", opts.account.clone())
        .properties(&[
            "id",
            "account",
            "amount",
            "amountInUSD",
            "currencyKey",
            "gasPrice",
            "block",
            "timestamp",
        ])
}

fn aggregate_entity(series: TimeSeries) -> &'static str {
    match series {
        TimeSeries::FifteenMinutes => "fifteenMinuteTotals",
        TimeSeries::OneDay => "dailyTotals",
    }
}

/// Lifetime totals across all exchanges.
pub async fn total(client: &GraphClient) -> Result<ExchangeTotals> {
    let query = EntityQuery::new("totals").properties(TOTAL_PROPERTIES);
    let raw: RawTotal = client.first(Subgraph::Exchanges, &query).await?;
    Ok(raw.into())
}

/// Per-period exchange totals, newest first.
pub async fn aggregate(
    client: &GraphClient,
    series: TimeSeries,
    max: Option<u32>,
) -> Result<Vec<ExchangeAggregate>> {
    let query = EntityQuery::new(aggregate_entity(series))
        .order_by("id")
        .properties(TOTAL_PROPERTIES);
    let raw: Vec<RawTotal> = client.page_results(Subgraph::Exchanges, &query, max).await?;
    Ok(raw.into_iter().map(|r| r.into_aggregate(series)).collect())
}

/// Exchanges newer than the given filters, newest first.
pub async fn since(client: &GraphClient, opts: SinceOptions) -> Result<Vec<Exchange>> {
    let raw: Vec<RawExchange> = client
        .page_results(Subgraph::Exchanges, &since_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(Exchange::from).collect())
}

/// Rebates or reclaims, newest first.
pub async fn settlements(
    client: &GraphClient,
    kind: SettlementKind,
    opts: SettlementOptions,
) -> Result<Vec<Settlement>> {
    let raw: Vec<RawSettlement> = client
        .page_results(Subgraph::Exchanges, &settlement_query(kind, &opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(Settlement::from).collect())
}

pub async fn rebates(client: &GraphClient, opts: SettlementOptions) -> Result<Vec<Settlement>> {
    settlements(client, SettlementKind::Rebate, opts).await
}

pub async fn reclaims(client: &GraphClient, opts: SettlementOptions) -> Result<Vec<Settlement>> {
    settlements(client, SettlementKind::Reclaim, opts).await
}

/// Live feed of the most recent exchange.
pub fn observe(client: &GraphClient, policy: ReconnectPolicy) -> Subscription<Exchange> {
    let query = since_query(&SinceOptions::default());
    subscribe::subscribe::<RawExchange, Exchange>(
        &client.endpoints().ws(Subgraph::Exchanges),
        &query,
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_exchange() -> serde_json::Value {
        json!({
            "id": "0xdeadbeef-3",
            "from": "0xa11ce",
            "gasPrice": "5000000000",
            "fromAmount": "2000000000000000000",
            "fromAmountInUSD": "2000000000000000000",
            "fromCurrencyKey": de::ascii_to_bytes32("zUSD"),
            "toCurrencyKey": de::ascii_to_bytes32("zBTC"),
            "toAddress": "0xa11ce",
            "toAmount": "100000000000000",
            "toAmountInUSD": "1990000000000000000",
            "feesInUSD": "10000000000000000",
            "block": "4200",
            "timestamp": "1700000000"
        })
    }

    #[test]
    fn test_exchange_decoding() {
        let raw: RawExchange = serde_json::from_value(raw_exchange()).unwrap();
        let exchange = Exchange::from(raw);

        assert_eq!(exchange.hash, "0xdeadbeef");
        assert_eq!(exchange.gas_price, 5.0);
        assert_eq!(exchange.from_amount_in_usd, 2.0);
        assert_eq!(exchange.fees_in_usd, 0.01);
        assert_eq!(exchange.from_currency_key, "zUSD");
        assert_eq!(exchange.to_currency_key, "zBTC");
        assert!(exchange.from_currency_key_bytes.starts_with("0x7a555344"));
        assert_eq!(exchange.timestamp, 1_700_000_000_000);
        assert_eq!(exchange.date.timestamp(), 1_700_000_000);
        assert_eq!(exchange.block, 4200);
    }

    #[test]
    fn test_exchange_serializes_camel_case() {
        let raw: RawExchange = serde_json::from_value(raw_exchange()).unwrap();
        let value = serde_json::to_value(Exchange::from(raw)).unwrap();
        assert!(value.get("fromAmountInUSD").is_some());
        assert!(value.get("fromCurrencyKeyBytes").is_some());
        assert!(value.get("feesInUSD").is_some());
        assert_eq!(value["fromAddress"], "0xa11ce");
    }

    #[test]
    fn test_since_query() {
        let query = since_query(&SinceOptions {
            min_timestamp: Some(1_700_000_000),
            from_address: Some("0xa11ce".into()),
            ..Default::default()
        });
        let rendered = query.render(1000, 0);
        assert!(rendered.starts_with("{ synthExchanges(first: 1000, skip: 0, orderBy: timestamp"));
        assert!(rendered.contains("where: {timestamp_gte: 1700000000, from: \"0xa11ce\"}"));
        assert!(!rendered.contains("block_gte"));
    }

    #[test]
    fn test_settlement_query_entities() {
        let opts = SettlementOptions::default();
        assert_eq!(
            settlement_query(SettlementKind::Rebate, &opts).entity(),
            "exchangeRebates"
        );
        assert_eq!(
            settlement_query(SettlementKind::Reclaim, &opts).entity(),
            "exchangeReclaims"
        );
    }

    #[test]
    fn test_aggregate_timestamp() {
        let raw: RawTotal = serde_json::from_value(json!({
            "id": "19675",
            "trades": "12",
            "exchangers": 4,
            "exchangeUSDTally": "5000000000000000000000",
            "totalFeesGeneratedInUSD": "15000000000000000000"
        }))
        .unwrap();
        let agg = raw.into_aggregate(TimeSeries::OneDay);
        assert_eq!(agg.timestamp, 19_675 * 86_400 * 1000);
        assert_eq!(agg.trades, 12);
        assert_eq!(agg.exchange_usd_tally, 5000.0);
        assert_eq!(agg.total_fees_generated_in_usd, 15.0);
    }

    #[test]
    fn test_settlement_decoding() {
        let raw: RawSettlement = serde_json::from_value(json!({
            "id": "0xfeed-1",
            "account": "0xb0b",
            "amount": "500000000000000000",
            "amountInUSD": "750000000000000000",
            "currencyKey": de::ascii_to_bytes32("zETH"),
            "gasPrice": "1000000000",
            "block": 10,
            "timestamp": 1600000000
        }))
        .unwrap();
        let s = Settlement::from(raw);
        assert_eq!(s.currency_key, "zETH");
        assert_eq!(s.amount_in_usd, 0.75);
        assert_eq!(s.hash, "0xfeed");
    }
}
