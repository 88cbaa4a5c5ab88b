//! Exchange rate queries against the rates subgraph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::{EntityQuery, TimeSeries};
use crate::subgraph::Subgraph;
use crate::subscribe::{self, ReconnectPolicy, Subscription};

const DAY_SECS: i64 = 86_400;

/// Average HZN price over one time series period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAggregate {
    pub id: String,
    pub average_price: f64,
    pub count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPriceAggregate {
    id: String,
    #[serde(deserialize_with = "de::wei")]
    average_price: f64,
    #[serde(deserialize_with = "de::uint")]
    count: u64,
}

impl From<RawPriceAggregate> for PriceAggregate {
    fn from(raw: RawPriceAggregate) -> Self {
        Self {
            id: raw.id,
            average_price: raw.average_price,
            count: raw.count,
        }
    }
}

/// An oracle rate update for one zasset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    pub block: u64,
    pub zasset: String,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub hash: String,
    pub rate: f64,
}

#[derive(Deserialize)]
struct RawRateUpdate {
    id: String,
    zasset: String,
    #[serde(deserialize_with = "de::wei")]
    rate: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawRateUpdate> for RateUpdate {
    fn from(raw: RawRateUpdate) -> Self {
        Self {
            block: raw.block,
            zasset: raw.zasset,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            hash: de::hash_from_id(&raw.id),
            rate: raw.rate,
        }
    }
}

/// 24 hour change in a zasset's rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateChange {
    pub zasset: String,
    pub rate: f64,
    pub previous_rate: Option<f64>,
    /// Fractional change, `0.05` = +5%.
    pub change: f64,
}

impl RateChange {
    fn between(zasset: String, rate: f64, previous_rate: Option<f64>) -> Self {
        let change = match previous_rate {
            Some(prev) if prev != 0.0 => (rate - prev) / prev,
            _ => 0.0,
        };
        Self {
            zasset,
            rate,
            previous_rate,
            change,
        }
    }
}

#[derive(Deserialize)]
struct RawLatestRate {
    id: String,
}

/// Filters for [`updates`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub min_block: Option<u64>,
    pub max_block: Option<u64>,
    /// Seconds.
    pub min_timestamp: Option<i64>,
    /// Seconds.
    pub max_timestamp: Option<i64>,
    pub zasset: Option<String>,
    pub max: Option<u32>,
}

const UPDATE_PROPERTIES: &[&str] = &["id", "zasset", "rate", "block", "timestamp"];

pub(crate) fn updates_query(opts: &UpdateOptions) -> EntityQuery {
    EntityQuery::new("rateUpdates")
        .order_by("timestamp")
        .filter("zasset", opts.zasset.clone())
        .filter("block_gte", opts.min_block)
        .filter("block_lte", opts.max_block)
        .filter("timestamp_gte", opts.min_timestamp)
        .filter("timestamp_lte", opts.max_timestamp)
        .properties(UPDATE_PROPERTIES)
}

fn aggregate_entity(series: TimeSeries) -> &'static str {
    match series {
        TimeSeries::FifteenMinutes => "fifteenMinuteHZNPrices",
        TimeSeries::OneDay => "dailyHZNPrices",
    }
}

/// Average HZN price per period, newest first.
pub async fn hzn_aggregate(
    client: &GraphClient,
    series: TimeSeries,
    max: Option<u32>,
) -> Result<Vec<PriceAggregate>> {
    let query = EntityQuery::new(aggregate_entity(series))
        .order_by("id")
        .properties(&["id", "averagePrice", "count"]);
    let raw: Vec<RawPriceAggregate> = client.page_results(Subgraph::Rates, &query, max).await?;
    Ok(raw.into_iter().map(PriceAggregate::from).collect())
}

/// Rate updates, newest first.
pub async fn updates(client: &GraphClient, opts: UpdateOptions) -> Result<Vec<RateUpdate>> {
    let raw: Vec<RawRateUpdate> = client
        .page_results(Subgraph::Rates, &updates_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(RateUpdate::from).collect())
}

async fn latest_update(client: &GraphClient, opts: UpdateOptions) -> Result<Option<RateUpdate>> {
    let mut found = updates(
        client,
        UpdateOptions {
            max: Some(1),
            ..opts
        },
    )
    .await?;
    Ok(if found.is_empty() {
        None
    } else {
        Some(found.swap_remove(0))
    })
}

/// Rate change over the 24 hours preceding `from_block` (or now).
///
/// With no zassets given, every zasset with a known latest rate is used,
/// up to `max`.
pub async fn daily_rate_change(
    client: &GraphClient,
    zassets: &[String],
    from_block: Option<u64>,
    max: Option<u32>,
) -> Result<Vec<RateChange>> {
    let keys = if zassets.is_empty() {
        let query = EntityQuery::new("latestRates").properties(&["id"]);
        let raw: Vec<RawLatestRate> = client.page_results(Subgraph::Rates, &query, max).await?;
        raw.into_iter().map(|r| r.id).collect()
    } else {
        zassets.to_vec()
    };

    let mut changes = Vec::with_capacity(keys.len());
    for zasset in keys {
        let current = latest_update(
            client,
            UpdateOptions {
                zasset: Some(zasset.clone()),
                max_block: from_block,
                ..Default::default()
            },
        )
        .await?;

        let Some(current) = current else {
            debug!(%zasset, "no rate updates found");
            continue;
        };

        let previous = latest_update(
            client,
            UpdateOptions {
                zasset: Some(zasset.clone()),
                max_timestamp: Some(current.timestamp / 1000 - DAY_SECS),
                ..Default::default()
            },
        )
        .await?;

        changes.push(RateChange::between(
            zasset,
            current.rate,
            previous.map(|p| p.rate),
        ));
    }

    Ok(changes)
}

/// Live feed of the most recent rate update.
pub fn observe(client: &GraphClient, policy: ReconnectPolicy) -> Subscription<RateUpdate> {
    let query = updates_query(&UpdateOptions::default());
    subscribe::subscribe::<RawRateUpdate, RateUpdate>(
        &client.endpoints().ws(Subgraph::Rates),
        &query,
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_change() {
        let up = RateChange::between("zBTC".into(), 110.0, Some(100.0));
        assert!((up.change - 0.1).abs() < 1e-12);

        let none = RateChange::between("zETH".into(), 10.0, None);
        assert_eq!(none.change, 0.0);

        let zero = RateChange::between("zXAU".into(), 10.0, Some(0.0));
        assert_eq!(zero.change, 0.0);
    }

    #[test]
    fn test_updates_query() {
        let rendered = updates_query(&UpdateOptions {
            zasset: Some("zBTC".into()),
            min_block: Some(5),
            max_timestamp: Some(1_600_000_000),
            ..Default::default()
        })
        .render(10, 0);
        assert!(rendered.contains(
            "where: {zasset: \"zBTC\", block_gte: 5, timestamp_lte: 1600000000}"
        ));
    }

    #[test]
    fn test_rate_update_decoding() {
        let raw: RawRateUpdate = serde_json::from_value(json!({
            "id": "0xaaa-4",
            "zasset": "zBTC",
            "rate": "30000000000000000000000",
            "block": "77",
            "timestamp": "1600000000"
        }))
        .unwrap();
        let update = RateUpdate::from(raw);
        assert_eq!(update.rate, 30000.0);
        assert_eq!(update.hash, "0xaaa");
        assert_eq!(update.timestamp, 1_600_000_000_000);
    }

    #[test]
    fn test_aggregate_entities() {
        assert_eq!(aggregate_entity(TimeSeries::OneDay), "dailyHZNPrices");
        assert_eq!(
            aggregate_entity(TimeSeries::FifteenMinutes),
            "fifteenMinuteHZNPrices"
        );
    }
}
