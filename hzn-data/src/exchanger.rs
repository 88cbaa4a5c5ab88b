//! Exchanger settlement queries.

use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// An exchange entry settled after its waiting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeEntrySettled {
    pub hash: String,
    pub from: String,
    pub src: String,
    pub amount: f64,
    pub dest: String,
    pub reclaim: f64,
    pub rebate: f64,
    pub src_round_id_at_period_end: u64,
    pub dest_round_id_at_period_end: u64,
    pub exchange_timestamp: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExchangeEntrySettled {
    id: String,
    from: String,
    src: String,
    #[serde(deserialize_with = "de::wei")]
    amount: f64,
    dest: String,
    #[serde(deserialize_with = "de::wei")]
    reclaim: f64,
    #[serde(deserialize_with = "de::wei")]
    rebate: f64,
    #[serde(deserialize_with = "de::uint")]
    src_round_id_at_period_end: u64,
    #[serde(deserialize_with = "de::uint")]
    dest_round_id_at_period_end: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    exchange_timestamp: i64,
}

impl From<RawExchangeEntrySettled> for ExchangeEntrySettled {
    fn from(raw: RawExchangeEntrySettled) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            from: raw.from,
            src: de::hex_to_ascii(&raw.src),
            amount: raw.amount,
            dest: de::hex_to_ascii(&raw.dest),
            reclaim: raw.reclaim,
            rebate: raw.rebate,
            src_round_id_at_period_end: raw.src_round_id_at_period_end,
            dest_round_id_at_period_end: raw.dest_round_id_at_period_end,
            exchange_timestamp: raw.exchange_timestamp,
        }
    }
}

pub(crate) fn entries_settled_query(from: Option<&str>) -> EntityQuery {
    EntityQuery::new("exchangeEntrySettleds")
        .order_by("exchangeTimestamp")
        .filter("from", from)
        .properties(&[
            "id",
            "from",
            "src",
            "amount",
            "dest",
            "reclaim",
            "rebate",
            "srcRoundIdAtPeriodEnd",
            "destRoundIdAtPeriodEnd",
            "exchangeTimestamp",
        ])
}

/// Settled exchange entries, newest first.
pub async fn exchange_entries_settled(
    client: &GraphClient,
    from: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<ExchangeEntrySettled>> {
    let raw: Vec<RawExchangeEntrySettled> = client
        .page_results(Subgraph::Exchanger, &entries_settled_query(from), max)
        .await?;
    Ok(raw.into_iter().map(ExchangeEntrySettled::from).collect())
}
