//! Limit order queries.

use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// A limit order placed with the order book contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrder {
    pub id: String,
    pub hash: String,
    pub account: String,
    pub source_currency_key: String,
    pub source_amount: f64,
    pub destination_currency_key: String,
    pub min_destination_amount: f64,
    pub execution_fee: f64,
    pub deposit: f64,
    pub status: String,
    pub timestamp: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLimitOrder {
    id: String,
    hash: String,
    account: String,
    source_currency_key: String,
    #[serde(deserialize_with = "de::wei")]
    source_amount: f64,
    destination_currency_key: String,
    #[serde(deserialize_with = "de::wei")]
    min_destination_amount: f64,
    #[serde(deserialize_with = "de::wei")]
    execution_fee: f64,
    #[serde(deserialize_with = "de::wei")]
    deposit: f64,
    status: String,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawLimitOrder> for LimitOrder {
    fn from(raw: RawLimitOrder) -> Self {
        Self {
            id: raw.id,
            hash: raw.hash,
            account: raw.account,
            source_currency_key: de::hex_to_ascii(&raw.source_currency_key),
            source_amount: raw.source_amount,
            destination_currency_key: de::hex_to_ascii(&raw.destination_currency_key),
            min_destination_amount: raw.min_destination_amount,
            execution_fee: raw.execution_fee,
            deposit: raw.deposit,
            status: raw.status,
            timestamp: raw.timestamp,
        }
    }
}

pub(crate) fn orders_query(account: Option<&str>) -> EntityQuery {
    EntityQuery::new("limitOrders")
        .order_by("timestamp")
        .filter("account", account)
        .properties(&[
            "id",
            "hash",
            "account",
            "sourceCurrencyKey",
            "sourceAmount",
            "destinationCurrencyKey",
            "minDestinationAmount",
            "executionFee",
            "deposit",
            "status",
            "timestamp",
        ])
}

/// Limit orders, newest first.
pub async fn orders(
    client: &GraphClient,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<LimitOrder>> {
    let raw: Vec<RawLimitOrder> = client
        .page_results(Subgraph::LimitOrders, &orders_query(account), max)
        .await?;
    Ok(raw.into_iter().map(LimitOrder::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_currency_keys_decoded() {
        let raw: RawLimitOrder = serde_json::from_value(json!({
            "id": "4",
            "hash": "0xh",
            "account": "0xa",
            "sourceCurrencyKey": "0x7a555344000000000000000000000000",
            "sourceAmount": "100000000000000000000",
            "destinationCurrencyKey": "0x7a425443",
            "minDestinationAmount": "10000000000000000",
            "executionFee": "0",
            "deposit": "0",
            "status": "PENDING",
            "timestamp": 1600000000
        }))
        .unwrap();
        let order = LimitOrder::from(raw);
        assert_eq!(order.source_currency_key, "zUSD");
        assert_eq!(order.destination_currency_key, "zBTC");
        assert_eq!(order.source_amount, 100.0);
        assert_eq!(order.min_destination_amount, 0.01);
    }

    #[test]
    fn test_orders_query() {
        assert!(orders_query(Some("0xa"))
            .render(10, 0)
            .contains("limitOrders(first: 10, skip: 0, orderBy: timestamp"));
    }
}
