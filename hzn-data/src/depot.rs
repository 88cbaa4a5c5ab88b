//! Depot queries: deposits, cleared deposits and depot exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// A deposit or withdrawal made by a depot user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub hash: String,
    pub user: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub minimum: Option<u64>,
    pub deposit_index: Option<u64>,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUserAction {
    id: String,
    user: String,
    #[serde(deserialize_with = "de::wei")]
    amount: f64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "de::opt_uint")]
    minimum: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_uint")]
    deposit_index: Option<u64>,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawUserAction> for UserAction {
    fn from(raw: RawUserAction) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            user: raw.user,
            amount: raw.amount,
            kind: raw.kind,
            minimum: raw.minimum,
            deposit_index: raw.deposit_index,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
        }
    }
}

/// A deposit cleared by a purchase from the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedDeposit {
    pub hash: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(rename = "fromETHAmount")]
    pub from_eth_amount: f64,
    pub to_amount: f64,
    pub deposit_index: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClearedDeposit {
    id: String,
    from_address: String,
    to_address: String,
    #[serde(rename = "fromETHAmount", deserialize_with = "de::wei")]
    from_eth_amount: f64,
    #[serde(deserialize_with = "de::wei")]
    to_amount: f64,
    #[serde(deserialize_with = "de::uint")]
    deposit_index: u64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawClearedDeposit> for ClearedDeposit {
    fn from(raw: RawClearedDeposit) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            from_address: raw.from_address,
            to_address: raw.to_address,
            from_eth_amount: raw.from_eth_amount,
            to_amount: raw.to_amount,
            deposit_index: raw.deposit_index,
            kind: "bought".to_string(),
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
        }
    }
}

/// An ETH → zUSD exchange through the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepotExchange {
    pub hash: String,
    pub from: String,
    pub from_amount: f64,
    pub from_currency: String,
    pub to_amount: f64,
    pub to_currency: String,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDepotExchange {
    id: String,
    from: String,
    #[serde(deserialize_with = "de::wei")]
    from_amount: f64,
    from_currency: String,
    #[serde(deserialize_with = "de::wei")]
    to_amount: f64,
    to_currency: String,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawDepotExchange> for DepotExchange {
    fn from(raw: RawDepotExchange) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            from: raw.from,
            from_amount: raw.from_amount,
            from_currency: raw.from_currency,
            to_amount: raw.to_amount,
            to_currency: raw.to_currency,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
        }
    }
}

pub(crate) fn user_actions_query(user: Option<&str>) -> EntityQuery {
    EntityQuery::new("userActions")
        .order_by("timestamp")
        .filter("user", user)
        .properties(&[
            "id",
            "user",
            "amount",
            "minimum",
            "depositIndex",
            "type",
            "block",
            "timestamp",
        ])
}

pub(crate) fn cleared_deposits_query(from: Option<&str>, to: Option<&str>) -> EntityQuery {
    EntityQuery::new("clearedDeposits")
        .order_by("timestamp")
        .filter("fromAddress", from)
        .filter("toAddress", to)
        .properties(&[
            "id",
            "fromAddress",
            "toAddress",
            "fromETHAmount",
            "toAmount",
            "depositIndex",
            "block",
            "timestamp",
        ])
}

/// Deposits and withdrawals, optionally for one user.
pub async fn user_actions(
    client: &GraphClient,
    user: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<UserAction>> {
    let raw: Vec<RawUserAction> = client
        .page_results(Subgraph::Depot, &user_actions_query(user), max)
        .await?;
    Ok(raw.into_iter().map(UserAction::from).collect())
}

/// Cleared deposits, optionally filtered by either side.
pub async fn cleared_deposits(
    client: &GraphClient,
    from_address: Option<&str>,
    to_address: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<ClearedDeposit>> {
    let query = cleared_deposits_query(from_address, to_address);
    let raw: Vec<RawClearedDeposit> = client.page_results(Subgraph::Depot, &query, max).await?;
    Ok(raw.into_iter().map(ClearedDeposit::from).collect())
}

/// Depot exchanges, optionally from one address.
pub async fn exchanges(
    client: &GraphClient,
    from: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<DepotExchange>> {
    let query = EntityQuery::new("exchanges")
        .order_by("timestamp")
        .filter("from", from)
        .properties(&[
            "id",
            "from",
            "fromCurrency",
            "fromAmount",
            "toCurrency",
            "toAmount",
            "block",
            "timestamp",
        ]);
    let raw: Vec<RawDepotExchange> = client.page_results(Subgraph::Depot, &query, max).await?;
    Ok(raw.into_iter().map(DepotExchange::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_action_nullable_fields() {
        let raw: RawUserAction = serde_json::from_value(json!({
            "id": "0x01-0",
            "user": "0xuser",
            "amount": "1000000000000000000000",
            "minimum": null,
            "depositIndex": "7",
            "type": "deposit",
            "block": "99",
            "timestamp": "1600000000"
        }))
        .unwrap();
        let action = UserAction::from(raw);
        assert_eq!(action.amount, 1000.0);
        assert_eq!(action.minimum, None);
        assert_eq!(action.deposit_index, Some(7));
        assert_eq!(action.kind, "deposit");

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "deposit");
    }

    #[test]
    fn test_cleared_deposit_is_bought() {
        let raw: RawClearedDeposit = serde_json::from_value(json!({
            "id": "0x02-1",
            "fromAddress": "0xa",
            "toAddress": "0xb",
            "fromETHAmount": "1000000000000000000",
            "toAmount": "180000000000000000000",
            "depositIndex": 3,
            "block": 5,
            "timestamp": 1
        }))
        .unwrap();
        let deposit = ClearedDeposit::from(raw);
        assert_eq!(deposit.kind, "bought");
        assert_eq!(deposit.to_amount, 180.0);
        assert_eq!(deposit.timestamp, 1000);
    }

    #[test]
    fn test_queries() {
        let q = user_actions_query(Some("0xuser")).render(10, 0);
        assert!(q.contains("userActions(first: 10"));
        assert!(q.contains("where: {user: \"0xuser\"}"));

        let q = cleared_deposits_query(None, Some("0xb")).render(10, 0);
        assert!(q.contains("where: {toAddress: \"0xb\"}"));
    }
}
