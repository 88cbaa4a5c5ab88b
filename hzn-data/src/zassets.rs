//! Zasset queries: issuers, transfers and holders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// Mints and burns show up as transfers from/to this address.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A token transfer between two non-zero addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub source: String,
    pub from_address: String,
    pub to_address: String,
    pub value: f64,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub hash: String,
}

#[derive(Deserialize)]
struct RawTransfer {
    id: String,
    source: String,
    from: String,
    to: String,
    #[serde(deserialize_with = "de::wei")]
    value: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawTransfer> for Transfer {
    fn from(raw: RawTransfer) -> Self {
        Self {
            source: raw.source,
            from_address: raw.from,
            to_address: raw.to,
            value: raw.value,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            hash: de::hash_from_id(&raw.id),
        }
    }
}

/// A zasset balance held by one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZassetHolder {
    pub address: String,
    pub balance_of: f64,
    pub zasset: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHolder {
    address: String,
    #[serde(deserialize_with = "de::wei")]
    balance_of: f64,
    zasset: String,
}

impl From<RawHolder> for ZassetHolder {
    fn from(raw: RawHolder) -> Self {
        Self {
            address: raw.address,
            balance_of: raw.balance_of,
            zasset: raw.zasset,
        }
    }
}

#[derive(Deserialize)]
struct RawIssuer {
    id: String,
}

/// Filters for [`transfers`].
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Zasset currency code (`zUSD`), or `HZN` for the native token.
    pub zasset: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub max: Option<u32>,
}

/// Filters for [`holders`].
#[derive(Debug, Clone, Default)]
pub struct HolderOptions {
    pub address: Option<String>,
    pub zasset: Option<String>,
    pub max: Option<u32>,
}

pub(crate) fn transfers_query(opts: &TransferOptions) -> EntityQuery {
    EntityQuery::new("transfers")
        .order_by("timestamp")
        .filter("source", opts.zasset.clone())
        .filter("from", opts.from.clone())
        .filter("to", opts.to.clone())
        .filter("from_not", Some(ZERO_ADDRESS))
        .filter("to_not", Some(ZERO_ADDRESS))
        .properties(&["id", "source", "to", "from", "value", "block", "timestamp"])
}

pub(crate) fn holders_query(opts: &HolderOptions) -> EntityQuery {
    EntityQuery::new("zassetHolders")
        .order_by("balanceOf")
        .filter("address", opts.address.clone())
        .filter("zasset", opts.zasset.clone())
        .properties(&["id", "address", "balanceOf", "zasset"])
}

/// Addresses that have issued zassets.
pub async fn issuers(client: &GraphClient, max: Option<u32>) -> Result<Vec<String>> {
    let query = EntityQuery::new("issuers").order_by("id").properties(&["id"]);
    let raw: Vec<RawIssuer> = client.page_results(Subgraph::Hzn, &query, max).await?;
    Ok(raw.into_iter().map(|r| r.id).collect())
}

/// Transfers between non-zero addresses, newest first.
pub async fn transfers(client: &GraphClient, opts: TransferOptions) -> Result<Vec<Transfer>> {
    let raw: Vec<RawTransfer> = client
        .page_results(Subgraph::Hzn, &transfers_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(Transfer::from).collect())
}

/// Holders ordered by balance, largest first.
pub async fn holders(client: &GraphClient, opts: HolderOptions) -> Result<Vec<ZassetHolder>> {
    let raw: Vec<RawHolder> = client
        .page_results(Subgraph::Hzn, &holders_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(ZassetHolder::from).collect())
}
