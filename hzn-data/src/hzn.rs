//! HZN token queries: holders, staking, issuance and rewards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::{EntityQuery, Value};
use crate::subgraph::Subgraph;
use crate::zassets::{self, Transfer, TransferOptions};

/// Currency code the transfers entity records native token moves under.
pub const HZN_SOURCE: &str = "HZN";

const HOLDER_PROPERTIES: &[&str] = &[
    "id",
    "block",
    "timestamp",
    "balanceOf",
    "collateral",
    "transferable",
    "initialDebtOwnership",
    "debtEntryAtIndex",
    "claims",
    "mints",
];

/// A staker's HZN position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HznHolder {
    pub address: String,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub balance_of: f64,
    pub collateral: f64,
    pub transferable: f64,
    pub initial_debt_ownership: f64,
    pub debt_entry_at_index: f64,
    pub claims: u64,
    pub mints: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHznHolder {
    id: String,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    #[serde(deserialize_with = "de::wei")]
    balance_of: f64,
    #[serde(default, deserialize_with = "de::opt_wei")]
    collateral: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_wei")]
    transferable: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    initial_debt_ownership: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    debt_entry_at_index: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_uint")]
    claims: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_uint")]
    mints: Option<u64>,
}

impl From<RawHznHolder> for HznHolder {
    fn from(raw: RawHznHolder) -> Self {
        Self {
            address: raw.id,
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            balance_of: raw.balance_of,
            collateral: raw.collateral.unwrap_or_default(),
            transferable: raw.transferable.unwrap_or_default(),
            initial_debt_ownership: raw.initial_debt_ownership.unwrap_or_default()
                / de::PRECISE_UNIT,
            debt_entry_at_index: raw.debt_entry_at_index.unwrap_or_default() / de::PRECISE_UNIT,
            claims: raw.claims.unwrap_or_default(),
            mints: raw.mints.unwrap_or_default(),
        }
    }
}

/// Protocol-wide holder counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HznTotal {
    pub issuers: u64,
    pub hzn_holders: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHznTotal {
    #[serde(deserialize_with = "de::uint")]
    issuers: u64,
    #[serde(deserialize_with = "de::uint")]
    hzn_holders: u64,
}

/// Active staker count for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStakers {
    pub id: String,
    pub count: u64,
}

#[derive(Deserialize)]
struct RawActiveStakers {
    #[serde(default)]
    id: Option<String>,
    #[serde(deserialize_with = "de::uint")]
    count: u64,
}

/// Current number of active stakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStakerCount {
    pub count: u64,
}

/// Escrowed staking rewards held by an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEscrowHolder {
    pub address: String,
    pub balance: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRewardEscrowHolder {
    id: String,
    #[serde(deserialize_with = "de::wei")]
    balance_of: f64,
}

/// A zUSD issue or burn by a staker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtEvent {
    pub account: String,
    pub hash: String,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub value: f64,
    pub gas_price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDebtEvent {
    id: String,
    account: String,
    #[serde(deserialize_with = "de::wei")]
    value: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    #[serde(default, deserialize_with = "de::opt_gwei")]
    gas_price: Option<f64>,
}

impl From<RawDebtEvent> for DebtEvent {
    fn from(raw: RawDebtEvent) -> Self {
        Self {
            account: raw.account,
            hash: de::hash_from_id(&raw.id),
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            value: raw.value,
            gas_price: raw.gas_price,
        }
    }
}

/// Fees and rewards claimed by a staker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeesClaimed {
    pub account: String,
    pub hash: String,
    pub block: u64,
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub value: f64,
    pub rewards: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize)]
struct RawFeesClaimed {
    id: String,
    account: String,
    #[serde(deserialize_with = "de::wei")]
    value: f64,
    #[serde(deserialize_with = "de::wei")]
    rewards: f64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawFeesClaimed> for FeesClaimed {
    fn from(raw: RawFeesClaimed) -> Self {
        Self {
            account: raw.account,
            hash: de::hash_from_id(&raw.id),
            block: raw.block,
            timestamp: raw.timestamp,
            date: de::date_from_millis(raw.timestamp),
            value: raw.value,
            rewards: raw.rewards,
            kind: "feesClaimed".to_string(),
        }
    }
}

/// A staker's debt position at one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSnapshot {
    pub timestamp: i64,
    pub block: u64,
    pub account: String,
    pub balance_of: f64,
    pub collateral: f64,
    pub debt_balance_of: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDebtSnapshot {
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
    #[serde(deserialize_with = "de::uint")]
    block: u64,
    account: String,
    #[serde(deserialize_with = "de::wei")]
    balance_of: f64,
    #[serde(deserialize_with = "de::wei")]
    collateral: f64,
    #[serde(deserialize_with = "de::wei")]
    debt_balance_of: f64,
}

impl From<RawDebtSnapshot> for DebtSnapshot {
    fn from(raw: RawDebtSnapshot) -> Self {
        Self {
            timestamp: raw.timestamp,
            block: raw.block,
            account: raw.account,
            balance_of: raw.balance_of,
            collateral: raw.collateral,
            debt_balance_of: raw.debt_balance_of,
        }
    }
}

/// Filters for [`holders`].
#[derive(Debug, Clone, Default)]
pub struct HolderOptions {
    pub address: Option<String>,
    /// Whole HZN; scaled to 18 decimals in the query.
    pub min_collateral: Option<u64>,
    /// Whole HZN; scaled to 18 decimals in the query.
    pub max_collateral: Option<u64>,
    pub min_mints: Option<u64>,
    pub min_claims: Option<u64>,
    pub max: Option<u32>,
}

/// Filters shared by issue/burn queries.
#[derive(Debug, Clone, Default)]
pub struct DebtEventOptions {
    pub min_block: Option<u64>,
    pub account: Option<String>,
    pub max: Option<u32>,
}

/// Filters for [`debt_snapshot`].
#[derive(Debug, Clone, Default)]
pub struct DebtSnapshotOptions {
    pub account: Option<String>,
    pub min_block: Option<u64>,
    pub max_block: Option<u64>,
    pub max: Option<u32>,
}

pub(crate) fn holders_query(opts: &HolderOptions) -> EntityQuery {
    EntityQuery::new("hznHolders")
        .order_by("collateral")
        .filter("id", opts.address.clone())
        .filter(
            "collateral_lte",
            opts.max_collateral.map(|c| Value::Big(de::to_wei_literal(c))),
        )
        .filter(
            "collateral_gte",
            opts.min_collateral.map(|c| Value::Big(de::to_wei_literal(c))),
        )
        .filter("mints_gte", opts.min_mints)
        .filter("claims_gte", opts.min_claims)
        .properties(HOLDER_PROPERTIES)
}

fn debt_event_query(entity: &str, opts: &DebtEventOptions) -> EntityQuery {
    EntityQuery::new(entity)
        .order_by("timestamp")
        .filter("account", opts.account.clone())
        .filter("block_gte", opts.min_block)
        .properties(&["id", "account", "value", "block", "timestamp", "gasPrice"])
}

/// HZN holders ordered by collateral, largest first.
pub async fn holders(client: &GraphClient, opts: HolderOptions) -> Result<Vec<HznHolder>> {
    let raw: Vec<RawHznHolder> = client
        .page_results(Subgraph::Hzn, &holders_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(HznHolder::from).collect())
}

/// Issuer and holder counts.
pub async fn total(client: &GraphClient) -> Result<HznTotal> {
    let query = EntityQuery::new("horizons").properties(&["issuers", "hznHolders"]);
    let raw: RawHznTotal = client.first(Subgraph::Hzn, &query).await?;
    Ok(HznTotal {
        issuers: raw.issuers,
        hzn_holders: raw.hzn_holders,
    })
}

/// Daily active staker counts, newest first.
pub async fn aggregate_active_stakers(
    client: &GraphClient,
    max: Option<u32>,
) -> Result<Vec<ActiveStakers>> {
    let query = EntityQuery::new("totalDailyActiveStakers")
        .order_by("id")
        .properties(&["id", "count"]);
    let raw: Vec<RawActiveStakers> = client.page_results(Subgraph::Hzn, &query, max).await?;
    Ok(raw
        .into_iter()
        .map(|r| ActiveStakers {
            id: r.id.unwrap_or_default(),
            count: r.count,
        })
        .collect())
}

/// Current active staker count.
pub async fn total_active_stakers(client: &GraphClient) -> Result<ActiveStakerCount> {
    let query = EntityQuery::new("totalActiveStakers").properties(&["count"]);
    let raw: RawActiveStakers = client.first(Subgraph::Hzn, &query).await?;
    Ok(ActiveStakerCount { count: raw.count })
}

/// HZN transfers between non-zero addresses.
pub async fn transfers(
    client: &GraphClient,
    from: Option<String>,
    to: Option<String>,
    max: Option<u32>,
) -> Result<Vec<Transfer>> {
    zassets::transfers(
        client,
        TransferOptions {
            zasset: Some(HZN_SOURCE.to_string()),
            from,
            to,
            max,
        },
    )
    .await
}

/// Escrowed reward balances, largest first.
pub async fn rewards(client: &GraphClient, max: Option<u32>) -> Result<Vec<RewardEscrowHolder>> {
    let query = EntityQuery::new("rewardEscrowHolders")
        .order_by("balanceOf")
        .properties(&["id", "balanceOf"]);
    let raw: Vec<RawRewardEscrowHolder> = client.page_results(Subgraph::Hzn, &query, max).await?;
    Ok(raw
        .into_iter()
        .map(|r| RewardEscrowHolder {
            address: r.id,
            balance: r.balance_of,
        })
        .collect())
}

/// zUSD issued against HZN collateral.
pub async fn issued(client: &GraphClient, opts: DebtEventOptions) -> Result<Vec<DebtEvent>> {
    let query = debt_event_query("issueds", &opts);
    let raw: Vec<RawDebtEvent> = client.page_results(Subgraph::Hzn, &query, opts.max).await?;
    Ok(raw.into_iter().map(DebtEvent::from).collect())
}

/// zUSD burned to unlock HZN collateral.
pub async fn burned(client: &GraphClient, opts: DebtEventOptions) -> Result<Vec<DebtEvent>> {
    let query = debt_event_query("burneds", &opts);
    let raw: Vec<RawDebtEvent> = client.page_results(Subgraph::Hzn, &query, opts.max).await?;
    Ok(raw.into_iter().map(DebtEvent::from).collect())
}

/// Fee and reward claims.
pub async fn fees_claimed(
    client: &GraphClient,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<FeesClaimed>> {
    let query = EntityQuery::new("feesClaimeds")
        .order_by("timestamp")
        .filter("account", account)
        .properties(&["id", "account", "rewards", "value", "block", "timestamp"]);
    let raw: Vec<RawFeesClaimed> = client.page_results(Subgraph::Hzn, &query, max).await?;
    Ok(raw.into_iter().map(FeesClaimed::from).collect())
}

/// Debt snapshots, newest first.
pub async fn debt_snapshot(
    client: &GraphClient,
    opts: DebtSnapshotOptions,
) -> Result<Vec<DebtSnapshot>> {
    let query = EntityQuery::new("debtSnapshots")
        .order_by("timestamp")
        .filter("account", opts.account.clone())
        .filter("block_gte", opts.min_block)
        .filter("block_lte", opts.max_block)
        .properties(&[
            "id",
            "timestamp",
            "block",
            "account",
            "balanceOf",
            "collateral",
            "debtBalanceOf",
        ]);
    let raw: Vec<RawDebtSnapshot> = client.page_results(Subgraph::Hzn, &query, opts.max).await?;
    Ok(raw.into_iter().map(DebtSnapshot::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_holders_query_scales_collateral() {
        let rendered = holders_query(&HolderOptions {
            min_collateral: Some(100),
            min_mints: Some(2),
            ..Default::default()
        })
        .render(100, 0);
        assert!(rendered.contains("collateral_gte: 100000000000000000000"));
        assert!(rendered.contains("mints_gte: 2"));
        assert!(!rendered.contains("collateral_lte"));
        assert!(rendered.contains("orderBy: collateral"));
    }

    #[test]
    fn test_holder_decoding() {
        let raw: RawHznHolder = serde_json::from_value(json!({
            "id": "0xstaker",
            "block": "100",
            "timestamp": "1600000000",
            "balanceOf": "2000000000000000000000",
            "collateral": "2500000000000000000000",
            "transferable": "500000000000000000000",
            "initialDebtOwnership": "1000000000000000000000000000",
            "debtEntryAtIndex": null,
            "claims": "3",
            "mints": 1
        }))
        .unwrap();
        let holder = HznHolder::from(raw);
        assert_eq!(holder.address, "0xstaker");
        assert_eq!(holder.balance_of, 2000.0);
        assert_eq!(holder.collateral, 2500.0);
        assert_eq!(holder.initial_debt_ownership, 1.0);
        assert_eq!(holder.debt_entry_at_index, 0.0);
        assert_eq!(holder.claims, 3);
        assert_eq!(holder.mints, 1);
    }

    #[test]
    fn test_fees_claimed_kind() {
        let raw: RawFeesClaimed = serde_json::from_value(json!({
            "id": "0xc1-2",
            "account": "0xa",
            "value": "1000000000000000000",
            "rewards": "3000000000000000000",
            "block": 1,
            "timestamp": 2
        }))
        .unwrap();
        let claim = FeesClaimed::from(raw);
        assert_eq!(claim.kind, "feesClaimed");
        assert_eq!(claim.rewards, 3.0);
        assert_eq!(serde_json::to_value(&claim).unwrap()["type"], "feesClaimed");
    }

    #[test]
    fn test_debt_event_entities() {
        let opts = DebtEventOptions {
            account: Some("0xa".into()),
            ..Default::default()
        };
        assert!(debt_event_query("issueds", &opts)
            .render(5, 0)
            .starts_with("{ issueds(first: 5"));
        assert!(debt_event_query("burneds", &opts)
            .render(5, 0)
            .contains("where: {account: \"0xa\"}"));
    }
}
