//! Staker liquidation queries.
//!
//! An account flagged for liquidation gets a deadline
//! [`LIQUIDATION_DELAY_SECS`] after the flag; it stays liquidatable until it
//! is either removed from liquidation (ratio fixed) or liquidated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// Delay between being flagged and becoming liquidatable.
pub const LIQUIDATION_DELAY_SECS: i64 = 3 * 86_400;

/// Inclusive time range, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl TimeWindow {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// An account flagged as under-collateralised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedAccount {
    pub deadline: i64,
    pub account: String,
    #[serde(rename = "liquidatableNonEscrowHZN")]
    pub liquidatable_non_escrow_hzn: f64,
    pub collateral_ratio: f64,
    pub collateral: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFlaggedAccount {
    #[serde(deserialize_with = "de::secs_to_millis")]
    deadline: i64,
    account: String,
    #[serde(rename = "liquidatableNonEscrowHZN", deserialize_with = "de::wei")]
    liquidatable_non_escrow_hzn: f64,
    #[serde(deserialize_with = "de::wei")]
    collateral_ratio: f64,
    #[serde(deserialize_with = "de::wei")]
    collateral: f64,
}

impl From<RawFlaggedAccount> for FlaggedAccount {
    fn from(raw: RawFlaggedAccount) -> Self {
        Self {
            deadline: raw.deadline,
            account: raw.account,
            liquidatable_non_escrow_hzn: raw.liquidatable_non_escrow_hzn,
            collateral_ratio: raw.collateral_ratio,
            collateral: raw.collateral,
        }
    }
}

impl FlaggedAccount {
    /// When the flag was raised, in milliseconds.
    pub fn flagged_at(&self) -> i64 {
        self.deadline - LIQUIDATION_DELAY_SECS * 1000
    }
}

/// An account whose flag was cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedAccount {
    pub hash: String,
    pub account: String,
    pub time: i64,
}

#[derive(Deserialize)]
struct RawRemovedAccount {
    id: String,
    account: String,
    #[serde(deserialize_with = "de::secs_to_millis")]
    time: i64,
}

/// A completed liquidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidatedAccount {
    pub hash: String,
    pub account: String,
    pub liquidator: String,
    pub amount_liquidated: f64,
    #[serde(rename = "hznRedeemed")]
    pub hzn_redeemed: f64,
    pub time: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLiquidatedAccount {
    id: String,
    account: String,
    liquidator: String,
    #[serde(deserialize_with = "de::wei")]
    amount_liquidated: f64,
    #[serde(rename = "hznRedeemed", deserialize_with = "de::wei")]
    hzn_redeemed: f64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    time: i64,
}

impl From<RawLiquidatedAccount> for LiquidatedAccount {
    fn from(raw: RawLiquidatedAccount) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            account: raw.account,
            liquidator: raw.liquidator,
            amount_liquidated: raw.amount_liquidated,
            hzn_redeemed: raw.hzn_redeemed,
            time: raw.time,
        }
    }
}

pub(crate) fn flagged_query(deadline: TimeWindow, account: Option<&str>) -> EntityQuery {
    EntityQuery::new("accountFlaggedForLiquidations")
        .order_by("deadline")
        .filter("deadline_gte", deadline.min)
        .filter("deadline_lte", deadline.max)
        .filter("account", account)
        .properties(&[
            "id",
            "deadline",
            "account",
            "liquidatableNonEscrowHZN",
            "collateralRatio",
            "collateral",
        ])
}

fn timed_query(entity: &str, window: TimeWindow, account: Option<&str>) -> EntityQuery {
    EntityQuery::new(entity)
        .order_by("time")
        .filter("time_gte", window.min)
        .filter("time_lte", window.max)
        .filter("account", account)
}

/// Accounts flagged with a deadline inside `deadline`, latest deadline first.
pub async fn accounts_flagged_for_liquidation(
    client: &GraphClient,
    deadline: TimeWindow,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<FlaggedAccount>> {
    let raw: Vec<RawFlaggedAccount> = client
        .page_results(Subgraph::Liquidations, &flagged_query(deadline, account), max)
        .await?;
    Ok(raw.into_iter().map(FlaggedAccount::from).collect())
}

/// Accounts removed from liquidation inside `window`.
pub async fn accounts_removed_from_liquidation(
    client: &GraphClient,
    window: TimeWindow,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<RemovedAccount>> {
    let query = timed_query("accountRemovedFromLiquidations", window, account)
        .properties(&["id", "account", "time"]);
    let raw: Vec<RawRemovedAccount> = client.page_results(Subgraph::Liquidations, &query, max).await?;
    Ok(raw
        .into_iter()
        .map(|r| RemovedAccount {
            hash: de::hash_from_id(&r.id),
            account: r.account,
            time: r.time,
        })
        .collect())
}

/// Accounts liquidated inside `window`.
pub async fn accounts_liquidated(
    client: &GraphClient,
    window: TimeWindow,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<LiquidatedAccount>> {
    let query = timed_query("accountLiquidateds", window, account).properties(&[
        "id",
        "account",
        "liquidator",
        "amountLiquidated",
        "hznRedeemed",
        "time",
    ]);
    let raw: Vec<RawLiquidatedAccount> =
        client.page_results(Subgraph::Liquidations, &query, max).await?;
    Ok(raw.into_iter().map(LiquidatedAccount::from).collect())
}

/// Accounts flagged inside `window` that have not since been removed from
/// liquidation or liquidated.
pub async fn get_active_liquidations(
    client: &GraphClient,
    window: TimeWindow,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<FlaggedAccount>> {
    let deadline = TimeWindow {
        min: window.min.map(|t| t + LIQUIDATION_DELAY_SECS),
        max: window.max.map(|t| t + LIQUIDATION_DELAY_SECS),
    };
    let flagged = accounts_flagged_for_liquidation(client, deadline, account, max).await?;

    let since = TimeWindow {
        min: window.min,
        max: None,
    };
    let removed = accounts_removed_from_liquidation(client, since, account, None).await?;
    let liquidated = accounts_liquidated(client, since, account, None).await?;

    let mut resolved_at: HashMap<&str, i64> = HashMap::new();
    let events = removed
        .iter()
        .map(|r| (r.account.as_str(), r.time))
        .chain(liquidated.iter().map(|l| (l.account.as_str(), l.time)));
    for (account, time) in events {
        let latest = resolved_at.entry(account).or_insert(time);
        *latest = (*latest).max(time);
    }

    let active = still_active(flagged, &resolved_at);
    debug!(active = active.len(), "active liquidations resolved");
    Ok(active)
}

fn still_active(flagged: Vec<FlaggedAccount>, resolved_at: &HashMap<&str, i64>) -> Vec<FlaggedAccount> {
    flagged
        .into_iter()
        .filter(|f| match resolved_at.get(f.account.as_str()) {
            Some(&time) => time < f.flagged_at(),
            None => true,
        })
        .collect()
}
