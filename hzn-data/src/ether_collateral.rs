//! ETH-collateralised loan queries.

use serde::{Deserialize, Serialize};

use crate::client::GraphClient;
use crate::de;
use crate::error::Result;
use crate::query::EntityQuery;
use crate::subgraph::Subgraph;

/// A zasset loan backed by ETH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub loan_id: String,
    pub account: String,
    pub amount: f64,
    pub is_open: bool,
    pub created_at: i64,
    pub closed_at: Option<i64>,
    pub tx_hash: Option<String>,
    pub collateral_minted: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoan {
    id: String,
    account: String,
    #[serde(deserialize_with = "de::wei")]
    amount: f64,
    is_open: bool,
    #[serde(deserialize_with = "de::secs_to_millis")]
    created_at: i64,
    #[serde(default, deserialize_with = "de::opt_secs_to_millis")]
    closed_at: Option<i64>,
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    collateral_minted: Option<String>,
}

impl From<RawLoan> for Loan {
    fn from(raw: RawLoan) -> Self {
        Self {
            loan_id: raw.id,
            account: raw.account,
            amount: raw.amount,
            is_open: raw.is_open,
            created_at: raw.created_at,
            closed_at: raw.closed_at,
            tx_hash: raw.tx_hash,
            collateral_minted: raw.collateral_minted,
        }
    }
}

/// Part of a loan's collateral seized by a liquidator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLiquidation {
    pub hash: String,
    pub loan_id: String,
    pub account: String,
    pub liquidator: String,
    pub liquidated_amount: f64,
    pub liquidated_collateral: f64,
    pub timestamp: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPartialLiquidation {
    id: String,
    #[serde(deserialize_with = "de::uint")]
    loan_id: u64,
    account: String,
    liquidator: String,
    #[serde(deserialize_with = "de::wei")]
    liquidated_amount: f64,
    #[serde(deserialize_with = "de::wei")]
    liquidated_collateral: f64,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

impl From<RawPartialLiquidation> for PartialLiquidation {
    fn from(raw: RawPartialLiquidation) -> Self {
        Self {
            hash: de::hash_from_id(&raw.id),
            loan_id: raw.loan_id.to_string(),
            account: raw.account,
            liquidator: raw.liquidator,
            liquidated_amount: raw.liquidated_amount,
            liquidated_collateral: raw.liquidated_collateral,
            timestamp: raw.timestamp,
        }
    }
}

/// A loan closed by liquidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanLiquidation {
    pub hash: String,
    pub loan_id: String,
    pub account: String,
    pub liquidator: String,
    pub timestamp: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoanLiquidation {
    id: String,
    #[serde(deserialize_with = "de::uint")]
    loan_id: u64,
    account: String,
    liquidator: String,
    #[serde(deserialize_with = "de::secs_to_millis")]
    timestamp: i64,
}

/// Filters for [`loans`].
#[derive(Debug, Clone, Default)]
pub struct LoanOptions {
    pub account: Option<String>,
    pub is_open: Option<bool>,
    /// Currency of the minted debt, e.g. `zUSD`.
    pub collateral_minted: Option<String>,
    pub max: Option<u32>,
}

pub(crate) fn loans_query(opts: &LoanOptions) -> EntityQuery {
    EntityQuery::new("loans")
        .order_by("createdAt")
        .filter("account", opts.account.clone())
        .filter("isOpen", opts.is_open)
        .filter("collateralMinted", opts.collateral_minted.clone())
        .properties(&[
            "id",
            "account",
            "amount",
            "isOpen",
            "createdAt",
            "closedAt",
            "txHash",
            "collateralMinted",
        ])
}

/// Loans, newest first.
pub async fn loans(client: &GraphClient, opts: LoanOptions) -> Result<Vec<Loan>> {
    let raw: Vec<RawLoan> = client
        .page_results(Subgraph::EtherCollateral, &loans_query(&opts), opts.max)
        .await?;
    Ok(raw.into_iter().map(Loan::from).collect())
}

/// Partial liquidations, newest first.
pub async fn partially_liquidated_loans(
    client: &GraphClient,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<PartialLiquidation>> {
    let query = EntityQuery::new("loanPartiallyLiquidateds")
        .order_by("timestamp")
        .filter("account", account)
        .properties(&[
            "id",
            "loanId",
            "account",
            "liquidator",
            "liquidatedAmount",
            "liquidatedCollateral",
            "timestamp",
        ]);
    let raw: Vec<RawPartialLiquidation> = client
        .page_results(Subgraph::EtherCollateral, &query, max)
        .await?;
    Ok(raw.into_iter().map(PartialLiquidation::from).collect())
}

/// Fully liquidated loans, newest first.
pub async fn liquidated_loans(
    client: &GraphClient,
    account: Option<&str>,
    max: Option<u32>,
) -> Result<Vec<LoanLiquidation>> {
    let query = EntityQuery::new("loanLiquidateds")
        .order_by("timestamp")
        .filter("account", account)
        .properties(&["id", "loanId", "account", "liquidator", "timestamp"]);
    let raw: Vec<RawLoanLiquidation> = client
        .page_results(Subgraph::EtherCollateral, &query, max)
        .await?;
    Ok(raw
        .into_iter()
        .map(|r| LoanLiquidation {
            hash: de::hash_from_id(&r.id),
            loan_id: r.loan_id.to_string(),
            account: r.account,
            liquidator: r.liquidator,
            timestamp: r.timestamp,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loans_query_filters() {
        let rendered = loans_query(&LoanOptions {
            is_open: Some(false),
            collateral_minted: Some("zUSD".into()),
            ..Default::default()
        })
        .render(1000, 0);
        assert!(rendered.contains("orderBy: createdAt"));
        assert!(rendered.contains("where: {isOpen: false, collateralMinted: \"zUSD\"}"));
    }

    #[test]
    fn test_open_loan_has_no_close_time() {
        let raw: RawLoan = serde_json::from_value(json!({
            "id": "12",
            "account": "0xa",
            "amount": "1500000000000000000",
            "isOpen": true,
            "createdAt": "1600000000",
            "closedAt": null,
            "txHash": "0xtx",
            "collateralMinted": "zETH"
        }))
        .unwrap();
        let loan = Loan::from(raw);
        assert_eq!(loan.loan_id, "12");
        assert_eq!(loan.amount, 1.5);
        assert_eq!(loan.created_at, 1_600_000_000_000);
        assert_eq!(loan.closed_at, None);
    }
}
