//! ETH collateral loan commands.

use clap::Args;
use hzn_data::ether_collateral::{self, LoanOptions};

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct LoansArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,

    /// Whether the loan is open (true) or closed (false)
    #[arg(short = 'o', long)]
    pub is_open: Option<bool>,

    /// The currency minted against the collateral
    #[arg(short, long)]
    pub collateral_minted: Option<String>,
}

#[derive(Args)]
pub struct AccountArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,
}

pub async fn loans(ctx: &Context, args: LoansArgs) -> i32 {
    let opts = LoanOptions {
        account: args.account,
        is_open: args.is_open,
        collateral_minted: args.collateral_minted,
        max: args.max.0,
    };
    let result = ether_collateral::loans(&ctx.client, opts).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn partially_liquidated_loans(ctx: &Context, args: AccountArgs) -> i32 {
    let result =
        ether_collateral::partially_liquidated_loans(&ctx.client, args.account.as_deref(), args.max.0)
            .await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn liquidated_loans(ctx: &Context, args: AccountArgs) -> i32 {
    let result =
        ether_collateral::liquidated_loans(&ctx.client, args.account.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}
