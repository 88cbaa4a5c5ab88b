//! HZN staking and token commands.

use clap::Args;
use hzn_data::hzn::{self, DebtEventOptions, DebtSnapshotOptions, HolderOptions};

use super::{emit, emit_one, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct HoldersArgs {
    /// Address to filter on, if any
    #[arg(short, long)]
    pub address: Option<String>,

    /// Minimum number of claims
    #[arg(short = 'c', long)]
    pub min_claims: Option<u64>,

    /// Minimum number of mints
    #[arg(short = 'i', long)]
    pub min_mints: Option<u64>,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,

    /// Minimum amount of collateral (18 decimals are added)
    #[arg(short = 'n', long)]
    pub min_collateral: Option<u64>,

    /// Show addresses only
    #[arg(short = 'o', long)]
    pub addresses_only: bool,

    /// Maximum amount of collateral (18 decimals are added)
    #[arg(short = 'x', long)]
    pub max_collateral: Option<u64>,
}

#[derive(Args)]
pub struct MaxArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "30")]
    pub max: Limit,
}

#[derive(Args)]
pub struct TransfersArgs {
    /// A from address
    #[arg(short, long)]
    pub from: Option<String>,

    /// A to address
    #[arg(short, long)]
    pub to: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,
}

#[derive(Args)]
pub struct RewardsArgs {
    /// Show addresses only
    #[arg(short, long)]
    pub addresses_only: bool,

    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DebtEventArgs {
    /// The smallest block to include, if any
    #[arg(short = 'b', long)]
    pub min_block: Option<u64>,

    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,
}

#[derive(Args)]
pub struct FeesClaimedArgs {
    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,
}

#[derive(Args)]
pub struct DebtSnapshotArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// The smallest block to include, if any
    #[arg(short = 'b', long)]
    pub min_block: Option<u64>,

    /// The biggest block to include, if any
    #[arg(short = 'B', long)]
    pub max_block: Option<u64>,

    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,
}

/// Issues or burns.
#[derive(Debug, Clone, Copy)]
pub enum DebtAction {
    Issued,
    Burned,
}

pub async fn holders(ctx: &Context, args: HoldersArgs) -> i32 {
    let opts = HolderOptions {
        address: args.address,
        min_collateral: args.min_collateral,
        max_collateral: args.max_collateral,
        min_mints: args.min_mints,
        min_claims: args.min_claims,
        max: args.max.0,
    };
    let format = Format::from_flags(args.json, false);
    let max = args.max.to_string();
    let result = hzn::holders(&ctx.client, opts).await;

    if args.addresses_only {
        let addresses = result.map(|holders| holders.into_iter().map(|h| h.address).collect::<Vec<_>>());
        emit(addresses, format, &max)
    } else {
        emit(result, format, &max)
    }
}

pub async fn total(ctx: &Context) -> i32 {
    emit_one(hzn::total(&ctx.client).await)
}

pub async fn aggregate_active_stakers(ctx: &Context, args: MaxArgs) -> i32 {
    let result = hzn::aggregate_active_stakers(&ctx.client, args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn total_active_stakers(ctx: &Context) -> i32 {
    emit_one(hzn::total_active_stakers(&ctx.client).await)
}

pub async fn transfers(ctx: &Context, args: TransfersArgs) -> i32 {
    let result = hzn::transfers(&ctx.client, args.from, args.to, args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn rewards(ctx: &Context, args: RewardsArgs) -> i32 {
    let format = Format::from_flags(args.json, false);
    let max = args.max.to_string();
    let result = hzn::rewards(&ctx.client, args.max.0).await;

    if args.addresses_only {
        let addresses = result.map(|holders| holders.into_iter().map(|h| h.address).collect::<Vec<_>>());
        emit(addresses, format, &max)
    } else {
        emit(result, format, &max)
    }
}

pub async fn debt_events(ctx: &Context, args: DebtEventArgs, action: DebtAction) -> i32 {
    let max = args.max.to_string();
    let opts = DebtEventOptions {
        min_block: args.min_block,
        account: args.account,
        max: args.max.0,
    };
    let result = match action {
        DebtAction::Issued => hzn::issued(&ctx.client, opts).await,
        DebtAction::Burned => hzn::burned(&ctx.client, opts).await,
    };
    emit(result, Format::Console, &max)
}

pub async fn fees_claimed(ctx: &Context, args: FeesClaimedArgs) -> i32 {
    let result = hzn::fees_claimed(&ctx.client, args.account.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn debt_snapshot(ctx: &Context, args: DebtSnapshotArgs) -> i32 {
    let max = args.max.to_string();
    let opts = DebtSnapshotOptions {
        account: args.account,
        min_block: args.min_block,
        max_block: args.max_block,
        max: args.max.0,
    };
    emit(hzn::debt_snapshot(&ctx.client, opts).await, Format::Console, &max)
}
