//! Depot commands.

use clap::Args;
use hzn_data::depot;

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct UserActionsArgs {
    /// An address
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub max: Limit,
}

#[derive(Args)]
pub struct ClearedDepositsArgs {
    /// A from address
    #[arg(short, long)]
    pub from_address: Option<String>,

    /// A to address
    #[arg(short, long)]
    pub to_address: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub max: Limit,
}

#[derive(Args)]
pub struct ExchangesArgs {
    /// A from address
    #[arg(short, long)]
    pub from: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub max: Limit,
}

pub async fn user_actions(ctx: &Context, args: UserActionsArgs) -> i32 {
    let result = depot::user_actions(&ctx.client, args.user.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn cleared_deposits(ctx: &Context, args: ClearedDepositsArgs) -> i32 {
    let result = depot::cleared_deposits(
        &ctx.client,
        args.from_address.as_deref(),
        args.to_address.as_deref(),
        args.max.0,
    )
    .await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn exchanges(ctx: &Context, args: ExchangesArgs) -> i32 {
    let result = depot::exchanges(&ctx.client, args.from.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}
