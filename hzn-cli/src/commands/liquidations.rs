//! Liquidation commands.

use clap::Args;
use hzn_data::liquidations::{self, TimeWindow};

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct WindowArgs {
    /// Latest time in seconds (default depends on the command)
    #[arg(short = 'T', long, alias = "maxTime")]
    pub max_time: Option<i64>,

    /// Earliest time in seconds (default depends on the command)
    #[arg(short = 't', long, alias = "minTime")]
    pub min_time: Option<i64>,

    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// Account to filter on, if any
    #[arg(short, long)]
    pub account: Option<String>,
}

impl WindowArgs {
    fn window(&self, fallback: TimeWindow) -> TimeWindow {
        TimeWindow {
            min: self.min_time.or(fallback.min),
            max: self.max_time.or(fallback.max),
        }
    }
}

pub async fn accounts_flagged(ctx: &Context, args: WindowArgs) -> i32 {
    let deadline = args.window(ctx.defaults.flagged_window());
    let result = liquidations::accounts_flagged_for_liquidation(
        &ctx.client,
        deadline,
        args.account.as_deref(),
        args.max.0,
    )
    .await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn accounts_removed(ctx: &Context, args: WindowArgs) -> i32 {
    let window = args.window(ctx.defaults.recent_window());
    let result = liquidations::accounts_removed_from_liquidation(
        &ctx.client,
        window,
        args.account.as_deref(),
        args.max.0,
    )
    .await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn accounts_liquidated(ctx: &Context, args: WindowArgs) -> i32 {
    let window = args.window(ctx.defaults.recent_window());
    let result =
        liquidations::accounts_liquidated(&ctx.client, window, args.account.as_deref(), args.max.0)
            .await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn active(ctx: &Context, args: WindowArgs) -> i32 {
    let window = args.window(ctx.defaults.recent_window());
    let result =
        liquidations::get_active_liquidations(&ctx.client, window, args.account.as_deref(), args.max.0)
            .await;
    emit(result, Format::Console, &args.max.to_string())
}
