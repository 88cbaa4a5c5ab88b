//! Rate commands.

use clap::Args;
use hzn_data::rate::{self, UpdateOptions};
use hzn_data::{ReconnectPolicy, TimeSeries};

use super::{emit, stream, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct HznAggregateArgs {
    /// The type of timeSeries - 1d, 15m
    #[arg(short, long = "time-series", alias = "timeSeries", default_value = "1d")]
    pub time_series: TimeSeries,

    /// Maximum number of results
    #[arg(short, long, default_value = "30")]
    pub max: Limit,
}

#[derive(Args)]
pub struct UpdatesArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub max: Limit,

    /// The smallest block to include, if any
    #[arg(short = 'b', long, alias = "minBlock")]
    pub min_block: Option<u64>,

    /// The biggest block to include, if any
    #[arg(short = 'B', long, alias = "maxBlock")]
    pub max_block: Option<u64>,

    /// Zasset code
    #[arg(short = 's', long)]
    pub zasset: Option<String>,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,

    /// The oldest timestamp to include, if any
    #[arg(short = 't', long, alias = "minTimestamp")]
    pub min_timestamp: Option<i64>,

    /// The youngest timestamp to include, if any
    #[arg(short = 'T', long, alias = "maxTimestamp")]
    pub max_timestamp: Option<i64>,
}

#[derive(Args)]
pub struct DailyRateChangeArgs {
    /// Zassets to get rate changes for (default: all)
    #[arg(short = 's', long, num_args = 1..)]
    pub zassets: Vec<String>,

    /// Compare against rates 24 hours before this block
    #[arg(short, long, alias = "fromBlock")]
    pub from_block: Option<u64>,

    /// Must exceed the number of zassets in the system
    #[arg(short, long, default_value = "100")]
    pub max: Limit,
}

pub async fn hzn_aggregate(ctx: &Context, args: HznAggregateArgs) -> i32 {
    let result = rate::hzn_aggregate(&ctx.client, args.time_series, args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn updates(ctx: &Context, args: UpdatesArgs) -> i32 {
    let opts = UpdateOptions {
        min_block: args.min_block,
        max_block: args.max_block,
        min_timestamp: args.min_timestamp,
        max_timestamp: args.max_timestamp,
        zasset: args.zasset,
        max: args.max.0,
    };
    let result = rate::updates(&ctx.client, opts).await;
    emit(result, Format::from_flags(args.json, false), &args.max.to_string())
}

pub async fn daily_rate_change(ctx: &Context, args: DailyRateChangeArgs) -> i32 {
    let result = rate::daily_rate_change(&ctx.client, &args.zassets, args.from_block, args.max.0).await;
    emit(result, Format::Console, "n/a")
}

pub async fn observe(ctx: &Context) -> i32 {
    let subscription = rate::observe(&ctx.client, ReconnectPolicy::default());
    stream(subscription, "rate updates").await
}
