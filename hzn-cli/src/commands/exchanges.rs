//! Exchange commands.

use clap::Args;
use hzn_data::exchanges::{self, SettlementKind, SettlementOptions, SinceOptions};
use hzn_data::{ReconnectPolicy, TimeSeries};

use super::{emit, emit_one, query_failed, stream, Context, Limit};
use crate::aggregate::{self, Trade, Unit};
use crate::output::{self, Format};

#[derive(Args)]
pub struct AggregateArgs {
    /// The type of timeSeries - 1d, 15m
    #[arg(short, long = "time-series", alias = "timeSeries", default_value = "1d")]
    pub time_series: TimeSeries,

    /// Maximum number of results
    #[arg(short, long, default_value = "30")]
    pub max: Limit,
}

#[derive(Args)]
pub struct SinceArgs {
    /// Oldest timestamp in seconds (default: 24 hours ago)
    #[arg(short = 't', long, alias = "minTimestamp")]
    pub min_timestamp: Option<i64>,

    /// The smallest block to include, if any
    #[arg(short = 'b', long, alias = "minBlock")]
    pub min_block: Option<u64>,

    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// A from address
    #[arg(short, long, alias = "fromAddress")]
    pub from_address: Option<String>,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Display the results as CSV
    #[arg(short, long)]
    pub csv: bool,
}

#[derive(Args)]
pub struct SettlementArgs {
    /// Oldest timestamp in seconds (default: 24 hours ago)
    #[arg(short = 't', long, alias = "minTimestamp")]
    pub min_timestamp: Option<i64>,

    /// The smallest block to include, if any
    #[arg(short = 'b', long, alias = "minBlock")]
    pub min_block: Option<u64>,

    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// An address
    #[arg(short, long)]
    pub account: Option<String>,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GroupedArgs {
    /// The type of unit
    #[arg(short = 't', long = "type", value_enum, default_value_t = Unit::Days)]
    pub kind: Unit,

    /// Number of units back to include prior to the current one
    #[arg(short = 'n', long = "unit", default_value_t = 0)]
    pub units: u32,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Display the results as CSV
    #[arg(short, long)]
    pub csv: bool,

    /// Emit zeroed buckets for units without trades
    #[arg(long)]
    pub fill_gaps: bool,
}

pub async fn total(ctx: &Context) -> i32 {
    emit_one(exchanges::total(&ctx.client).await)
}

pub async fn aggregate(ctx: &Context, args: AggregateArgs) -> i32 {
    let result = exchanges::aggregate(&ctx.client, args.time_series, args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn since(ctx: &Context, args: SinceArgs) -> i32 {
    let opts = SinceOptions {
        min_timestamp: Some(args.min_timestamp.unwrap_or_else(|| ctx.defaults.day_ago())),
        min_block: args.min_block,
        from_address: args.from_address,
        max: args.max.0,
        ..Default::default()
    };
    let result = exchanges::since(&ctx.client, opts).await;
    emit(result, Format::from_flags(args.json, args.csv), &args.max.to_string())
}

pub async fn settlements(ctx: &Context, args: SettlementArgs, kind: SettlementKind) -> i32 {
    let opts = SettlementOptions {
        min_timestamp: Some(args.min_timestamp.unwrap_or_else(|| ctx.defaults.day_ago())),
        min_block: args.min_block,
        account: args.account,
        max: args.max.0,
    };
    let entries = match exchanges::settlements(&ctx.client, kind, opts).await {
        Ok(entries) => entries,
        Err(e) => return query_failed(e),
    };

    let format = Format::from_flags(args.json, false);
    if let Err(e) = output::records(&entries, format) {
        output::error(&format!("Failed to write output: {}", e));
        return 1;
    }

    let total_usd: f64 = entries.iter().map(|e| e.amount_in_usd).sum();
    println!("----------------------");
    println!("Number of entries: {}", entries.len());
    println!("Total in USD ${}", total_usd.round() as i64);
    0
}

pub async fn grouped(ctx: &Context, args: GroupedArgs) -> i32 {
    let min_timestamp = match aggregate::window_start(args.kind, args.units, ctx.defaults.now()) {
        Ok(start) => start,
        Err(e) => {
            output::error(&e.to_string());
            return 1;
        }
    };
    let opts = SinceOptions {
        min_timestamp: Some(min_timestamp),
        ..Default::default()
    };
    let records = match exchanges::since(&ctx.client, opts).await {
        Ok(records) => records,
        Err(e) => return query_failed(e),
    };

    let trades: Vec<Trade> = records.iter().map(Trade::from).collect();
    let grouped = match aggregate::group(&trades, args.kind) {
        Ok(grouped) => grouped,
        Err(e) => {
            output::error(&e.to_string());
            return 1;
        }
    };

    let format = Format::from_flags(args.json, args.csv);
    let written = match (format, args.fill_gaps) {
        (_, true) => output::records(&grouped.filled(), format),
        (Format::Json, false) => output::records(&grouped.sparse(), format),
        (_, false) => output::records(&grouped.present(), format),
    };
    match written {
        Ok(()) => 0,
        Err(e) => {
            output::error(&format!("Failed to write output: {}", e));
            1
        }
    }
}

pub async fn observe(ctx: &Context) -> i32 {
    let subscription = exchanges::observe(&ctx.client, ReconnectPolicy::default());
    stream(subscription, "zasset exchanges").await
}
