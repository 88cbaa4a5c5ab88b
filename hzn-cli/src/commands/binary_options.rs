//! Binary option commands.

use clap::Args;
use hzn_data::binary_options::{self, MarketOptions, PriceOptions, TransactionOptions};

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct MarketsArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,

    /// The address of the market creator
    #[arg(short, long)]
    pub creator: Option<String>,

    /// Only open markets
    #[arg(short = 'o', long, alias = "isOpen")]
    pub is_open: bool,

    /// The oldest timestamp to include, if any
    #[arg(short = 't', long, alias = "minTimestamp")]
    pub min_timestamp: Option<i64>,

    /// The youngest timestamp to include, if any
    #[arg(short = 'T', long, alias = "maxTimestamp")]
    pub max_timestamp: Option<i64>,
}

#[derive(Args)]
pub struct TransactionsArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// The market address
    #[arg(short = 'M', long)]
    pub market: Option<String>,

    /// The account address
    #[arg(short, long)]
    pub account: Option<String>,
}

#[derive(Args)]
pub struct BidsArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// The account address
    #[arg(short, long)]
    pub account: Option<String>,
}

#[derive(Args)]
pub struct PriceArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "Infinity")]
    pub max: Limit,

    /// The market address
    #[arg(short = 'M', long)]
    pub market: Option<String>,

    /// The oldest timestamp to include, if any
    #[arg(short = 't', long, alias = "minTimestamp")]
    pub min_timestamp: Option<i64>,

    /// The youngest timestamp to include, if any
    #[arg(short = 'T', long, alias = "maxTimestamp")]
    pub max_timestamp: Option<i64>,
}

pub async fn markets(ctx: &Context, args: MarketsArgs) -> i32 {
    let opts = MarketOptions {
        creator: args.creator,
        is_open: args.is_open.then_some(true),
        min_timestamp: args.min_timestamp,
        max_timestamp: args.max_timestamp,
        max: args.max.0,
    };
    let result = binary_options::markets(&ctx.client, opts).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn option_transactions(ctx: &Context, args: TransactionsArgs) -> i32 {
    let opts = TransactionOptions {
        market: args.market,
        account: args.account,
        kind: None,
        max: args.max.0,
    };
    let result = binary_options::option_transactions(&ctx.client, opts).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn markets_bid_on(ctx: &Context, args: BidsArgs) -> i32 {
    let result = binary_options::markets_bid_on(&ctx.client, args.account, args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn historical_option_price(ctx: &Context, args: PriceArgs) -> i32 {
    let opts = PriceOptions {
        market: args.market,
        min_timestamp: args.min_timestamp,
        max_timestamp: args.max_timestamp,
        max: args.max.0,
    };
    let result = binary_options::historical_option_price(&ctx.client, opts).await;
    emit(result, Format::Console, &args.max.to_string())
}
