//! Zasset commands.

use clap::Args;
use hzn_data::zassets::{self, HolderOptions, TransferOptions};

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct IssuersArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,
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

    /// Zasset code
    #[arg(short = 's', long)]
    pub zasset: Option<String>,
}

#[derive(Args)]
pub struct HoldersArgs {
    /// Address to filter on, if any
    #[arg(short, long)]
    pub address: Option<String>,

    /// The zasset currency key
    #[arg(short = 's', long)]
    pub zasset: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,

    /// Show addresses only
    #[arg(short = 'o', long)]
    pub addresses_only: bool,

    /// Display the results as JSON
    #[arg(short, long)]
    pub json: bool,
}

pub async fn issuers(ctx: &Context, args: IssuersArgs) -> i32 {
    let result = zassets::issuers(&ctx.client, args.max.0).await;
    emit(result, Format::from_flags(args.json, false), &args.max.to_string())
}

pub async fn transfers(ctx: &Context, args: TransfersArgs) -> i32 {
    let opts = TransferOptions {
        zasset: args.zasset,
        from: args.from,
        to: args.to,
        max: args.max.0,
    };
    let result = zassets::transfers(&ctx.client, opts).await;
    emit(result, Format::Console, &args.max.to_string())
}

pub async fn holders(ctx: &Context, args: HoldersArgs) -> i32 {
    let opts = HolderOptions {
        address: args.address,
        zasset: args.zasset,
        max: args.max.0,
    };
    let format = Format::from_flags(args.json, false);
    let max = args.max.to_string();
    let result = zassets::holders(&ctx.client, opts).await;

    if args.addresses_only {
        let addresses = result.map(|holders| holders.into_iter().map(|h| h.address).collect::<Vec<_>>());
        emit(addresses, format, &max)
    } else {
        emit(result, format, &max)
    }
}
