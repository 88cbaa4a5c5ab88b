//! Exchanger commands.

use clap::Args;
use hzn_data::exchanger;

use super::{emit, Context, Limit};
use crate::output::Format;

#[derive(Args)]
pub struct EntriesSettledArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "100")]
    pub max: Limit,

    /// A from address
    #[arg(short, long)]
    pub from: Option<String>,
}

pub async fn exchange_entries_settled(ctx: &Context, args: EntriesSettledArgs) -> i32 {
    let result =
        exchanger::exchange_entries_settled(&ctx.client, args.from.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}
