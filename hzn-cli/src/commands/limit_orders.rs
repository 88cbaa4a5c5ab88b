//! Limit order commands.

use hzn_data::limit_orders;

use super::ether_collateral::AccountArgs;
use super::{emit, Context};
use crate::output::Format;

pub async fn orders(ctx: &Context, args: AccountArgs) -> i32 {
    let result = limit_orders::orders(&ctx.client, args.account.as_deref(), args.max.0).await;
    emit(result, Format::Console, &args.max.to_string())
}
