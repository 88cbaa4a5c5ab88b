//! Horizon Protocol data CLI
//!
//! Query the protocol subgraphs from the terminal.

mod aggregate;
mod commands;
mod defaults;
mod output;

use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use hzn_data::exchanges::SettlementKind;
use hzn_data::subgraph::DEFAULT_API_BASE;
use tracing_subscriber::EnvFilter;

use commands::Context;
use defaults::Defaults;

#[derive(Parser)]
#[command(name = "horizon-data")]
#[command(version = "0.1.0")]
#[command(about = "Horizon Protocol data - query the protocol subgraphs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL the subgraphs are published under
    #[arg(long, global = true, env = "HZN_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Depot deposits and withdrawals
    #[command(name = "depot.userActions")]
    DepotUserActions(commands::depot::UserActionsArgs),

    /// Depot deposits cleared by purchases
    #[command(name = "depot.clearedDeposits")]
    DepotClearedDeposits(commands::depot::ClearedDepositsArgs),

    /// ETH to zUSD exchanges through the depot
    #[command(name = "depot.exchanges")]
    DepotExchanges(commands::depot::ExchangesArgs),

    /// Lifetime exchange totals
    #[command(name = "exchanges.total")]
    ExchangesTotal,

    /// Exchange totals per period
    #[command(name = "exchanges.aggregate")]
    ExchangesAggregate(commands::exchanges::AggregateArgs),

    /// Exchanges since a point in time
    #[command(name = "exchanges.since")]
    ExchangesSince(commands::exchanges::SinceArgs),

    /// Exchange reclaims with a USD total
    #[command(name = "exchanges.reclaims")]
    ExchangesReclaims(commands::exchanges::SettlementArgs),

    /// Exchange rebates with a USD total
    #[command(name = "exchanges.rebates")]
    ExchangesRebates(commands::exchanges::SettlementArgs),

    /// Exchange volume, fees and traders per day, week or month
    #[command(name = "exchanges.grouped")]
    ExchangesGrouped(commands::exchanges::GroupedArgs),

    /// Stream new exchanges
    #[command(name = "exchanges.observe")]
    ExchangesObserve,

    /// Addresses that have issued zassets
    #[command(name = "zassets.issuers")]
    ZassetsIssuers(commands::zassets::IssuersArgs),

    /// Zasset transfers
    #[command(name = "zassets.transfers")]
    ZassetsTransfers(commands::zassets::TransfersArgs),

    /// Zasset holders by balance
    #[command(name = "zassets.holders")]
    ZassetsHolders(commands::zassets::HoldersArgs),

    /// Average HZN price per period
    #[command(name = "rate.hznAggregate")]
    RateHznAggregate(commands::rate::HznAggregateArgs),

    /// Oracle rate updates
    #[command(name = "rate.updates")]
    RateUpdates(commands::rate::UpdatesArgs),

    /// 24 hour rate change per zasset
    #[command(name = "rate.dailyRateChange")]
    RateDailyRateChange(commands::rate::DailyRateChangeArgs),

    /// Stream new rate updates
    #[command(name = "rate.observe")]
    RateObserve,

    /// HZN holders by collateral
    #[command(name = "hzn.holders")]
    HznHolders(commands::hzn::HoldersArgs),

    /// Issuer and holder counts
    #[command(name = "hzn.total")]
    HznTotal,

    /// Active stakers per day
    #[command(name = "hzn.aggregateActiveStakers")]
    HznAggregateActiveStakers(commands::hzn::MaxArgs),

    /// Current active staker count
    #[command(name = "hzn.totalActiveStakers")]
    HznTotalActiveStakers,

    /// HZN transfers
    #[command(name = "hzn.transfers")]
    HznTransfers(commands::hzn::TransfersArgs),

    /// Escrowed staking rewards
    #[command(name = "hzn.rewards")]
    HznRewards(commands::hzn::RewardsArgs),

    /// zUSD burned by stakers
    #[command(name = "hzn.burned")]
    HznBurned(commands::hzn::DebtEventArgs),

    /// zUSD issued by stakers
    #[command(name = "hzn.issued")]
    HznIssued(commands::hzn::DebtEventArgs),

    /// Fee and reward claims
    #[command(name = "hzn.feesClaimed")]
    HznFeesClaimed(commands::hzn::FeesClaimedArgs),

    /// Staker debt snapshots
    #[command(name = "hzn.debtSnapshot")]
    HznDebtSnapshot(commands::hzn::DebtSnapshotArgs),

    /// Binary option markets
    #[command(name = "binaryOptions.markets")]
    BinaryOptionsMarkets(commands::binary_options::MarketsArgs),

    /// Binary option transactions
    #[command(name = "binaryOptions.optionTransactions")]
    BinaryOptionsOptionTransactions(commands::binary_options::TransactionsArgs),

    /// Markets an account has bid on
    #[command(name = "binaryOptions.marketsBidOn")]
    BinaryOptionsMarketsBidOn(commands::binary_options::BidsArgs),

    /// Price history of a binary option market
    #[command(name = "binaryOptions.historicalOptionPrice")]
    BinaryOptionsHistoricalOptionPrice(commands::binary_options::PriceArgs),

    /// ETH-backed loans
    #[command(name = "etherCollateral.loans")]
    EtherCollateralLoans(commands::ether_collateral::LoansArgs),

    /// Partially liquidated loans
    #[command(name = "etherCollateral.partiallyLiquidatedLoans")]
    EtherCollateralPartiallyLiquidatedLoans(commands::ether_collateral::AccountArgs),

    /// Liquidated loans
    #[command(name = "etherCollateral.liquidatedLoans")]
    EtherCollateralLiquidatedLoans(commands::ether_collateral::AccountArgs),

    /// Limit orders
    #[command(name = "limitOrders.orders")]
    LimitOrdersOrders(commands::ether_collateral::AccountArgs),

    /// Settled exchange entries
    #[command(name = "exchanger.exchangeEntriesSettled")]
    ExchangerExchangeEntriesSettled(commands::exchanger::EntriesSettledArgs),

    /// Accounts flagged for liquidation
    #[command(name = "liquidations.accountsFlaggedForLiquidation")]
    LiquidationsAccountsFlagged(commands::liquidations::WindowArgs),

    /// Accounts removed from liquidation
    #[command(name = "liquidations.accountsRemovedFromLiquidation")]
    LiquidationsAccountsRemoved(commands::liquidations::WindowArgs),

    /// Liquidated accounts
    #[command(name = "liquidations.accountsLiquidated")]
    LiquidationsAccountsLiquidated(commands::liquidations::WindowArgs),

    /// Flagged accounts not yet fixed or liquidated
    #[command(name = "liquidations.getActiveLiquidations")]
    LiquidationsGetActive(commands::liquidations::WindowArgs),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let defaults = Defaults::at(Utc::now());
    let ctx = match Context::new(&cli.api_base, Duration::from_secs(cli.timeout), defaults) {
        Ok(ctx) => ctx,
        Err(e) => {
            output::error(&format!("Invalid configuration: {}", e));
            std::process::exit(1);
        }
    };

    use commands::*;
    let exit_code = match cli.command {
        Commands::DepotUserActions(args) => depot::user_actions(&ctx, args).await,
        Commands::DepotClearedDeposits(args) => depot::cleared_deposits(&ctx, args).await,
        Commands::DepotExchanges(args) => depot::exchanges(&ctx, args).await,
        Commands::ExchangesTotal => exchanges::total(&ctx).await,
        Commands::ExchangesAggregate(args) => exchanges::aggregate(&ctx, args).await,
        Commands::ExchangesSince(args) => exchanges::since(&ctx, args).await,
        Commands::ExchangesReclaims(args) => {
            exchanges::settlements(&ctx, args, SettlementKind::Reclaim).await
        }
        Commands::ExchangesRebates(args) => {
            exchanges::settlements(&ctx, args, SettlementKind::Rebate).await
        }
        Commands::ExchangesGrouped(args) => exchanges::grouped(&ctx, args).await,
        Commands::ExchangesObserve => exchanges::observe(&ctx).await,
        Commands::ZassetsIssuers(args) => zassets::issuers(&ctx, args).await,
        Commands::ZassetsTransfers(args) => zassets::transfers(&ctx, args).await,
        Commands::ZassetsHolders(args) => zassets::holders(&ctx, args).await,
        Commands::RateHznAggregate(args) => rate::hzn_aggregate(&ctx, args).await,
        Commands::RateUpdates(args) => rate::updates(&ctx, args).await,
        Commands::RateDailyRateChange(args) => rate::daily_rate_change(&ctx, args).await,
        Commands::RateObserve => rate::observe(&ctx).await,
        Commands::HznHolders(args) => hzn::holders(&ctx, args).await,
        Commands::HznTotal => hzn::total(&ctx).await,
        Commands::HznAggregateActiveStakers(args) => hzn::aggregate_active_stakers(&ctx, args).await,
        Commands::HznTotalActiveStakers => hzn::total_active_stakers(&ctx).await,
        Commands::HznTransfers(args) => hzn::transfers(&ctx, args).await,
        Commands::HznRewards(args) => hzn::rewards(&ctx, args).await,
        Commands::HznBurned(args) => hzn::debt_events(&ctx, args, hzn::DebtAction::Burned).await,
        Commands::HznIssued(args) => hzn::debt_events(&ctx, args, hzn::DebtAction::Issued).await,
        Commands::HznFeesClaimed(args) => hzn::fees_claimed(&ctx, args).await,
        Commands::HznDebtSnapshot(args) => hzn::debt_snapshot(&ctx, args).await,
        Commands::BinaryOptionsMarkets(args) => binary_options::markets(&ctx, args).await,
        Commands::BinaryOptionsOptionTransactions(args) => {
            binary_options::option_transactions(&ctx, args).await
        }
        Commands::BinaryOptionsMarketsBidOn(args) => binary_options::markets_bid_on(&ctx, args).await,
        Commands::BinaryOptionsHistoricalOptionPrice(args) => {
            binary_options::historical_option_price(&ctx, args).await
        }
        Commands::EtherCollateralLoans(args) => ether_collateral::loans(&ctx, args).await,
        Commands::EtherCollateralPartiallyLiquidatedLoans(args) => {
            ether_collateral::partially_liquidated_loans(&ctx, args).await
        }
        Commands::EtherCollateralLiquidatedLoans(args) => {
            ether_collateral::liquidated_loans(&ctx, args).await
        }
        Commands::LimitOrdersOrders(args) => limit_orders::orders(&ctx, args).await,
        Commands::ExchangerExchangeEntriesSettled(args) => {
            exchanger::exchange_entries_settled(&ctx, args).await
        }
        Commands::LiquidationsAccountsFlagged(args) => liquidations::accounts_flagged(&ctx, args).await,
        Commands::LiquidationsAccountsRemoved(args) => liquidations::accounts_removed(&ctx, args).await,
        Commands::LiquidationsAccountsLiquidated(args) => {
            liquidations::accounts_liquidated(&ctx, args).await
        }
        Commands::LiquidationsGetActive(args) => liquidations::active(&ctx, args).await,
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dotted_command_names() {
        let cli = Cli::try_parse_from(["horizon-data", "exchanges.since", "-m", "5", "-j"]).unwrap();
        match cli.command {
            Commands::ExchangesSince(args) => {
                assert_eq!(args.max.0, Some(5));
                assert!(args.json);
                assert_eq!(args.min_timestamp, None);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_camel_case_aliases() {
        let cli = Cli::try_parse_from([
            "horizon-data",
            "rate.updates",
            "--minTimestamp",
            "100",
            "-T",
            "200",
        ])
        .unwrap();
        match cli.command {
            Commands::RateUpdates(args) => {
                assert_eq!(args.min_timestamp, Some(100));
                assert_eq!(args.max_timestamp, Some(200));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_flagged_liquidation_short_flags() {
        let cli = Cli::try_parse_from([
            "horizon-data",
            "liquidations.accountsFlaggedForLiquidation",
            "-t",
            "10",
            "-T",
            "20",
        ])
        .unwrap();
        match cli.command {
            Commands::LiquidationsAccountsFlagged(args) => {
                assert_eq!(args.min_time, Some(10));
                assert_eq!(args.max_time, Some(20));
                assert_eq!(args.max.0, None);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["horizon-data", "exchanges.nope"]).is_err());
    }
}
