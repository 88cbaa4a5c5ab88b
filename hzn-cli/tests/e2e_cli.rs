mod common;
use common::{usd, TestEnv};
use predicates::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_help_lists_dotted_commands() {
    let env = TestEnv::new().await;
    env.cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("exchanges.grouped"))
        .stdout(predicate::str::contains("liquidations.getActiveLiquidations"));
}

#[tokio::test]
async fn test_unknown_command_is_usage_error() {
    let env = TestEnv::new().await;
    env.cli().arg("exchanges.nope").assert().code(2);
}

#[tokio::test]
async fn test_bad_max_is_usage_error() {
    let env = TestEnv::new().await;
    env.cli()
        .args(["zassets.issuers", "-m", "lots"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a number or Infinity"));
}

#[tokio::test]
async fn test_graph_error_exits_one() {
    let env = TestEnv::new().await;
    env.mock_graph_error("indexing_error").await;

    env.cli()
        .arg("zassets.issuers")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Query failed"))
        .stderr(predicate::str::contains("indexing_error"));
}

#[tokio::test]
async fn test_invalid_api_base() {
    let env = TestEnv::new().await;
    env.cli()
        .args(["--api-base", "ftp://example.com", "hzn.total"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[tokio::test]
async fn test_holders_addresses_only_keep_order() {
    let env = TestEnv::new().await;
    env.mock_entities(
        "horizon",
        "zassetHolders",
        json!([
            { "id": "1", "address": "0xbig", "balanceOf": usd(900), "zasset": "zUSD" },
            { "id": "2", "address": "0xmid", "balanceOf": usd(50), "zasset": "zUSD" },
            { "id": "3", "address": "0xsmall", "balanceOf": usd(1), "zasset": "zUSD" }
        ]),
    )
    .await;

    let output = env
        .cli()
        .args(["zassets.holders", "-s", "zUSD", "-o", "-j"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let addresses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(addresses, json!(["0xbig", "0xmid", "0xsmall"]));
}

#[tokio::test]
async fn test_debug_reports_result_count() {
    let env = TestEnv::new().await;
    env.mock_entities("horizon", "issuers", json!([{ "id": "0x1" }, { "id": "0x2" }]))
        .await;

    env.cli()
        .env("DEBUG", "1")
        .arg("zassets.issuers")
        .assert()
        .success()
        .stdout(predicate::str::contains("0x1"))
        .stdout(predicate::str::contains("2 entries returned (max supplied: 100)"));
}

#[tokio::test]
async fn test_count_hidden_without_debug() {
    let env = TestEnv::new().await;
    env.mock_entities("horizon", "issuers", json!([{ "id": "0x1" }])).await;

    env.cli()
        .args(["zassets.issuers", "-j"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries returned").not());
}

#[tokio::test]
async fn test_hzn_holders_scale_units() {
    let env = TestEnv::new().await;
    env.mock_entities(
        "horizon",
        "hznHolders",
        json!([{
            "id": "0xstaker",
            "block": "5",
            "timestamp": "1600000000",
            "balanceOf": usd(1000),
            "collateral": usd(1200),
            "transferable": usd(200),
            "initialDebtOwnership": "500000000000000000000000000",
            "debtEntryAtIndex": "1000000000000000000000000000",
            "claims": "2",
            "mints": "1"
        }]),
    )
    .await;

    let output = env
        .cli()
        .args(["hzn.holders", "-n", "100", "-j"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let holders: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(holders[0]["address"], "0xstaker");
    assert_eq!(holders[0]["collateral"], 1200.0);
    assert_eq!(holders[0]["initialDebtOwnership"], 0.5);
    assert_eq!(holders[0]["debtEntryAtIndex"], 1.0);
}

#[tokio::test]
async fn test_empty_debug_hides_count() {
    let env = TestEnv::new().await;
    env.mock_entities("horizon", "issuers", json!([{ "id": "0x1" }])).await;

    env.cli()
        .env("DEBUG", "")
        .arg("zassets.issuers")
        .assert()
        .success()
        .stdout(predicate::str::contains("0x1"))
        .stdout(predicate::str::contains("entries returned").not());
}
