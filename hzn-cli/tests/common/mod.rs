#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct TestEnv {
    pub server: MockServer,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// The CLI pointed at the mock subgraph server.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("horizon-data").unwrap();
        cmd.env("HZN_API_BASE", self.server.uri());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("DEBUG");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Answer queries for `entity` on `subgraph` with `items`.
    pub async fn mock_entities(&self, subgraph: &str, entity: &str, items: Value) {
        let mut data = serde_json::Map::new();
        data.insert(entity.to_string(), items);

        Mock::given(method("POST"))
            .and(path(format!("/{}", subgraph)))
            .and(body_string_contains(format!("{}(", entity)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&self.server)
            .await;
    }

    /// Answer every query with a GraphQL error.
    pub async fn mock_graph_error(&self, message: &str) {
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "errors": [{ "message": message }] })),
            )
            .mount(&self.server)
            .await;
    }
}

/// A raw `synthExchanges` entity as the subgraph returns it.
pub fn exchange_entity(id: &str, from: &str, usd: &str, fees: &str, timestamp: u64) -> Value {
    json!({
        "id": id,
        "from": from,
        "gasPrice": "5000000000",
        "fromAmount": usd,
        "fromAmountInUSD": usd,
        "fromCurrencyKey": "0x7a55534400000000000000000000000000000000000000000000000000000000",
        "toCurrencyKey": "0x7a42544300000000000000000000000000000000000000000000000000000000",
        "toAddress": from,
        "toAmount": "1000000000000000",
        "toAmountInUSD": usd,
        "feesInUSD": fees,
        "block": "1000",
        "timestamp": timestamp.to_string()
    })
}

/// `n` whole dollars as an 18 decimal BigInt string.
pub fn usd(n: u64) -> String {
    format!("{}000000000000000000", n)
}
