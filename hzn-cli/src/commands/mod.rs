//! CLI command implementations.

pub mod binary_options;
pub mod depot;
pub mod ether_collateral;
pub mod exchanger;
pub mod exchanges;
pub mod hzn;
pub mod limit_orders;
pub mod liquidations;
pub mod rate;
pub mod zassets;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use hzn_data::{Endpoints, GraphClient, HznDataError, Subscription};
use serde::Serialize;
use tracing::debug;

use crate::defaults::Defaults;
use crate::output::{self, Format};

/// Shared state handed to every command.
pub struct Context {
    pub client: GraphClient,
    pub defaults: Defaults,
}

impl Context {
    pub fn new(api_base: &str, timeout: Duration, defaults: Defaults) -> hzn_data::Result<Self> {
        let endpoints = Endpoints::new(api_base)?;
        let client = GraphClient::with_timeout(endpoints, timeout)?;
        Ok(Self { client, defaults })
    }
}

/// Result cap for `--max`; `Infinity` means no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub Option<u32>);

impl FromStr for Limit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infinity" | "inf" | "all" => Ok(Limit(None)),
            n => n
                .parse::<u32>()
                .map(|n| Limit(Some(n)))
                .map_err(|_| format!("'{}' is not a number or Infinity", s)),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => f.write_str("Infinity"),
        }
    }
}

/// Print a query's records and the debug count line; returns the exit code.
pub fn emit<T: Serialize>(result: hzn_data::Result<Vec<T>>, format: Format, max: &str) -> i32 {
    match result {
        Ok(items) => {
            if let Err(e) = output::records(&items, format) {
                output::error(&format!("Failed to write output: {}", e));
                return 1;
            }
            output::result_count(items.len(), max);
            0
        }
        Err(e) => query_failed(e),
    }
}

/// Print a single-record query result.
pub fn emit_one<T: Serialize>(result: hzn_data::Result<T>) -> i32 {
    match result {
        Ok(item) => match output::record(&item, Format::Console) {
            Ok(()) => 0,
            Err(e) => {
                output::error(&format!("Failed to write output: {}", e));
                1
            }
        },
        Err(e) => query_failed(e),
    }
}

pub fn query_failed(e: HznDataError) -> i32 {
    output::error(&format!("Query failed: {}", e));
    1
}

/// Print every item of a subscription until Ctrl-C or the stream ends.
pub async fn stream<T: Serialize>(mut subscription: Subscription<T>, what: &str) -> i32 {
    output::info(&format!("Watching {} (Ctrl-C to stop)...", what));

    loop {
        let item = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, cancelling subscription");
                break;
            }
            item = subscription.next() => item,
        };
        match item {
            Some(Ok(record)) => {
                if let Err(e) = output::record(&record, Format::Console) {
                    output::error(&format!("Failed to write output: {}", e));
                    return 1;
                }
            }
            Some(Err(e)) => output::warn(&format!("Subscription error: {}", e)),
            None => {
                output::error("Subscription ended");
                return 1;
            }
        }
    }

    subscription.shutdown().await;
    0
}
