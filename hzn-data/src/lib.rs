//! # hzn-data
//!
//! **Typed queries against the Horizon Protocol subgraphs**
//!
//! Every protocol event worth looking at (zasset exchanges, rate updates,
//! staking, depot activity, binary options, loans, liquidations) is indexed
//! on The Graph. This crate builds the GraphQL entity queries, pages through
//! the results and decodes the raw entities into records with the unit
//! conversions already applied.
//!
//! ## Features
//!
//! - **Paged**: `max` caps results; pages of up to 1000 are fetched until
//!   exhausted
//! - **Resilient**: transient HTTP failures retry with jittered backoff
//! - **Live**: `exchanges::observe` and `rate::observe` stream the newest
//!   entity over a cancellable, self-reconnecting subscription
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hzn_data::{exchanges, Endpoints, GraphClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GraphClient::new(Endpoints::default())?;
//!
//!     let recent = exchanges::since(
//!         &client,
//!         exchanges::SinceOptions {
//!             max: Some(5),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     for exchange in recent {
//!         println!("{} {} -> {}", exchange.hash, exchange.from_currency_key, exchange.to_currency_key);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod de;
pub mod error;
pub mod query;
pub mod subgraph;
pub mod subscribe;

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

// Re-export main types for convenience
pub use client::GraphClient;
pub use error::{HznDataError, Result};
pub use query::{EntityQuery, OrderDirection, TimeSeries};
pub use subgraph::{Endpoints, Subgraph};
pub use subscribe::{CancelHandle, ReconnectPolicy, Subscription};
