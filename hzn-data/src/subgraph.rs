//! Subgraph endpoint configuration.

use crate::error::{HznDataError, Result};

/// Default hosted-service path the protocol subgraphs are published under.
pub const DEFAULT_API_BASE: &str = "https://api.thegraph.com/subgraphs/name/horizon-protocol";

/// The indexed datasets the data modules query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subgraph {
    Exchanges,
    Rates,
    Depot,
    Hzn,
    BinaryOptions,
    EtherCollateral,
    LimitOrders,
    Exchanger,
    Liquidations,
}

impl Subgraph {
    pub const ALL: [Subgraph; 9] = [
        Subgraph::Exchanges,
        Subgraph::Rates,
        Subgraph::Depot,
        Subgraph::Hzn,
        Subgraph::BinaryOptions,
        Subgraph::EtherCollateral,
        Subgraph::LimitOrders,
        Subgraph::Exchanger,
        Subgraph::Liquidations,
    ];

    /// Published subgraph name under the API base.
    pub fn name(self) -> &'static str {
        match self {
            Subgraph::Exchanges => "horizon-exchanges",
            Subgraph::Rates => "horizon-rates",
            Subgraph::Depot => "horizon-depot",
            Subgraph::Hzn => "horizon",
            Subgraph::BinaryOptions => "horizon-binary-options",
            Subgraph::EtherCollateral => "horizon-ether-collateral",
            Subgraph::LimitOrders => "horizon-limit-orders",
            Subgraph::Exchanger => "horizon-exchanger",
            Subgraph::Liquidations => "horizon-liquidations",
        }
    }
}

/// Resolves subgraph names to HTTP and WebSocket URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Build endpoints from an `http(s)://` base path.
    pub fn new(base: &str) -> Result<Self> {
        let base = base.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(HznDataError::InvalidEndpoint(base.to_string()));
        }
        Ok(Self {
            base: base.to_string(),
        })
    }

    /// HTTP query endpoint.
    pub fn http(&self, subgraph: Subgraph) -> String {
        format!("{}/{}", self.base, subgraph.name())
    }

    /// WebSocket subscription endpoint (same path, `ws(s)` scheme).
    pub fn ws(&self, subgraph: Subgraph) -> String {
        let http = self.http(subgraph);
        if let Some(rest) = http.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = http.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            http
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.http(Subgraph::Exchanges),
            "https://api.thegraph.com/subgraphs/name/horizon-protocol/horizon-exchanges"
        );
        assert_eq!(
            endpoints.ws(Subgraph::Rates),
            "wss://api.thegraph.com/subgraphs/name/horizon-protocol/horizon-rates"
        );
    }

    #[test]
    fn test_local_base() {
        let endpoints = Endpoints::new("http://127.0.0.1:8000/subgraphs/name/").unwrap();
        assert_eq!(
            endpoints.http(Subgraph::Hzn),
            "http://127.0.0.1:8000/subgraphs/name/horizon"
        );
        assert_eq!(
            endpoints.ws(Subgraph::Hzn),
            "ws://127.0.0.1:8000/subgraphs/name/horizon"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(Endpoints::new("not-a-url").is_err());
        assert!(Endpoints::new("ftp://example.com").is_err());
    }

    #[test]
    fn test_subgraph_names_unique() {
        let mut names: Vec<_> = Subgraph::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Subgraph::ALL.len());
    }
}
