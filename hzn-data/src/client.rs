//! GraphQL client for the protocol subgraphs.
//!
//! Wraps a `reqwest::Client` with paging over `first`/`skip`,
//! exponential backoff retry logic, and GraphQL error handling.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{HznDataError, Result};
use crate::query::{EntityQuery, MAX_PAGE_SIZE};
use crate::subgraph::{Endpoints, Subgraph};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Exponential backoff delays in milliseconds.
const BACKOFF_DELAYS_MS: [u64; 3] = [500, 1500, 4000];

/// Jitter percentage for backoff (±10%).
const JITTER_PERCENT: f64 = 0.1;

/// Client for querying the protocol subgraphs.
///
/// # Example
///
/// ```rust,no_run
/// use hzn_data::{GraphClient, exchanges};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = GraphClient::new(Default::default())?;
///     let totals = exchanges::total(&client).await?;
///     println!("{} trades", totals.trades);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl GraphClient {
    /// Create a client with the default timeout.
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        Self::with_timeout(endpoints, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HznDataError::Http(format!("failed to build client: {}", e)))?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch every page of `query` up to `max` entities (`None` = all).
    ///
    /// Pages are requested `MAX_PAGE_SIZE` at a time; paging stops at the
    /// first short page.
    pub async fn page_results<T: DeserializeOwned>(
        &self,
        subgraph: Subgraph,
        query: &EntityQuery,
        max: Option<u32>,
    ) -> Result<Vec<T>> {
        let mut results = Vec::new();
        let mut skip = 0u32;

        loop {
            let remaining = match max {
                Some(max) => max.saturating_sub(results.len() as u32),
                None => MAX_PAGE_SIZE,
            };
            if remaining == 0 {
                break;
            }
            let first = remaining.min(MAX_PAGE_SIZE);

            let page: Vec<T> = self.fetch_page(subgraph, query, first, skip).await?;
            let page_len = page.len() as u32;
            results.extend(page);

            if page_len < first {
                break;
            }
            skip += page_len;
        }

        debug!(
            entity = query.entity(),
            count = results.len(),
            "paged query complete"
        );
        Ok(results)
    }

    /// Fetch a single entity, failing if the subgraph returns none.
    pub async fn first<T: DeserializeOwned>(
        &self,
        subgraph: Subgraph,
        query: &EntityQuery,
    ) -> Result<T> {
        let mut page: Vec<T> = self.fetch_page(subgraph, query, 1, 0).await?;
        if page.is_empty() {
            return Err(HznDataError::MissingEntity(query.entity().to_string()));
        }
        Ok(page.swap_remove(0))
    }

    /// Fetch one page and decode the entity list.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        subgraph: Subgraph,
        query: &EntityQuery,
        first: u32,
        skip: u32,
    ) -> Result<Vec<T>> {
        let text = query.render(first, skip);
        let body = self.post_with_backoff(subgraph, &text).await?;
        decode_entities(body, query.entity())
    }

    /// Post a query with exponential backoff retry.
    async fn post_with_backoff(&self, subgraph: Subgraph, query: &str) -> Result<Json> {
        let url = self.endpoints.http(subgraph);
        let mut last_error = None;

        for (attempt, base_delay) in BACKOFF_DELAYS_MS.iter().enumerate() {
            debug!(%url, attempt, query, "posting subgraph query");

            match self.post(&url, query).await {
                Ok(body) => return Ok(body),
                Err(error) => {
                    // Don't retry on non-transient errors
                    if !error.is_transient() {
                        return Err(error);
                    }

                    warn!(%url, attempt, %error, "transient subgraph failure");
                    last_error = Some(error);

                    // Apply jitter and sleep (except on last attempt)
                    if attempt < BACKOFF_DELAYS_MS.len() - 1 {
                        let jitter = rand::random::<f64>() * JITTER_PERCENT * 2.0 - JITTER_PERCENT;
                        let actual_delay = (*base_delay as f64 * (1.0 + jitter)) as u64;
                        sleep(Duration::from_millis(actual_delay)).await;
                    }
                }
            }
        }

        // All retries exhausted
        Err(last_error.unwrap_or(HznDataError::Timeout {
            attempts: BACKOFF_DELAYS_MS.len() as u32,
        }))
    }

    async fn post(&self, url: &str, query: &str) -> Result<Json> {
        let response = self
            .http
            .post(url)
            .json(&json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Json>().await?)
    }
}

/// Pull `data.<entity>` out of a GraphQL response body.
pub(crate) fn decode_entities<T: DeserializeOwned>(mut body: Json, entity: &str) -> Result<Vec<T>> {
    if let Some(errors) = body.get("errors").and_then(Json::as_array) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Json::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HznDataError::Graph(message));
        }
    }

    let items = body
        .get_mut("data")
        .and_then(|data| data.get_mut(entity))
        .map(Json::take)
        .ok_or_else(|| HznDataError::MissingEntity(entity.to_string()))?;

    serde_json::from_value(items).map_err(|e| HznDataError::Decode {
        entity: entity.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Issuer {
        id: String,
    }

    #[test]
    fn test_decode_entities() {
        let body = json!({ "data": { "issuers": [{ "id": "0x1" }, { "id": "0x2" }] } });
        let issuers: Vec<Issuer> = decode_entities(body, "issuers").unwrap();
        assert_eq!(issuers.len(), 2);
        assert_eq!(issuers[1].id, "0x2");
    }

    #[test]
    fn test_decode_graph_errors() {
        let body = json!({ "errors": [{ "message": "Type `Query` has no field `nope`" }] });
        let err = decode_entities::<Issuer>(body, "nope").unwrap_err();
        assert!(matches!(err, HznDataError::Graph(ref m) if m.contains("no field")));
    }

    #[test]
    fn test_decode_missing_entity() {
        let body = json!({ "data": {} });
        let err = decode_entities::<Issuer>(body, "issuers").unwrap_err();
        assert!(matches!(err, HznDataError::MissingEntity(_)));
    }

    #[test]
    fn test_decode_bad_shape() {
        let body = json!({ "data": { "issuers": [{ "address": "0x1" }] } });
        let err = decode_entities::<Issuer>(body, "issuers").unwrap_err();
        assert!(matches!(err, HznDataError::Decode { .. }));
    }

    #[test]
    fn test_client_builds() {
        assert!(GraphClient::new(Endpoints::default()).is_ok());
    }
}
