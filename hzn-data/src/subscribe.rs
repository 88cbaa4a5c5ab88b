//! Live subgraph subscriptions over WebSocket.
//!
//! Speaks the `graphql-ws` sub-protocol used by the hosted service.
//! Each subscription runs on its own task and feeds decoded records
//! into a channel; the socket is re-established with backoff when it
//! drops, until the subscription is cancelled or dropped.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::{HznDataError, Result};
use crate::query::EntityQuery;

/// Sub-protocol name negotiated with the server.
pub const GRAPHQL_WS_PROTOCOL: &str = "graphql-ws";

/// Operation id used for the single subscription on each socket.
const OPERATION_ID: &str = "1";

/// How long [`Subscription::shutdown`] waits for the goodbye frames.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Reconnect schedule for a dropped subscription socket.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Delays between consecutive attempts; the last entry repeats.
    pub delays: Vec<Duration>,
    /// Jitter fraction applied to every delay (0.1 = ±10%).
    pub jitter: f64,
    /// Give up after this many consecutive failed attempts (`None` = never).
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_millis(500),
                Duration::from_millis(1500),
                Duration::from_millis(4000),
            ],
            jitter: 0.1,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (0-based), with jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self
            .delays
            .get(attempt as usize)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::from_secs(1));
        let jitter = rand::random::<f64>() * self.jitter * 2.0 - self.jitter;
        Duration::from_millis((base.as_millis() as f64 * (1.0 + jitter)).max(0.0) as u64)
    }

    fn exhausted(&self, failures: u32) -> bool {
        matches!(self.max_attempts, Some(max) if failures >= max)
    }
}

/// Cancels a running subscription.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// A live stream of records from a subscription.
///
/// Dropping the subscription cancels the background task.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Result<T>>,
    cancel: CancelHandle,
    worker: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    /// Wait for the next record; `None` once the task has stopped.
    pub async fn next(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }

    /// Handle that can cancel the subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until the server has been told to stop and the
    /// socket is closed, or until a short grace period runs out.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if timeout(SHUTDOWN_GRACE, worker).await.is_err() {
                warn!("subscription task did not stop within {:?}", SHUTDOWN_GRACE);
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Messages the server can send.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServerMessage {
    ConnectionAck,
    KeepAlive,
    Data(Json),
    Error(String),
    Complete,
    ConnectionError(String),
    Unknown(String),
}

pub(crate) fn parse_server_message(text: &str) -> Result<ServerMessage> {
    let value: Json = serde_json::from_str(text)
        .map_err(|e| HznDataError::Protocol(format!("invalid frame: {}", e)))?;
    let kind = value
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| HznDataError::Protocol("frame without type".into()))?;

    let payload = value.get("payload").cloned().unwrap_or(Json::Null);
    Ok(match kind {
        "connection_ack" => ServerMessage::ConnectionAck,
        "ka" => ServerMessage::KeepAlive,
        "data" => {
            if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
                ServerMessage::Error(errors.to_string())
            } else {
                ServerMessage::Data(payload.get("data").cloned().unwrap_or(Json::Null))
            }
        }
        "error" => ServerMessage::Error(payload.to_string()),
        "complete" => ServerMessage::Complete,
        "connection_error" => ServerMessage::ConnectionError(payload.to_string()),
        other => ServerMessage::Unknown(other.to_string()),
    })
}

/// Subscribe to the newest entity matching `query`.
///
/// Every `data` frame is decoded as a list of `R`; its first entry is
/// converted into `T` and forwarded. Frames with an empty list are skipped.
pub fn subscribe<R, T>(url: &str, query: &EntityQuery, policy: ReconnectPolicy) -> Subscription<T>
where
    R: DeserializeOwned + Send + 'static,
    T: From<R> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(100);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let worker = Worker::<R, T> {
        url: url.to_string(),
        entity: query.entity().to_string(),
        document: format!("subscription {}", query.render(1, 0)),
        policy,
        tx,
        cancel: cancel_rx,
        _marker: PhantomData,
    };
    let worker = tokio::spawn(worker.run());

    Subscription {
        rx,
        cancel: CancelHandle(Arc::new(cancel_tx)),
        worker: Some(worker),
    }
}

enum SessionEnd {
    Cancelled,
    ReceiverGone,
    Dropped,
}

struct Worker<R, T> {
    url: String,
    entity: String,
    document: String,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<Result<T>>,
    cancel: watch::Receiver<bool>,
    _marker: PhantomData<fn() -> R>,
}

impl<R, T> Worker<R, T>
where
    R: DeserializeOwned + Send + 'static,
    T: From<R> + Send + 'static,
{
    async fn run(mut self) {
        let mut failures = 0u32;

        loop {
            if *self.cancel.borrow() {
                break;
            }

            match self.session(&mut failures).await {
                Ok(SessionEnd::Cancelled) | Ok(SessionEnd::ReceiverGone) => break,
                Ok(SessionEnd::Dropped) => {
                    warn!(url = %self.url, "subscription socket closed");
                }
                Err(error) => {
                    warn!(url = %self.url, %error, "subscription failed");
                    if !error.is_transient() {
                        let _ = self.tx.send(Err(error)).await;
                        break;
                    }
                }
            }

            if self.policy.exhausted(failures) {
                let _ = self
                    .tx
                    .send(Err(HznDataError::Timeout { attempts: failures }))
                    .await;
                break;
            }

            let delay = self.policy.delay(failures);
            failures += 1;
            info!(url = %self.url, attempt = failures, ?delay, "reconnecting subscription");

            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.cancel.changed() => break,
            }
        }
        debug!(url = %self.url, "subscription task finished");
    }

    async fn session(&mut self, failures: &mut u32) -> Result<SessionEnd> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| HznDataError::InvalidEndpoint(format!("{}: {}", self.url, e)))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(GRAPHQL_WS_PROTOCOL),
        );

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| HznDataError::WebSocket(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let init = json!({ "type": "connection_init", "payload": {} });
        write
            .send(Message::Text(init.to_string()))
            .await
            .map_err(|e| HznDataError::WebSocket(e.to_string()))?;

        loop {
            let frame = tokio::select! {
                _ = self.cancel.changed() => {
                    let stop = json!({ "id": OPERATION_ID, "type": "stop" });
                    let _ = write.send(Message::Text(stop.to_string())).await;
                    let terminate = json!({ "type": "connection_terminate" });
                    let _ = write.send(Message::Text(terminate.to_string())).await;
                    let _ = write.close().await;
                    return Ok(SessionEnd::Cancelled);
                }
                frame = read.next() => frame,
            };

            let text = match frame {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Ping(payload))) => {
                    let _ = write.send(Message::Pong(payload)).await;
                    continue;
                }
                Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Dropped),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(HznDataError::WebSocket(e.to_string())),
            };

            match parse_server_message(&text)? {
                ServerMessage::ConnectionAck => {
                    *failures = 0;
                    let start = json!({
                        "id": OPERATION_ID,
                        "type": "start",
                        "payload": { "query": self.document },
                    });
                    write
                        .send(Message::Text(start.to_string()))
                        .await
                        .map_err(|e| HznDataError::WebSocket(e.to_string()))?;
                    debug!(entity = %self.entity, "subscription started");
                }
                ServerMessage::KeepAlive => {}
                ServerMessage::Data(data) => {
                    if let Some(item) = self.decode(data) {
                        if self.tx.send(item).await.is_err() {
                            return Ok(SessionEnd::ReceiverGone);
                        }
                    }
                }
                ServerMessage::Error(message) => {
                    if self.tx.send(Err(HznDataError::Graph(message))).await.is_err() {
                        return Ok(SessionEnd::ReceiverGone);
                    }
                }
                ServerMessage::Complete => return Ok(SessionEnd::Dropped),
                ServerMessage::ConnectionError(message) => {
                    return Err(HznDataError::Protocol(message));
                }
                ServerMessage::Unknown(kind) => {
                    debug!(%kind, "ignoring unknown subscription frame");
                }
            }
        }
    }

    fn decode(&self, data: Json) -> Option<Result<T>> {
        let body = json!({ "data": data });
        match crate::client::decode_entities::<R>(body, &self.entity) {
            Ok(mut items) => {
                if items.is_empty() {
                    None
                } else {
                    Some(Ok(T::from(items.swap_remove(0))))
                }
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            parse_server_message(r#"{"type":"connection_ack"}"#).unwrap(),
            ServerMessage::ConnectionAck
        );
        assert_eq!(
            parse_server_message(r#"{"type":"ka"}"#).unwrap(),
            ServerMessage::KeepAlive
        );
        assert_eq!(
            parse_server_message(r#"{"type":"complete","id":"1"}"#).unwrap(),
            ServerMessage::Complete
        );

        let data =
            parse_server_message(r#"{"type":"data","id":"1","payload":{"data":{"rateUpdates":[]}}}"#)
                .unwrap();
        assert_eq!(data, ServerMessage::Data(json!({ "rateUpdates": [] })));
    }

    #[test]
    fn test_parse_errors() {
        let msg = parse_server_message(
            r#"{"type":"data","id":"1","payload":{"data":null,"errors":[{"message":"boom"}]}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ServerMessage::Error(ref m) if m.contains("boom")));

        assert!(parse_server_message("not json").is_err());
        assert!(parse_server_message(r#"{"id":"1"}"#).is_err());
        assert_eq!(
            parse_server_message(r#"{"type":"mystery"}"#).unwrap(),
            ServerMessage::Unknown("mystery".into())
        );
    }

    #[test]
    fn test_policy_delays() {
        let policy = ReconnectPolicy {
            jitter: 0.0,
            ..Default::default()
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1500));
        assert_eq!(policy.delay(2), Duration::from_millis(4000));
        // capped at the last delay
        assert_eq!(policy.delay(9), Duration::from_millis(4000));
        assert!(!policy.exhausted(100));

        let bounded = ReconnectPolicy {
            max_attempts: Some(2),
            ..policy
        };
        assert!(!bounded.exhausted(1));
        assert!(bounded.exhausted(2));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = ReconnectPolicy::default();
        for _ in 0..50 {
            let d = policy.delay(0).as_millis();
            assert!((450..=550).contains(&d), "delay {} out of range", d);
        }
    }
}
