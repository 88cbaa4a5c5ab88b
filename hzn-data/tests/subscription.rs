use futures_util::{SinkExt, StreamExt};
use hzn_data::{rate, Endpoints, GraphClient, ReconnectPolicy};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

/// Accepts one graphql-ws client and pushes `updates` after `start`.
async fn serve_once(listener: TcpListener, updates: Vec<Value>) -> Vec<String> {
    let (stream, _) = listener.accept().await.unwrap();
    let ws = tokio_tungstenite::accept_hdr_async(stream, |_req: &Request, mut resp: Response| {
        resp.headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("graphql-ws"));
        Ok::<Response, ErrorResponse>(resp)
    })
    .await
    .unwrap();
    let (mut write, mut read) = ws.split();
    let mut seen = Vec::new();

    while let Some(Ok(msg)) = read.next().await {
        let Message::Text(text) = msg else { continue };
        let frame: Value = serde_json::from_str(&text).unwrap();
        let kind = frame["type"].as_str().unwrap_or_default().to_string();
        seen.push(kind.clone());

        match kind.as_str() {
            "connection_init" => {
                let ack = json!({ "type": "connection_ack" });
                write.send(Message::Text(ack.to_string())).await.unwrap();
            }
            "start" => {
                assert!(frame["payload"]["query"]
                    .as_str()
                    .unwrap()
                    .starts_with("subscription { rateUpdates(first: 1"));
                let ka = json!({ "type": "ka" });
                write.send(Message::Text(ka.to_string())).await.unwrap();
                for update in &updates {
                    let data = json!({
                        "type": "data",
                        "id": "1",
                        "payload": { "data": { "rateUpdates": [update] } }
                    });
                    write.send(Message::Text(data.to_string())).await.unwrap();
                }
            }
            "connection_terminate" => break,
            _ => {}
        }
    }
    seen
}

#[tokio::test]
async fn test_observe_streams_decoded_updates() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(serve_once(
        listener,
        vec![
            json!({ "id": "0xa-1", "zasset": "zBTC", "rate": "30000000000000000000000", "block": "10", "timestamp": "1600000000" }),
            json!({ "id": "0xb-2", "zasset": "zETH", "rate": "2000000000000000000000", "block": "11", "timestamp": "1600000060" }),
        ],
    ));

    let endpoints = Endpoints::new(&format!("http://{}", addr)).unwrap();
    let client = GraphClient::new(endpoints).unwrap();
    let mut sub = rate::observe(&client, ReconnectPolicy::default());

    let first = timeout(Duration::from_secs(5), sub.next())
        .await
        .expect("first update in time")
        .expect("stream open")
        .expect("decoded");
    assert_eq!(first.zasset, "zBTC");
    assert_eq!(first.rate, 30000.0);
    assert_eq!(first.hash, "0xa");

    let second = timeout(Duration::from_secs(5), sub.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.zasset, "zETH");
    assert_eq!(second.timestamp, 1_600_000_060_000);

    sub.cancel();
    let seen = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert_eq!(seen, vec!["connection_init", "start", "stop", "connection_terminate"]);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    // Bind then drop so nothing is listening on the port.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let endpoints = Endpoints::new(&format!("http://{}", addr)).unwrap();
    let client = GraphClient::new(endpoints).unwrap();
    let policy = ReconnectPolicy {
        delays: vec![Duration::from_millis(10)],
        jitter: 0.0,
        max_attempts: Some(2),
    };
    let mut sub = rate::observe(&client, policy);

    let outcome = timeout(Duration::from_secs(5), sub.next())
        .await
        .expect("worker reports failure")
        .expect("error item");
    assert!(outcome.is_err());
    assert!(timeout(Duration::from_secs(5), sub.next()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_shutdown_waits_for_goodbye_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(serve_once(
        listener,
        vec![json!({ "id": "0xc-3", "zasset": "zUSD", "rate": "1000000000000000000", "block": "12", "timestamp": "1600000120" })],
    ));

    let endpoints = Endpoints::new(&format!("http://{}", addr)).unwrap();
    let client = GraphClient::new(endpoints).unwrap();
    let mut sub = rate::observe(&client, ReconnectPolicy::default());

    let update = timeout(Duration::from_secs(5), sub.next())
        .await
        .expect("update in time")
        .expect("stream open")
        .expect("decoded");
    assert_eq!(update.zasset, "zUSD");

    timeout(Duration::from_secs(5), sub.shutdown())
        .await
        .expect("shutdown completes");

    // The worker has already sent stop and terminate, so the server is done.
    let seen = timeout(Duration::from_secs(1), server).await.unwrap().unwrap();
    assert_eq!(seen, vec!["connection_init", "start", "stop", "connection_terminate"]);
}

#[tokio::test]
async fn test_shutdown_after_worker_gave_up() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let endpoints = Endpoints::new(&format!("http://{}", addr)).unwrap();
    let client = GraphClient::new(endpoints).unwrap();
    let policy = ReconnectPolicy {
        delays: vec![Duration::from_millis(10)],
        jitter: 0.0,
        max_attempts: Some(1),
    };
    let mut sub = rate::observe(&client, policy);

    while timeout(Duration::from_secs(5), sub.next()).await.unwrap().is_some() {}
    timeout(Duration::from_secs(1), sub.shutdown())
        .await
        .expect("finished worker is joined at once");
}
