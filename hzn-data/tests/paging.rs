use hzn_data::{zassets, Endpoints, GraphClient, HznDataError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn issuers(range: std::ops::Range<u32>) -> serde_json::Value {
    let items: Vec<_> = range.map(|i| json!({ "id": format!("0x{:040x}", i) })).collect();
    json!({ "data": { "issuers": items } })
}

async fn client_for(server: &MockServer) -> GraphClient {
    let endpoints = Endpoints::new(&server.uri()).expect("mock server uri is http");
    GraphClient::with_timeout(endpoints, Duration::from_secs(5)).expect("client builds")
}

#[tokio::test]
async fn test_pages_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/horizon"))
        .and(body_string_contains("skip: 0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issuers(0..1000)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/horizon"))
        .and(body_string_contains("skip: 1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issuers(1000..1250)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let all = zassets::issuers(&client, None).await.unwrap();

    assert_eq!(all.len(), 1250);
    assert_eq!(all[1249], format!("0x{:040x}", 1249));
}

#[tokio::test]
async fn test_max_caps_page_size() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("first: 3, skip: 0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issuers(0..3)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let capped = zassets::issuers(&client, Some(3)).await.unwrap();
    assert_eq!(capped.len(), 3);
}

#[tokio::test]
async fn test_graph_errors_surface() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "indexing_error" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = zassets::issuers(&client, Some(10)).await.unwrap_err();
    assert!(matches!(err, HznDataError::Graph(ref m) if m == "indexing_error"));
}

#[tokio::test]
async fn test_transient_status_is_retried() {
    let server = MockServer::start().await;

    // First registered mock wins until it is used up.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issuers(0..2)))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let recovered = zassets::issuers(&client, Some(10)).await.unwrap();
    assert_eq!(recovered.len(), 2);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = zassets::issuers(&client, Some(10)).await.unwrap_err();
    assert!(matches!(err, HznDataError::HttpStatus { status: 404 }));
}
