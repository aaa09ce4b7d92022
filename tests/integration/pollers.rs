//! Pollers against a mock node over HTTP

use std::sync::Arc;
use std::time::Duration;

use nodewatch::actors::poller::Poller;
use nodewatch::display::{MemorySink, Panel};
use nodewatch::handlers::polls;
use nodewatch::rpc::types::{NetInfoResult, StatusResult};
use nodewatch::rpc::{HttpRpcClient, RpcClient, fetch_result};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

async fn client_for(server: &MockServer) -> Arc<HttpRpcClient> {
    let base = url::Url::parse(&format!("{}/", server.uri())).unwrap();
    Arc::new(HttpRpcClient::new(base, Duration::from_secs(2)).unwrap())
}

#[tokio::test]
async fn test_poller_recovers_after_server_error() {
    let mock_server = MockServer::start().await;

    // First request fails, later ones succeed
    Mock::given(method("GET"))
        .and(path("/net_info"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/net_info"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rpc_ok(serde_json::json!({"n_peers": "12"}))),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let sink = MemorySink::new();
    let cancel = CancellationToken::new();

    let task = {
        let sink = sink.clone();
        let client = client.clone();
        tokio::spawn(Poller::new("peers", Duration::from_millis(50)).run(
            cancel.clone(),
            move || {
                let client = client.clone();
                async move { fetch_result::<NetInfoResult>(client.as_ref(), "net_info").await }
            },
            move |net_info| polls::render_peers(&sink, &net_info),
        ))
    };

    let probe = sink.clone();
    eventually("peer count", move || probe.last_text(Panel::Peers).is_some()).await;
    assert_eq!(sink.last_text(Panel::Peers).as_deref(), Some("12"));

    cancel.cancel();
    task.await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);
}

#[tokio::test]
async fn test_failed_poll_keeps_last_display() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_ok(status_result(10, false))))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let sink = MemorySink::new();
    let cancel = CancellationToken::new();

    let task = {
        let sink = sink.clone();
        tokio::spawn(Poller::new("status", Duration::from_millis(20)).run(
            cancel.clone(),
            move || {
                let client = client.clone();
                async move { fetch_result::<StatusResult>(client.as_ref(), "status").await }
            },
            move |status| polls::render_status(&sink, &status),
        ))
    };

    let server = &mock_server;
    for _ in 0..100 {
        if server.received_requests().await.unwrap().len() >= 4 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel.cancel();
    task.await.unwrap();

    // rendered once, never cleared by the failures that followed
    assert_eq!(sink.updates_for(Panel::Network).len(), 2);
    assert_eq!(
        sink.last_text(Panel::Network).as_deref(),
        Some("testnet-1\nversion 0.38.12")
    );
}

#[tokio::test]
async fn test_health_reflects_reachability() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rpc_ok(serde_json::json!({}))))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    assert!(client.fetch("health").await.is_ok());
    assert!(client.fetch("health").await.is_err());
}
