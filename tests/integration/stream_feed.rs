//! StreamFeed state machine against an in-memory transport

use std::sync::Arc;
use std::time::Duration;

use nodewatch::actors::coordinator::ReconnectCoordinator;
use nodewatch::actors::feed::{FeedDescriptor, FeedHandle, StreamFeed};
use nodewatch::actors::messages::{FeedState, ReconnectSignal};
use nodewatch::display::{MemorySink, Panel};
use nodewatch::handlers::{BlockHandler, FeedContext, NEW_BLOCK_QUERY};
use nodewatch::metrics::MetricsStore;
use pretty_assertions::assert_eq;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

const WAIT: Duration = Duration::from_secs(5);

struct TestFeed {
    handle: FeedHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    metrics: MetricsStore,
    sink: MemorySink,
}

fn spawn_block_feed(connector: Arc<FakeConnector>, coordinator: &ReconnectCoordinator) -> TestFeed {
    let metrics = MetricsStore::new();
    let sink = MemorySink::new();
    let ctx = FeedContext::new(metrics.clone(), Arc::new(sink.clone()));

    let descriptor =
        FeedDescriptor::new("blocks", NEW_BLOCK_QUERY, 1, Arc::new(BlockHandler::new(ctx)));
    let feed = StreamFeed::new(
        descriptor,
        "ws://localhost:26657/websocket",
        connector,
        coordinator.subscribe(),
        Duration::from_secs(2),
    );

    let handle = feed.handle();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(feed.run(cancel.clone()));

    TestFeed {
        handle,
        cancel,
        task,
        metrics,
        sink,
    }
}

#[tokio::test]
async fn test_subscribes_with_fixed_message() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    let sent: Vec<serde_json::Value> = server
        .sent()
        .iter()
        .map(|s| serde_json::from_str(s).unwrap())
        .collect();
    assert_eq!(
        sent,
        vec![serde_json::json!({
            "jsonrpc": "2.0",
            "method": "subscribe",
            "params": ["tm.event='NewBlock'"],
            "id": 1
        })]
    );

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_malformed_message_is_dropped() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    server.push(subscription_ack(1));
    server.push("{not json");
    server.push(r#"{"jsonrpc":"2.0","id":1,"result":{"data":{"type":"tendermint/event/NewBlock","value":{}}}}"#);
    server.push(new_block_message(1000, &[100]));

    let metrics = feed.metrics.clone();
    eventually("block to be counted", || metrics.snapshot().block_count == 1).await;

    let snapshot = feed.metrics.snapshot();
    assert_eq!(snapshot.block_count, 1);
    assert_eq!(snapshot.latest_height, 1000);
    assert_eq!(feed.handle.state(), FeedState::Streaming);
    assert_eq!(feed.sink.last_text(Panel::LatestBlock).as_deref(), Some("1000"));
    assert!(!server.is_closed());

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_cancel_while_connecting() {
    let connector = FakeConnector::scripted(vec![OpenBehavior::Hang]);
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let attempts = connector.clone();
    eventually("connect attempt", move || attempts.attempts() == 1).await;
    assert_eq!(feed.handle.state(), FeedState::Connecting);

    feed.cancel.cancel();
    feed.handle.wait_for(FeedState::Terminated, WAIT).await.unwrap();
    feed.task.await.unwrap();

    assert_eq!(connector.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_goes_idle() {
    let connector = FakeConnector::scripted(vec![OpenBehavior::Hang]);
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();
    assert_eq!(connector.attempts(), 1);

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_failed_connect_waits_for_reconnect() {
    let connector = FakeConnector::scripted(vec![OpenBehavior::Fail]);
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();

    // no retry on its own
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(feed.handle.state(), FeedState::Idle);

    coordinator.broadcast(ReconnectSignal::Reconnect);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();
    assert_eq!(connector.attempts(), 2);
    assert_eq!(server.sent().len(), 1);

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_no_connection_then_reconnect() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let first = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    coordinator.broadcast(ReconnectSignal::NoConnection);
    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();
    assert!(first.is_closed());
    assert_eq!(connector.live(), 0);

    // repeated signal while idle changes nothing
    coordinator.broadcast(ReconnectSignal::NoConnection);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.handle.state(), FeedState::Idle);

    coordinator.broadcast(ReconnectSignal::Reconnect);
    let second = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    // same subscription, resent verbatim
    assert_eq!(first.sent(), second.sent());
    assert_eq!(connector.live(), 1);

    second.push(new_block_message(1001, &[]));
    let metrics = feed.metrics.clone();
    eventually("block after reconnect", || metrics.snapshot().block_count == 1).await;

    feed.cancel.cancel();
    feed.task.await.unwrap();
    assert!(second.is_closed());
}

#[tokio::test]
async fn test_reconnect_while_streaming_is_ignored() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    coordinator.broadcast(ReconnectSignal::Reconnect);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(connector.attempts(), 1);
    assert_eq!(feed.handle.state(), FeedState::Streaming);
    assert!(!server.is_closed());

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_remote_close_goes_idle() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    server.hang_up();
    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();
    assert_eq!(connector.live(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(connector.attempts(), 1);

    feed.cancel.cancel();
    feed.handle.wait_for(FeedState::Terminated, WAIT).await.unwrap();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_transport_error_goes_idle() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    server.fail();
    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();
    assert!(server.is_closed());

    feed.cancel.cancel();
    feed.task.await.unwrap();
}

#[tokio::test]
async fn test_cancel_while_streaming_closes_socket() {
    let connector = FakeConnector::new();
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    let server = connector.next_connection().await;
    feed.handle.wait_for(FeedState::Streaming, WAIT).await.unwrap();

    feed.cancel.cancel();
    feed.handle.wait_for(FeedState::Terminated, WAIT).await.unwrap();
    feed.task.await.unwrap();

    assert!(server.is_closed());
    assert_eq!(connector.live(), 0);
}

#[tokio::test]
async fn test_cancel_while_idle() {
    let connector = FakeConnector::scripted(vec![OpenBehavior::Fail]);
    let coordinator = ReconnectCoordinator::new(16);
    let mut feed = spawn_block_feed(connector.clone(), &coordinator);

    feed.handle.wait_for(FeedState::Idle, WAIT).await.unwrap();

    feed.cancel.cancel();
    feed.handle.wait_for(FeedState::Terminated, WAIT).await.unwrap();
    feed.task.await.unwrap();
}
