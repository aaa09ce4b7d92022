//! Supervisor lifecycle with fake node transports

use std::sync::Arc;
use std::time::Duration;

use nodewatch::actors::messages::FeedState;
use nodewatch::actors::supervisor::Supervisor;
use nodewatch::config::Config;
use nodewatch::display::{MemorySink, Panel};
use pretty_assertions::assert_eq;

use crate::helpers::*;

const WAIT: Duration = Duration::from_secs(5);

/// Pollers (health, status, peers, validators, consensus params, sync, clock)
/// plus one feed per subscription
const TASKS: usize = 7 + 4;

fn supervisor(
    client: Arc<FakeRpcClient>,
    connector: Arc<FakeConnector>,
    sink: &MemorySink,
) -> Supervisor {
    Supervisor::new(
        Config::default(),
        client,
        connector,
        Arc::new(sink.clone()),
    )
    .unwrap()
}

async fn wait_all(supervisor: &Supervisor, state: FeedState) {
    for handle in supervisor.feed_handles() {
        let mut handle = handle.clone();
        handle.wait_for(state, WAIT).await.unwrap();
    }
}

#[tokio::test]
async fn test_start_and_shutdown() {
    let client = FakeRpcClient::healthy_node();
    let connector = FakeConnector::new();
    let sink = MemorySink::new();

    let mut supervisor = supervisor(client.clone(), connector.clone(), &sink);
    assert_eq!(supervisor.endpoint().ws_url.as_str(), "ws://localhost:26657/websocket");

    supervisor.start();
    assert_eq!(supervisor.task_count(), TASKS);
    assert_eq!(supervisor.coordinator().receiver_count(), 4);

    wait_all(&supervisor, FeedState::Streaming).await;
    assert_eq!(connector.live(), 4);

    let probe = sink.clone();
    eventually("pollers to render", move || {
        probe.last_text(Panel::Network).is_some()
            && probe.last_text(Panel::Health).is_some()
            && probe.last_text(Panel::Peers).is_some()
            && probe.last_text(Panel::GasLimit).is_some()
            && probe.last_text(Panel::SystemTime).is_some()
            && !probe.gauge_values(Panel::SyncProgress).is_empty()
    })
    .await;

    assert_eq!(sink.last_text(Panel::Network).as_deref(), Some("testnet-1\nversion 0.38.12"));
    assert_eq!(sink.last_text(Panel::Peers).as_deref(), Some("7"));
    assert_eq!(sink.last_text(Panel::GasLimit).as_deref(), Some("unlimited"));
    assert_eq!(sink.last_text(Panel::Health).as_deref(), Some("✔️ good"));
    assert_eq!(sink.gauge_values(Panel::SyncProgress).last(), Some(&100));

    let handles: Vec<_> = supervisor.feed_handles().to_vec();
    let joined = supervisor.shutdown().await;

    assert_eq!(joined, TASKS);
    assert_eq!(connector.live(), 0);
    assert!(handles.iter().all(|h| h.state() == FeedState::Terminated));
}

#[tokio::test]
async fn test_events_reach_metrics() {
    let client = FakeRpcClient::healthy_node();
    let connector = FakeConnector::new();
    let sink = MemorySink::new();

    let mut supervisor = supervisor(client, connector.clone(), &sink);
    supervisor.start();
    wait_all(&supervisor, FeedState::Streaming).await;

    // match sockets to topics by their subscribe message
    let mut ends = Vec::new();
    for _ in 0..4 {
        ends.push(connector.next_connection().await);
    }
    let queries: Vec<String> = ends
        .iter()
        .map(|end| {
            let sent: serde_json::Value = serde_json::from_str(&end.sent()[0]).unwrap();
            sent["params"][0].as_str().unwrap().to_string()
        })
        .collect();

    let blocks = queries.iter().position(|q| q == "tm.event='NewBlock'").unwrap();
    let txs = queries.iter().position(|q| q == "tm.event='Tx'").unwrap();

    ends[blocks].push(new_block_message(500, &[30_000, 70_000]));
    ends[txs].push(tx_message(500, 30_000));
    ends[txs].push(tx_message(500, 70_000));

    let metrics = supervisor.metrics().clone();
    eventually("events to be folded in", move || {
        let s = metrics.snapshot();
        s.block_count == 1 && s.transaction_count == 2
    })
    .await;

    let snapshot = supervisor.metrics().snapshot();
    assert_eq!(snapshot.total_gas_wanted, 100_000);
    assert_eq!(snapshot.max_gas_seen_in_block, 100_000);
    assert_eq!(snapshot.last_tx_gas_wanted, 70_000);
    assert_eq!(snapshot.avg_gas_per_tx(), Some(50_000));

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_node_outage_cycles_feeds() {
    let client = FakeRpcClient::healthy_node();
    let connector = FakeConnector::new();
    let sink = MemorySink::new();

    let mut supervisor = supervisor(client.clone(), connector.clone(), &sink);
    supervisor.start();
    wait_all(&supervisor, FeedState::Streaming).await;

    let probe = sink.clone();
    eventually("node to be seen healthy", move || {
        probe.last_text(Panel::Health).as_deref() == Some("✔️ good")
    })
    .await;

    client.set_down(true);
    wait_all(&supervisor, FeedState::Idle).await;
    assert_eq!(connector.live(), 0);
    assert_eq!(sink.last_text(Panel::Health).as_deref(), Some("✖️ no connection"));

    client.set_down(false);
    wait_all(&supervisor, FeedState::Streaming).await;
    assert_eq!(connector.attempts(), 8);

    supervisor.shutdown().await;
    assert_eq!(connector.live(), 0);
}

#[tokio::test]
async fn test_cancel_token_stops_everything() {
    let client = FakeRpcClient::healthy_node();
    let connector = FakeConnector::scripted(vec![OpenBehavior::Hang; 4]);
    let sink = MemorySink::new();

    let mut supervisor = supervisor(client, connector.clone(), &sink);
    supervisor.start();

    let attempts = connector.clone();
    eventually("feeds to start connecting", move || attempts.attempts() == 4).await;

    supervisor.cancel_token().cancel();
    wait_all(&supervisor, FeedState::Terminated).await;

    assert_eq!(supervisor.shutdown().await, TASKS);
    assert_eq!(connector.live(), 0);
}

#[test]
fn test_invalid_node_address_is_rejected() {
    let config = Config {
        node: "ftp://node:21".to_string(),
        ..Config::default()
    };

    let result = Supervisor::new(
        config,
        FakeRpcClient::healthy_node(),
        FakeConnector::new(),
        Arc::new(MemorySink::new()),
    );
    assert!(result.is_err());
}
