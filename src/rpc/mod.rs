//! Clients for the node's request/response and event endpoints
//!
//! Both transports sit behind narrow traits so feeds and pollers can be driven
//! by in-memory fakes in tests:
//!
//! - [`RpcClient`]: one fresh request per `fetch`, no caching
//! - [`StreamConnector`] / [`StreamConnection`]: one subscription socket per feed

pub mod http;
pub mod types;
pub mod ws;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FeedError, FeedResult};

pub use http::HttpRpcClient;
pub use ws::WsConnector;

/// Request/response access to the node
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Fetch an endpoint (e.g. `status`) and return the full JSON body
    async fn fetch(&self, endpoint: &str) -> FeedResult<Value>;
}

/// Opens subscription sockets
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn open(&self, url: &str) -> FeedResult<Box<dyn StreamConnection>>;
}

/// One open subscription socket
#[async_trait]
pub trait StreamConnection: Send {
    /// Send a text frame
    async fn send(&mut self, text: String) -> FeedResult<()>;

    /// Next text message; `None` once the remote closed the stream
    async fn next_message(&mut self) -> Option<FeedResult<String>>;

    /// Close the socket. Safe to call more than once.
    async fn close(&mut self);
}

/// Fetch an endpoint and decode its JSON-RPC `result` member
pub async fn fetch_result<T: DeserializeOwned>(
    client: &dyn RpcClient,
    endpoint: &str,
) -> FeedResult<T> {
    let body = client.fetch(endpoint).await?;
    decode_result(body)
}

/// Decode the `result` member of a JSON-RPC response body
pub fn decode_result<T: DeserializeOwned>(mut body: Value) -> FeedResult<T> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(FeedError::Rpc(error.to_string()));
    }

    let result = body
        .get_mut("result")
        .map(Value::take)
        .ok_or(FeedError::MissingField("result"))?;

    Ok(serde_json::from_value(result)?)
}

/// JSON-RPC subscribe request for an event query
pub fn subscribe_message(query: &str, id: u64) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": "subscribe",
        "params": [query],
        "id": id,
    })
    .to_string()
}
