//! HTTP request/response client for the node RPC

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{instrument, trace};
use url::Url;

use crate::error::{FeedError, FeedResult};

use super::RpcClient;

/// Node RPC client over plain HTTP GET
///
/// The underlying `reqwest::Client` keeps a connection pool, but every
/// `fetch` is an independent request and nothing is cached.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpRpcClient {
    pub fn new(base_url: Url, timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch(&self, endpoint: &str) -> FeedResult<Value> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| FeedError::Transport(format!("invalid endpoint '{endpoint}': {e}")))?;

        trace!("requesting {url}");

        let response = self
            .client
            .get(url)
            .header("Cache-Control", "no-cache")
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;

        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(FeedError::Rpc(error.to_string()));
        }

        Ok(value)
    }
}
