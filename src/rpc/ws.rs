//! Websocket transport for event subscriptions

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::Uri},
};
use tracing::{debug, trace};

use crate::error::{FeedError, FeedResult};

use super::{StreamConnection, StreamConnector};

const USER_AGENT: &str = concat!("nodewatch/", env!("CARGO_PKG_VERSION"));

/// Opens tokio-tungstenite websocket connections
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn open(&self, url: &str) -> FeedResult<Box<dyn StreamConnection>> {
        let uri: Uri = url
            .parse()
            .map_err(|e| FeedError::Transport(format!("failed to parse websocket URL: {e}")))?;

        let host = uri
            .authority()
            .ok_or_else(|| FeedError::Transport("websocket URL missing host".to_string()))?
            .as_str()
            .to_string();

        let scheme = uri
            .scheme_str()
            .ok_or_else(|| FeedError::Transport("websocket URL missing scheme".to_string()))?;

        // Origin mirrors the RPC scheme (wss -> https, ws -> http)
        let origin_scheme = if scheme == "wss" { "https" } else { "http" };
        let origin = format!("{}://{}", origin_scheme, host);

        let mut request = url.into_client_request()?;

        let headers = request.headers_mut();
        headers.insert(
            "Origin",
            origin
                .parse()
                .map_err(|_| FeedError::Transport("invalid Origin header value".to_string()))?,
        );
        headers.insert(
            "User-Agent",
            USER_AGENT
                .parse()
                .map_err(|_| FeedError::Transport("invalid User-Agent header value".to_string()))?,
        );

        debug!("connecting to websocket: url={}, host={}, origin={}", url, host, origin);

        let (stream, _) = connect_async(request).await?;

        trace!("websocket connected");

        Ok(Box::new(WsConnection {
            stream,
            closed: false,
        }))
    }
}

/// Open tokio-tungstenite socket
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl StreamConnection for WsConnection {
    async fn send(&mut self, text: String) -> FeedResult<()> {
        if self.closed {
            return Err(FeedError::Closed);
        }
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Option<FeedResult<String>> {
        if self.closed {
            return None;
        }

        while let Some(msg) = self.stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!("websocket closed by node: {:?}", frame);
                    self.closed = true;
                    return None;
                }
                // tungstenite answers pings on its own
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(_) => {
                    trace!("ignoring non-text websocket frame");
                }
                Err(e) => {
                    self.closed = true;
                    return Some(Err(e.into()));
                }
            }
        }

        self.closed = true;
        None
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.stream.close(None).await {
            trace!("error while closing websocket: {}", e);
        }
    }
}
