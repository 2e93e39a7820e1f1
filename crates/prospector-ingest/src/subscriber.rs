//! Live newHeads subscription feeding the block queue.
//!
//! Speaks raw JSON-RPC over WebSocket. Any connection or stream error tears
//! the session down and reconnects after a fixed backoff; shutdown wins over
//! both streaming and backoff.

use crate::BlockQueue;
use alloy_primitives::B256;
use futures_util::{SinkExt, StreamExt};
use prospector_core::types::BlockEvent;
use prospector_core::{ProspectorError, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Header fields the subscription consumes; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewHead {
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    number: u64,
    hash: B256,
}

fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(serde::de::Error::custom)
}

/// Parse a WebSocket text frame into a block event, if it is a newHeads
/// notification. Malformed or unrelated frames yield `None`.
fn parse_header_frame(text: &str) -> Option<BlockEvent> {
    let parsed: serde_json::Value = serde_json::from_str(text).ok()?;
    if parsed.get("method") != Some(&serde_json::json!("eth_subscription")) {
        return None;
    }
    let head: NewHead = serde_json::from_value(parsed.pointer("/params/result")?.clone()).ok()?;
    Some(BlockEvent {
        number: head.number,
        hash: head.hash,
    })
}

/// Maintains the header subscription and publishes block events.
pub struct BlockSubscriber {
    ws_url: String,
    queue: Arc<BlockQueue>,
}

impl BlockSubscriber {
    pub fn new(ws_url: impl Into<String>, queue: Arc<BlockQueue>) -> Self {
        Self {
            ws_url: ws_url.into(),
            queue,
        }
    }

    /// Run until shutdown. Subscription errors trigger a fixed backoff and
    /// a fresh connection; the loop never gives up on its own.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            match self.stream_headers(&mut shutdown).await {
                Ok(()) => {
                    info!("Header subscription stopped by shutdown");
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        delay_secs = RECONNECT_DELAY.as_secs(),
                        "Header subscription lost, reconnecting after backoff"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                _ = shutdown.recv() => {
                    info!("Header subscription stopped during backoff");
                    return Ok(());
                }
            }
        }
    }

    /// One subscription session: connect, subscribe, stream headers.
    /// Returns `Ok(())` only on shutdown; every failure is an error so the
    /// caller can back off and reconnect.
    async fn stream_headers(&self, shutdown: &mut broadcast::Receiver<()>) -> Result<()> {
        info!(url = %self.ws_url, "Connecting header subscription");

        let (ws_stream, _response) = connect_async(&self.ws_url)
            .await
            .map_err(|e| ProspectorError::WebSocket(format!("connect: {e}")))?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe_msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["newHeads"],
        });
        write
            .send(Message::Text(subscribe_msg.to_string().into()))
            .await
            .map_err(|e| ProspectorError::WebSocket(format!("subscribe send: {e}")))?;

        let subscription_id = self.wait_for_subscription(&mut read).await?;
        info!(subscription_id = %subscription_id, "Subscribed to newHeads");

        loop {
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),

                msg = read.next() => match msg {
                    None => {
                        return Err(ProspectorError::WebSocket("stream closed".into()));
                    }
                    Some(Err(e)) => {
                        return Err(ProspectorError::WebSocket(e.to_string()));
                    }
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_header_frame(&text) {
                            self.queue.publish(event).await;
                            info!(
                                block = event.number,
                                hash = %event.hash,
                                "New block header"
                            );
                        } else {
                            trace!(frame_len = text.len(), "Ignoring non-header frame");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Ping from server, answering");
                        write
                            .send(Message::Pong(data))
                            .await
                            .map_err(|e| ProspectorError::WebSocket(format!("pong: {e}")))?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!(frame = ?frame, "Server closed header subscription");
                        return Err(ProspectorError::WebSocket("server close".into()));
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    /// Wait for the confirmation of the subscribe request (id 1).
    async fn wait_for_subscription<S>(&self, read: &mut S) -> Result<String>
    where
        S: StreamExt<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let confirmation = async {
            while let Some(msg) = read.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(_) => continue,
                    Err(e) => return Err(ProspectorError::WebSocket(e.to_string())),
                };

                let parsed: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| ProspectorError::Subscription(format!("JSON parse: {e}")))?;

                if parsed.get("id") == Some(&serde_json::json!(1)) {
                    if let Some(result) = parsed.get("result").and_then(|v| v.as_str()) {
                        return Ok(result.to_string());
                    }
                    if let Some(error) = parsed.get("error") {
                        return Err(ProspectorError::Subscription(error.to_string()));
                    }
                }
            }
            Err(ProspectorError::Subscription(
                "stream closed before confirmation".into(),
            ))
        };

        tokio::time::timeout(SUBSCRIBE_TIMEOUT, confirmation)
            .await
            .map_err(|_| ProspectorError::Subscription("confirmation timeout".into()))?
    }
}
