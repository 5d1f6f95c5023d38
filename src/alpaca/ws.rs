use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, Stream, StreamExt};
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite;

use super::types::{AuthRequest, StreamMessage, SubscribeRequest};
use crate::model::trade::TradeEvent;

/// Alpaca terminates connections that do not authenticate within 10 seconds.
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// How one stream epoch ended.
#[derive(Debug, PartialEq, Eq)]
pub enum EpochEnd {
    ShutdownRequested,
}

pub struct AlpacaWsClient {
    url: String,
    api_key: String,
    api_secret: String,
}

impl AlpacaWsClient {
    pub fn new(stream_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            url: stream_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    /// Run a single connection epoch: connect, authenticate, subscribe, then
    /// hand every trade to `on_trade` in arrival order. Returns Ok only when
    /// shutdown is requested; any stream failure surfaces as Err so the
    /// supervisor can tear the epoch down and reconnect.
    pub async fn run_epoch(
        &self,
        symbols: &[String],
        shutdown: &mut watch::Receiver<bool>,
        mut on_trade: impl FnMut(TradeEvent),
    ) -> Result<EpochEnd> {
        tracing::info!(url = %self.url, "connecting to trade stream");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&self.url)
            .await
            .context("WebSocket connect failed")?;
        let (mut write, mut read) = ws_stream.split();

        // Handshake: connected -> auth -> authenticated -> subscribe.
        tokio::time::timeout(AUTH_TIMEOUT, async {
            wait_for_success(&mut read, "connected").await?;
            let auth = serde_json::to_string(&AuthRequest::new(&self.api_key, &self.api_secret))?;
            write.send(tungstenite::Message::Text(auth.into())).await?;
            wait_for_success(&mut read, "authenticated").await
        })
        .await
        .context("authentication timed out")?
        .context("authentication failed")?;

        let subscribe = serde_json::to_string(&SubscribeRequest::new(symbols))?;
        write
            .send(tungstenite::Message::Text(subscribe.into()))
            .await
            .context("subscribe request failed")?;
        tracing::info!(symbols = ?symbols, "subscribed to trade stream");

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match serde_json::from_str::<Vec<StreamMessage>>(&text) {
                                Ok(batch) => {
                                    for message in batch {
                                        match message {
                                            StreamMessage::Trade(trade) => {
                                                let event = TradeEvent {
                                                    symbol: trade.symbol.clone(),
                                                    price: trade.price,
                                                    timestamp_ms: trade.timestamp_ms(),
                                                };
                                                on_trade(event);
                                            }
                                            StreamMessage::Error { code, msg } => {
                                                bail!("stream error {}: {}", code, msg);
                                            }
                                            _ => {}
                                        }
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "failed to parse stream message");
                                }
                            }
                        }
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tokio-tungstenite answers pings automatically
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            bail!("stream closed by server: {:?}", frame);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            bail!("WebSocket read error: {}", e);
                        }
                        None => {
                            bail!("WebSocket stream ended");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(EpochEnd::ShutdownRequested);
                }
            }
        }
    }
}

/// Drain control frames until the expected `{"T":"success"}` arrives.
async fn wait_for_success<S>(read: &mut S, expected: &str) -> Result<()>
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        match read.next().await {
            Some(Ok(tungstenite::Message::Text(text))) => {
                let batch: Vec<StreamMessage> =
                    serde_json::from_str(&text).context("invalid control message")?;
                for message in batch {
                    match message {
                        StreamMessage::Success { msg } if msg == expected => return Ok(()),
                        StreamMessage::Error { code, msg } => {
                            bail!("stream error {}: {}", code, msg);
                        }
                        _ => {}
                    }
                }
            }
            Some(Ok(tungstenite::Message::Ping(_))) => {}
            Some(Ok(_)) => {}
            Some(Err(e)) => bail!("WebSocket read error during handshake: {}", e),
            None => bail!("stream ended during handshake"),
        }
    }
}
