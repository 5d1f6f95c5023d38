use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use crate::alpaca::rest::AlpacaRestClient;
use crate::alpaca::ws::{AlpacaWsClient, EpochEnd};
use crate::baseline;
use crate::dispatch::Dispatcher;
use crate::gateway::Notify;
use crate::tracker::{BucketTracker, Decision};

/// Owns the feed connection lifecycle.
///
/// Each cycle is one connection epoch: re-resolve baselines (positions may
/// have changed), reset tracker state, then consume the stream until it
/// fails. Failures are logged and followed by a fixed delay before the next
/// epoch; the loop has no terminal state other than shutdown.
pub struct StreamSupervisor<N: Notify + Clone> {
    ws: AlpacaWsClient,
    rest: AlpacaRestClient,
    tracker: BucketTracker,
    dispatcher: Dispatcher<N>,
    symbols: Vec<String>,
    reconnect_delay: Duration,
}

impl<N: Notify + Clone> StreamSupervisor<N> {
    pub fn new(
        ws: AlpacaWsClient,
        rest: AlpacaRestClient,
        tracker: BucketTracker,
        dispatcher: Dispatcher<N>,
        symbols: Vec<String>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            ws,
            rest,
            tracker,
            dispatcher,
            symbols,
            reconnect_delay,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut epoch: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            epoch += 1;
            match self.run_epoch(epoch, &mut shutdown).await {
                Ok(EpochEnd::ShutdownRequested) => break,
                Err(e) => {
                    tracing::warn!(
                        epoch,
                        error = %format!("{:#}", e),
                        delay_secs = self.reconnect_delay.as_secs(),
                        "stream cycle failed; reconnecting"
                    );
                    if !sleep_or_shutdown(self.reconnect_delay, &mut shutdown).await {
                        break;
                    }
                }
            }
        }
        tracing::info!("stream supervisor stopped");
    }

    async fn run_epoch(
        &mut self,
        epoch: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<EpochEnd> {
        let positions = baseline::resolve(&self.rest, &self.symbols).await?;
        self.tracker.reset(&positions);
        tracing::info!(epoch, symbols = ?self.symbols, "starting stream epoch");

        let Self {
            ws,
            tracker,
            dispatcher,
            symbols,
            ..
        } = self;
        ws.run_epoch(symbols, shutdown, |event| {
            match tracker.process(&event.symbol, event.price) {
                Decision::BaselineSeeded { symbol, price } => {
                    tracing::info!(%symbol, price, "baseline seeded from first tick");
                }
                Decision::Alert(alert) => {
                    tracing::info!(
                        symbol = %alert.symbol,
                        pct = alert.change_pct,
                        bucket_pct = alert.bucket_pct,
                        price = alert.price,
                        reference = alert.reference,
                        "percentage band crossed"
                    );
                    dispatcher.dispatch(alert);
                }
                Decision::NoAlert => {}
            }
        })
        .await
    }
}

/// Returns false when shutdown was requested during the delay.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.changed() => false,
    }
}
