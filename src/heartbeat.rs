use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Periodic liveness signal, independent of stream state.
///
/// Keeps logging while the supervisor is reconnecting so an external watcher
/// can tell "process alive but stream down" from "process dead". Exits only
/// on shutdown.
pub async fn run(interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::info!(
                    uptime_secs = started.elapsed().as_secs(),
                    "sentinel heartbeat"
                );
            }
            _ = shutdown.changed() => {
                tracing::info!("heartbeat stopped");
                return;
            }
        }
    }
}
