use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::gateway::Notify;
use crate::tracker::{Direction, PriceAlert};

/// Human-readable alert line, e.g.
/// `AMZN is UP 6.30% (band +5%, price $106.30, ref $100.00)`.
pub fn format_alert(alert: &PriceAlert) -> String {
    let direction = match alert.direction {
        Direction::Up => "UP",
        Direction::Down => "DOWN",
    };
    format!(
        "{} is {} {:.2}% (band {:+.0}%, price ${:.2}, ref ${:.2})",
        alert.symbol,
        direction,
        alert.change_pct.abs(),
        alert.bucket_pct,
        alert.price,
        alert.reference
    )
}

/// Fire-and-forget alert delivery.
///
/// `dispatch` never blocks the caller: each alert is sent from a detached
/// task with a hard timeout, and a semaphore caps how many sends may be in
/// flight at once. When the cap is hit or no destination was resolved, the
/// alert is dropped with a log line. Failures never escalate past this module.
pub struct Dispatcher<N: Notify + Clone> {
    notifier: N,
    session_key: Option<String>,
    timeout: Duration,
    retry_once: bool,
    in_flight: Arc<Semaphore>,
}

impl<N: Notify + Clone> Dispatcher<N> {
    pub fn new(
        notifier: N,
        session_key: Option<String>,
        timeout: Duration,
        max_in_flight: usize,
        retry_once: bool,
    ) -> Self {
        Self {
            notifier,
            session_key,
            timeout,
            retry_once,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    pub fn dispatch(&self, alert: PriceAlert) {
        let Some(session_key) = self.session_key.clone() else {
            tracing::warn!(
                symbol = %alert.symbol,
                bucket_pct = alert.bucket_pct,
                "no notification session resolved; alert dropped"
            );
            return;
        };
        let Ok(permit) = Arc::clone(&self.in_flight).try_acquire_owned() else {
            tracing::warn!(
                symbol = %alert.symbol,
                bucket_pct = alert.bucket_pct,
                "dispatch capacity exhausted; alert dropped"
            );
            return;
        };

        let notifier = self.notifier.clone();
        let timeout = self.timeout;
        let attempts = if self.retry_once { 2 } else { 1 };
        let text = format_alert(&alert);

        tokio::spawn(async move {
            let _permit = permit;
            for attempt in 1..=attempts {
                match tokio::time::timeout(timeout, notifier.send(&session_key, &text)).await {
                    Ok(Ok(())) => {
                        tracing::info!(
                            symbol = %alert.symbol,
                            bucket_pct = alert.bucket_pct,
                            pct = alert.change_pct,
                            "alert delivered"
                        );
                        return;
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            symbol = %alert.symbol,
                            attempt,
                            error = %e,
                            "alert send failed"
                        );
                    }
                    Err(_) => {
                        // The timed-out send future is dropped here, which
                        // aborts the underlying request.
                        tracing::warn!(
                            symbol = %alert.symbol,
                            attempt,
                            timeout_secs = timeout.as_secs(),
                            "alert send timed out"
                        );
                    }
                }
            }
            // Best effort only: by the time another retry could land, the
            // price information is stale and a fresher alert supersedes it.
        });
    }
}
