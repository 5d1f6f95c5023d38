use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use price_sentinel::alpaca::rest::AlpacaRestClient;
use price_sentinel::alpaca::ws::AlpacaWsClient;
use price_sentinel::config::Config;
use price_sentinel::dispatch::Dispatcher;
use price_sentinel::gateway::GatewayNotifier;
use price_sentinel::heartbeat;
use price_sentinel::supervisor::StreamSupervisor;
use price_sentinel::tracker::BucketTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load config; unreadable credentials must never start the supervisor loop
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure .env exists with APCA_API_KEY_ID and APCA_API_SECRET_KEY");
            std::process::exit(1);
        }
    };

    // Structured logs go to stdout and to a local append log
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.logging.file)
        .with_context(|| format!("failed to open log file {}", config.logging.file))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .with_writer(std::io::stdout.and(Arc::new(log_file)))
        .with_ansi(false)
        .json()
        .init();

    let symbols = config.watch.watch_symbols();
    tracing::info!(
        symbols = ?symbols,
        step_pct = config.watch.step_pct,
        stream_url = %config.alpaca.stream_url,
        "starting price-sentinel"
    );

    let rest = AlpacaRestClient::new(
        &config.alpaca.trading_base_url,
        &config.alpaca.api_key,
        &config.alpaca.api_secret,
    )?;
    let ws = AlpacaWsClient::new(
        &config.alpaca.stream_url,
        &config.alpaca.api_key,
        &config.alpaca.api_secret,
    );

    // Resolve the notification destination once; it is assumed stable for
    // the process lifetime. Without it the sentinel still runs, logs only.
    let notifier = GatewayNotifier::new(&config.gateway.base_url);
    let session_key = match notifier.resolve_session(&config.gateway.channel_id).await {
        Ok(key) => {
            tracing::info!(session = %key, "notification session resolved");
            Some(key)
        }
        Err(e) => {
            tracing::warn!(error = %e, "notification session unresolved; alerts will only be logged");
            None
        }
    };
    let dispatcher = Dispatcher::new(
        notifier,
        session_key,
        config.gateway.dispatch_timeout(),
        config.gateway.max_in_flight,
        config.gateway.retry_once,
    );

    let tracker = BucketTracker::new(&symbols, config.watch.step_pct);
    let supervisor = StreamSupervisor::new(
        ws,
        rest,
        tracker,
        dispatcher,
        symbols,
        config.stream.reconnect_delay(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let heartbeat_handle = tokio::spawn(heartbeat::run(
        config.heartbeat.interval(),
        shutdown_rx.clone(),
    ));
    let supervisor_handle = tokio::spawn(supervisor.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for termination signal")?;
    tracing::info!("termination signal received; shutting down");
    let _ = shutdown_tx.send(true);
    let _ = supervisor_handle.await;
    let _ = heartbeat_handle.await;
    Ok(())
}
