//! Treasury Monitor
//!
//! Read-only monitoring service for the multi-chain token sale:
//! aggregates treasury balances across chains on an interval, evaluates the
//! bonding-curve price per mint chain, and serves the latest snapshot plus
//! health and Prometheus metrics over HTTP.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use treasury_monitor::aggregator::TreasuryAggregator;
use treasury_monitor::bridge::BridgeStatusClient;
use treasury_monitor::chains::RaisedSnapshot;
use treasury_monitor::config::Config;
use treasury_monitor::curve::PriceCurve;
use treasury_monitor::metrics::Metrics;
use treasury_monitor::prices::PriceClient;
use treasury_monitor::refresher::TreasuryRefresher;
use treasury_monitor::server::{start_server, AppState};
use treasury_monitor::sources::build_sources;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    info!("Starting Treasury Monitor");

    let config = Config::load()?;
    info!(
        instance_id = %config.instance_id,
        refresh_interval_ms = config.refresh_interval_ms,
        funding_target_usd = config.funding_target_usd,
        "Configuration loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let sources = build_sources(&config)?;
    let prices = PriceClient::new(&config.price_api_url, config.fetch_timeout());
    let aggregator = Arc::new(TreasuryAggregator::new(
        sources,
        prices,
        config.funding_target_usd,
        config.fetch_timeout(),
        metrics.clone(),
    ));

    let (refresher, treasury) =
        TreasuryRefresher::new(aggregator, config.refresh_interval(), metrics.clone());

    let bridge = config
        .bridge_api_url
        .as_deref()
        .map(|url| Arc::new(BridgeStatusClient::new(url, config.fetch_timeout())));

    let state = AppState {
        treasury: treasury.clone(),
        metrics,
        bridge,
        curve: PriceCurve::default(),
        raised: Arc::new(RaisedSnapshot::default()),
        instance_id: config.instance_id.clone(),
        started_at: Instant::now(),
    };

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    // Handle signals
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    // Start the API server
    let bind_address = config.bind_address.clone();
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_server(&bind_address, port, state).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    // Run the refresher until shutdown
    refresher.run(shutdown_rx).await?;

    info!("Treasury Monitor stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,treasury_monitor=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
