//! Offline integration tests for the aggregation and refresh lifecycle
//!
//! Run with: cargo test --test service_lifecycle
//!
//! Every endpoint points at an unreachable local port, so these tests
//! exercise the degradation paths end to end without any network: failed
//! balance fetches substitute zero, the price lookup substitutes the
//! fallback table, and the refresher still settles and shuts down cleanly.

use std::sync::Arc;
use std::time::Duration;

use treasury_monitor::aggregator::TreasuryAggregator;
use treasury_monitor::chains;
use treasury_monitor::config::Config;
use treasury_monitor::metrics::Metrics;
use treasury_monitor::prices::{fallback_prices, PriceClient};
use treasury_monitor::refresher::TreasuryRefresher;
use treasury_monitor::sources::build_sources;

/// Config with every endpoint unreachable and short timeouts
fn offline_config() -> Config {
    let mut config = Config::defaults();
    config.endpoints.eth_rpc_urls = vec![
        "http://127.0.0.1:1".to_string(),
        "http://127.0.0.1:1".to_string(),
        "http://127.0.0.1:1".to_string(),
        "http://127.0.0.1:1".to_string(),
    ];
    config.endpoints.bsc_rpc_url = "http://127.0.0.1:1".to_string();
    config.endpoints.solana_rpc_url = "http://127.0.0.1:1".to_string();
    config.endpoints.bitcoin_api_url = "http://127.0.0.1:1".to_string();
    config.price_api_url = "http://127.0.0.1:1".to_string();
    config.fetch_timeout_ms = 500;
    config
}

fn offline_aggregator(config: &Config, metrics: Arc<Metrics>) -> TreasuryAggregator {
    TreasuryAggregator::new(
        build_sources(config).unwrap(),
        PriceClient::new(&config.price_api_url, config.fetch_timeout()),
        config.funding_target_usd,
        config.fetch_timeout(),
        metrics,
    )
}

#[tokio::test]
async fn snapshot_degrades_to_zero_when_everything_is_down() {
    let config = offline_config();
    let metrics = Arc::new(Metrics::new());
    let aggregator = offline_aggregator(&config, metrics.clone());

    let state = tokio::time::timeout(Duration::from_secs(30), aggregator.snapshot())
        .await
        .expect("snapshot must settle within the per-source timeouts")
        .expect("snapshot must not fail outright");

    // every chain reported, all zeroed, fallback prices applied
    assert_eq!(state.chains.len(), chains::all_chains().count());
    assert_eq!(state.total_usd, 0.0);
    assert_eq!(state.progress_pct, 0.0);
    let fallback = fallback_prices();
    for balance in &state.chains {
        assert_eq!(balance.native_balance, 0.0);
        assert_eq!(balance.usd_value, 0.0);
        assert_eq!(balance.unit_price_usd, fallback[&balance.chain]);
    }

    // the consolidated group still carries its per-sub-chain breakdown
    let eth = state
        .chains
        .iter()
        .find(|c| c.chain == chains::Chain::Ethereum)
        .unwrap();
    assert_eq!(eth.sub_chains.len(), 4);

    // failures were recorded per chain
    assert!(metrics.balance_fetch_failures_total.with_label_values(&["solana"]).get() >= 1);
    assert_eq!(metrics.price_fallback_total.get(), 1);
}

#[tokio::test]
async fn snapshot_is_safe_to_invoke_concurrently() {
    let config = offline_config();
    let metrics = Arc::new(Metrics::new());
    let aggregator = Arc::new(offline_aggregator(&config, metrics));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let aggregator = aggregator.clone();
            tokio::spawn(async move { aggregator.snapshot().await })
        })
        .collect();

    for task in tasks {
        let state = tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .expect("concurrent snapshot must settle")
            .expect("task must not panic")
            .expect("snapshot must not fail");
        assert_eq!(state.total_usd, 0.0);
    }
}

#[tokio::test]
async fn refresher_settles_then_stops_on_shutdown() {
    let config = offline_config();
    let metrics = Arc::new(Metrics::new());
    let aggregator = Arc::new(offline_aggregator(&config, metrics.clone()));

    let (refresher, handle) =
        TreasuryRefresher::new(aggregator, Duration::from_secs(60), metrics);
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    let task = tokio::spawn(async move { refresher.run(shutdown_rx).await });

    // the startup cycle clears the loading flag even though every fetch failed
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    while handle.snapshot().await.loading {
        assert!(
            tokio::time::Instant::now() < deadline,
            "loading flag never cleared"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let settled = handle.snapshot().await;
    assert_eq!(settled.state.total_usd, 0.0);
    assert!(settled.state.last_updated.is_some());

    // shutdown stops the loop; no further updates land afterwards
    let _ = shutdown_tx.send(()).await;
    tokio::time::timeout(Duration::from_secs(30), task)
        .await
        .expect("refresher must stop on shutdown")
        .expect("refresher task must not panic")
        .expect("refresher must exit cleanly");

    let before = handle.snapshot().await;
    handle.refresh();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after = handle.snapshot().await;
    assert_eq!(before.state.last_updated, after.state.last_updated);
}
