//! Periodic treasury refresh task
//!
//! Runs one aggregation immediately on startup, then one per interval until
//! shutdown. The latest snapshot lives behind an `Arc<RwLock>` and is
//! replaced wholesale after each successful cycle; a failed cycle keeps the
//! previous snapshot (stale data beats a blank screen) and only clears the
//! loading flag. Consumers hold a [`TreasuryHandle`] for reads and manual
//! refresh triggers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::aggregator::{TreasuryAggregator, TreasuryState};
use crate::metrics::Metrics;

/// The latest snapshot plus the first-cycle loading flag
#[derive(Debug, Clone, Serialize)]
pub struct TreasuryView {
    #[serde(flatten)]
    pub state: TreasuryState,
    /// True only until the first cycle settles, success or failure
    pub loading: bool,
}

impl Default for TreasuryView {
    fn default() -> Self {
        Self {
            state: TreasuryState::default(),
            loading: true,
        }
    }
}

pub type SharedTreasury = Arc<RwLock<TreasuryView>>;

/// Read handle plus manual refresh trigger, cheap to clone
#[derive(Clone)]
pub struct TreasuryHandle {
    shared: SharedTreasury,
    refresh_tx: mpsc::Sender<()>,
}

impl TreasuryHandle {
    /// Current view of the treasury
    pub async fn snapshot(&self) -> TreasuryView {
        self.shared.read().await.clone()
    }

    /// Request an out-of-band refresh. A full queue means one is already
    /// pending, so the trigger is a no-op.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }
}

/// The refresh task itself
pub struct TreasuryRefresher {
    aggregator: Arc<TreasuryAggregator>,
    shared: SharedTreasury,
    interval: Duration,
    refresh_rx: mpsc::Receiver<()>,
    metrics: Arc<Metrics>,
}

impl TreasuryRefresher {
    pub fn new(
        aggregator: Arc<TreasuryAggregator>,
        interval: Duration,
        metrics: Arc<Metrics>,
    ) -> (Self, TreasuryHandle) {
        let shared: SharedTreasury = Arc::new(RwLock::new(TreasuryView::default()));
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        let handle = TreasuryHandle {
            shared: shared.clone(),
            refresh_tx,
        };

        (
            Self {
                aggregator,
                shared,
                interval,
                refresh_rx,
                metrics,
            },
            handle,
        )
    }

    /// Main run loop: refresh immediately, then on every tick or manual
    /// trigger, until shutdown. Nothing writes to the shared view after the
    /// loop exits, so a late in-flight result is simply discarded.
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) -> eyre::Result<()> {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Treasury refresher starting"
        );

        self.refresh_once().await;

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // first tick fires a full period from now; the startup refresh just ran
        interval.reset();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Treasury refresher shutdown");
                    break;
                }
                _ = interval.tick() => {
                    self.refresh_once().await;
                }
                Some(()) = self.refresh_rx.recv() => {
                    debug!("Manual refresh requested");
                    self.refresh_once().await;
                }
            }
        }

        Ok(())
    }

    async fn refresh_once(&self) {
        self.metrics.refresh_cycles_total.inc();

        match self.aggregator.snapshot().await {
            Ok(state) => {
                debug!(
                    total_usd = state.total_usd,
                    chains = state.chains.len(),
                    "Treasury snapshot updated"
                );
                self.metrics
                    .last_refresh_timestamp
                    .set(chrono::Utc::now().timestamp() as f64);
                let mut view = self.shared.write().await;
                *view = TreasuryView {
                    state,
                    loading: false,
                };
            }
            Err(e) => {
                warn!(error = %e, "Treasury refresh failed, keeping previous snapshot");
                self.metrics.refresh_failures_total.inc();
                let mut view = self.shared.write().await;
                view.loading = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prices::PriceClient;
    use crate::sources::build_sources;

    fn offline_aggregator(metrics: Arc<Metrics>) -> Arc<TreasuryAggregator> {
        let mut config = Config::defaults();
        config.endpoints.eth_rpc_urls = vec!["http://127.0.0.1:1".to_string()];
        config.endpoints.bsc_rpc_url = "http://127.0.0.1:1".to_string();
        config.endpoints.solana_rpc_url = "http://127.0.0.1:1".to_string();
        config.endpoints.bitcoin_api_url = "http://127.0.0.1:1".to_string();
        config.price_api_url = "http://127.0.0.1:1".to_string();

        Arc::new(TreasuryAggregator::new(
            build_sources(&config).unwrap(),
            PriceClient::new(&config.price_api_url, Duration::from_millis(200)),
            config.funding_target_usd,
            Duration::from_millis(200),
            metrics,
        ))
    }

    #[test]
    fn test_initial_view_is_zeroed_and_loading() {
        let view = TreasuryView::default();
        assert!(view.loading);
        assert!(view.state.chains.is_empty());
        assert_eq!(view.state.total_usd, 0.0);
        assert!(view.state.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_first_cycle_clears_loading() {
        let metrics = Arc::new(Metrics::new());
        let (refresher, handle) =
            TreasuryRefresher::new(offline_aggregator(metrics.clone()), Duration::from_secs(60), metrics);

        let (tx, rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(async move { refresher.run(rx).await });

        // wait for the startup refresh to settle
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            if !handle.snapshot().await.loading {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "loading never cleared");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let view = handle.snapshot().await;
        assert_eq!(view.state.total_usd, 0.0);
        assert!(view.state.last_updated.is_some());

        let _ = tx.send(()).await;
        let result = tokio::time::timeout(Duration::from_secs(10), task).await;
        assert!(result.is_ok(), "refresher should stop on shutdown");
    }

    #[tokio::test]
    async fn test_no_updates_after_shutdown() {
        let metrics = Arc::new(Metrics::new());
        let (refresher, handle) = TreasuryRefresher::new(
            offline_aggregator(metrics.clone()),
            Duration::from_secs(60),
            metrics,
        );

        let (tx, rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(async move { refresher.run(rx).await });
        let _ = tx.send(()).await;
        tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .expect("refresher should stop")
            .expect("task should not panic")
            .expect("run should return Ok");

        let before = handle.snapshot().await;
        // manual triggers after shutdown must not resurrect the loop
        handle.refresh();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let after = handle.snapshot().await;
        assert_eq!(before.loading, after.loading);
        assert_eq!(before.state.total_usd, after.state.total_usd);
        assert_eq!(
            before.state.last_updated,
            after.state.last_updated
        );
    }

    #[tokio::test]
    async fn test_run_exits_when_shutdown_sender_dropped() {
        let metrics = Arc::new(Metrics::new());
        let (refresher, _handle) = TreasuryRefresher::new(
            offline_aggregator(metrics.clone()),
            Duration::from_secs(60),
            metrics,
        );

        let (tx, rx) = mpsc::channel::<()>(1);
        drop(tx);
        let result = tokio::time::timeout(Duration::from_secs(10), refresher.run(rx)).await;
        assert!(result.is_ok(), "run should exit when the channel closes");
        assert!(result.unwrap().is_ok());
    }
}
