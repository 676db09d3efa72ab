//! Prometheus metrics for the treasury monitor

use prometheus::{Gauge, GaugeVec, IntCounter, IntCounterVec, Opts, Registry};

/// Prometheus metrics, registered once at startup
pub struct Metrics {
    /// Refresh cycles started (successful or not)
    pub refresh_cycles_total: IntCounter,
    /// Refresh cycles that failed outright (prior snapshot retained)
    pub refresh_failures_total: IntCounter,
    /// Per-chain balance fetches that failed or timed out (zero substituted)
    pub balance_fetch_failures_total: IntCounterVec,
    /// Price lookups that fell back to the compiled-in table
    pub price_fallback_total: IntCounter,
    /// Total treasury value in USD as of the last snapshot
    pub treasury_total_usd: Gauge,
    /// Per-chain treasury value in USD as of the last snapshot
    pub chain_balance_usd: GaugeVec,
    /// Unix timestamp of the last successful refresh
    pub last_refresh_timestamp: Gauge,
    pub registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let refresh_cycles_total = IntCounter::new(
            "treasury_refresh_cycles_total",
            "Total number of treasury refresh cycles started",
        )
        .expect("constant metric name is valid");

        let refresh_failures_total = IntCounter::new(
            "treasury_refresh_failures_total",
            "Total number of refresh cycles that failed (prior snapshot retained)",
        )
        .expect("constant metric name is valid");

        let balance_fetch_failures_total = IntCounterVec::new(
            Opts::new(
                "treasury_balance_fetch_failures_total",
                "Per-chain balance fetches that failed or timed out",
            ),
            &["chain"],
        )
        .expect("constant metric name is valid");

        let price_fallback_total = IntCounter::new(
            "treasury_price_fallback_total",
            "Price lookups that substituted the fallback table",
        )
        .expect("constant metric name is valid");

        let treasury_total_usd = Gauge::new(
            "treasury_total_usd",
            "Total treasury value in USD as of the last snapshot",
        )
        .expect("constant metric name is valid");

        let chain_balance_usd = GaugeVec::new(
            Opts::new(
                "treasury_chain_balance_usd",
                "Per-chain treasury value in USD as of the last snapshot",
            ),
            &["chain"],
        )
        .expect("constant metric name is valid");

        let last_refresh_timestamp = Gauge::new(
            "treasury_last_refresh_timestamp",
            "Unix timestamp of the last successful refresh",
        )
        .expect("constant metric name is valid");

        // Register all metrics — expect is safe here because names are unique
        // constants and registration is called exactly once at startup
        registry
            .register(Box::new(refresh_cycles_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(refresh_failures_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(balance_fetch_failures_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(price_fallback_total.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(treasury_total_usd.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(chain_balance_usd.clone()))
            .expect("metric registration must not be called twice");
        registry
            .register(Box::new(last_refresh_timestamp.clone()))
            .expect("metric registration must not be called twice");

        Self {
            refresh_cycles_total,
            refresh_failures_total,
            balance_fetch_failures_total,
            price_fallback_total,
            treasury_total_usd,
            chain_balance_usd,
            last_refresh_timestamp,
            registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_cleanly() {
        let metrics = Metrics::new();
        metrics.refresh_cycles_total.inc();
        metrics
            .balance_fetch_failures_total
            .with_label_values(&["ethereum"])
            .inc();
        metrics.treasury_total_usd.set(12_250.0);
        let families = metrics.registry.gather();
        assert!(families.len() >= 4);
    }
}
