//! Treasury snapshot aggregation
//!
//! One refresh cycle fans out a balance fetch per chain group plus one batch
//! price lookup, then folds the results into a single USD-denominated
//! snapshot. Every per-source failure is caught locally and substituted with
//! a zero balance, so a broken or slow endpoint degrades only its own chain.
//! The fold itself is a pure function (`value_chains`) so the valuation math
//! is testable without any network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use eyre::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::chains::Chain;
use crate::metrics::Metrics;
use crate::prices::PriceClient;
use crate::sources::{BalanceSource, GroupBalance, SubChainBalance};

/// Valued balance of one chain group
#[derive(Debug, Clone, Serialize)]
pub struct ChainBalance {
    pub chain: Chain,
    pub symbol: &'static str,
    pub native_balance: f64,
    pub unit_price_usd: f64,
    pub usd_value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_chains: Vec<SubChainBalance>,
}

/// Consolidated treasury snapshot, chains sorted by descending USD value
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreasuryState {
    pub chains: Vec<ChainBalance>,
    pub total_usd: f64,
    /// Percent of the funding target, clamped to 100
    pub progress_pct: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Builds treasury snapshots. Holds no mutable state; safe to share and to
/// call concurrently.
pub struct TreasuryAggregator {
    sources: Vec<Box<dyn BalanceSource>>,
    prices: PriceClient,
    funding_target_usd: f64,
    fetch_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl TreasuryAggregator {
    pub fn new(
        sources: Vec<Box<dyn BalanceSource>>,
        prices: PriceClient,
        funding_target_usd: f64,
        fetch_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            sources,
            prices,
            funding_target_usd,
            fetch_timeout,
            metrics,
        }
    }

    /// Produce a fresh treasury snapshot.
    ///
    /// Per-source failures never propagate; they are substituted with zero
    /// balances. The Result return is a guard for wiring errors only.
    pub async fn snapshot(&self) -> Result<TreasuryState> {
        let (balances, lookup) = tokio::join!(self.fetch_balances(), self.prices.fetch_prices());

        if lookup.fallback {
            self.metrics.price_fallback_total.inc();
        }

        let state = value_chains(balances, &lookup.prices, self.funding_target_usd);

        self.metrics.treasury_total_usd.set(state.total_usd);
        for balance in &state.chains {
            self.metrics
                .chain_balance_usd
                .with_label_values(&[balance.chain.as_str()])
                .set(balance.usd_value);
        }

        debug!(
            total_usd = state.total_usd,
            progress_pct = state.progress_pct,
            fallback_prices = lookup.fallback,
            "Treasury snapshot assembled"
        );
        Ok(state)
    }

    /// Fan out one fetch per source, each under a hard timeout.
    /// A failed or timed-out source yields a zero balance for its chain.
    async fn fetch_balances(&self) -> Vec<(Chain, GroupBalance)> {
        let fetches = self.sources.iter().map(|source| async move {
            let chain = source.chain();
            let balance = match tokio::time::timeout(self.fetch_timeout, source.fetch()).await {
                Ok(Ok(balance)) => balance,
                Ok(Err(e)) => {
                    warn!(chain = %chain, error = %e, "Balance fetch failed, counting zero");
                    self.metrics
                        .balance_fetch_failures_total
                        .with_label_values(&[chain.as_str()])
                        .inc();
                    GroupBalance::default()
                }
                Err(_) => {
                    warn!(
                        chain = %chain,
                        timeout_ms = self.fetch_timeout.as_millis() as u64,
                        "Balance fetch timed out, counting zero"
                    );
                    self.metrics
                        .balance_fetch_failures_total
                        .with_label_values(&[chain.as_str()])
                        .inc();
                    GroupBalance::default()
                }
            };
            (chain, balance)
        });

        futures::future::join_all(fetches).await
    }
}

/// Pure fan-in: value fetched balances in USD, sort descending, total, and
/// compute funding progress. An asset missing from the price map values at
/// zero rather than failing the cycle.
pub fn value_chains(
    balances: Vec<(Chain, GroupBalance)>,
    prices: &HashMap<Chain, f64>,
    funding_target_usd: f64,
) -> TreasuryState {
    let mut chains: Vec<ChainBalance> = balances
        .into_iter()
        .map(|(chain, group)| {
            let unit_price_usd = prices.get(&chain).copied().unwrap_or(0.0);
            ChainBalance {
                chain,
                symbol: chain.symbol(),
                native_balance: group.native_balance,
                unit_price_usd,
                usd_value: group.native_balance * unit_price_usd,
                sub_chains: group.sub_chains,
            }
        })
        .collect();

    chains.sort_by(|a, b| b.usd_value.total_cmp(&a.usd_value));

    let total_usd: f64 = chains.iter().map(|c| c.usd_value).sum();
    let progress_pct = if funding_target_usd > 0.0 {
        (total_usd / funding_target_usd * 100.0).min(100.0)
    } else {
        0.0
    };

    TreasuryState {
        chains,
        total_usd,
        progress_pct,
        last_updated: Some(Utc::now()),
    }
}
