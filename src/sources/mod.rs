//! Per-chain treasury balance sources
//!
//! One source per consolidated chain group. Every source is read-only and
//! independently fallible; the aggregator substitutes zero for a failed
//! source so one broken endpoint never blocks the others.

pub mod bitcoin;
pub mod evm;
pub mod solana;

use async_trait::async_trait;
use eyre::Result;
use serde::Serialize;

use crate::chains::{Chain, ETH_SUB_CHAINS};
use crate::config::Config;

pub use bitcoin::BitcoinBalanceSource;
pub use evm::{ConsolidatedEvmSource, EvmBalanceSource};
pub use solana::SolanaBalanceSource;

/// Balance of one consolidated sub-chain (e.g. a rollup in the Ethereum group)
#[derive(Debug, Clone, Serialize)]
pub struct SubChainBalance {
    pub id: String,
    pub native_balance: f64,
}

/// One logical balance for a chain group
#[derive(Debug, Clone, Default)]
pub struct GroupBalance {
    pub native_balance: f64,
    /// Per-sub-chain breakdown; empty for single-endpoint chains
    pub sub_chains: Vec<SubChainBalance>,
}

/// A read-only treasury balance source for one chain group
#[async_trait]
pub trait BalanceSource: Send + Sync {
    fn chain(&self) -> Chain;
    async fn fetch(&self) -> Result<GroupBalance>;
}

/// Sum sub-chain balances into one logical group balance
pub fn consolidate(sub_chains: Vec<SubChainBalance>) -> GroupBalance {
    let native_balance = sub_chains.iter().map(|s| s.native_balance).sum();
    GroupBalance {
        native_balance,
        sub_chains,
    }
}

/// Build one balance source per enabled chain group from the configuration
pub fn build_sources(config: &Config) -> Result<Vec<Box<dyn BalanceSource>>> {
    let mut sources: Vec<Box<dyn BalanceSource>> = Vec::new();

    for spec in crate::chains::all_chains() {
        match spec.chain {
            Chain::Ethereum => {
                let endpoints: Vec<(String, String)> = config
                    .endpoints
                    .eth_rpc_urls
                    .iter()
                    .enumerate()
                    .map(|(i, url)| {
                        let id = ETH_SUB_CHAINS
                            .get(i)
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| format!("endpoint-{}", i));
                        (id, url.clone())
                    })
                    .collect();
                sources.push(Box::new(ConsolidatedEvmSource::new(
                    Chain::Ethereum,
                    &endpoints,
                    &config.addresses.evm,
                    config.fetch_timeout(),
                )?));
            }
            Chain::Bsc => {
                sources.push(Box::new(EvmBalanceSource::new(
                    Chain::Bsc,
                    &config.endpoints.bsc_rpc_url,
                    &config.addresses.evm,
                )?));
            }
            Chain::Solana => {
                sources.push(Box::new(SolanaBalanceSource::new(
                    &config.endpoints.solana_rpc_url,
                    &config.addresses.solana,
                )));
            }
            Chain::Bitcoin => {
                sources.push(Box::new(BitcoinBalanceSource::new(
                    &config.endpoints.bitcoin_api_url,
                    &config.addresses.bitcoin,
                )));
            }
        }
    }

    Ok(sources)
}
