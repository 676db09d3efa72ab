//! EVM balance sources
//!
//! A single-endpoint source for ordinary EVM chains and a consolidated
//! source for the Ethereum group, where one logical balance is the sum of
//! independent lookups against the mainnet and rollup endpoints.

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::warn;

use super::{consolidate, BalanceSource, GroupBalance, SubChainBalance};
use crate::chains::Chain;

const WEI_PER_ETHER: f64 = 1e18;

/// Convert a wei balance to whole native units, saturating at u128::MAX wei
pub fn wei_to_native(wei: U256) -> f64 {
    let clamped: u128 = wei.try_into().unwrap_or(u128::MAX);
    clamped as f64 / WEI_PER_ETHER
}

fn build_provider(rpc_url: &str) -> Result<RootProvider<Http<Client>>> {
    let parsed = rpc_url
        .parse()
        .map_err(|e| eyre!("Invalid RPC URL {}: {}", rpc_url, e))?;
    Ok(ProviderBuilder::new().on_http(parsed))
}

/// Single-endpoint EVM treasury balance source
pub struct EvmBalanceSource {
    chain: Chain,
    provider: RootProvider<Http<Client>>,
    address: Address,
}

impl EvmBalanceSource {
    pub fn new(chain: Chain, rpc_url: &str, address: &str) -> Result<Self> {
        Ok(Self {
            chain,
            provider: build_provider(rpc_url)?,
            address: Address::from_str(address).wrap_err("Invalid EVM treasury address")?,
        })
    }
}

#[async_trait]
impl BalanceSource for EvmBalanceSource {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn fetch(&self) -> Result<GroupBalance> {
        let wei = self.provider.get_balance(self.address).await?;
        Ok(GroupBalance {
            native_balance: wei_to_native(wei),
            sub_chains: Vec::new(),
        })
    }
}

/// Consolidated EVM group source: one logical balance summed across the
/// mainnet and rollup endpoints.
///
/// Each endpoint is fetched concurrently under its own timeout; an
/// unreachable endpoint contributes zero without failing the group.
pub struct ConsolidatedEvmSource {
    chain: Chain,
    endpoints: Vec<(String, RootProvider<Http<Client>>)>,
    address: Address,
    timeout: Duration,
}

impl ConsolidatedEvmSource {
    pub fn new(
        chain: Chain,
        endpoints: &[(String, String)],
        address: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(eyre!("Consolidated group for {} has no endpoints", chain));
        }
        let endpoints = endpoints
            .iter()
            .map(|(id, url)| Ok((id.clone(), build_provider(url)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            chain,
            endpoints,
            address: Address::from_str(address).wrap_err("Invalid EVM treasury address")?,
            timeout,
        })
    }
}

#[async_trait]
impl BalanceSource for ConsolidatedEvmSource {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn fetch(&self) -> Result<GroupBalance> {
        let fetches = self.endpoints.iter().map(|(id, provider)| async move {
            let native_balance =
                match tokio::time::timeout(self.timeout, provider.get_balance(self.address)).await
                {
                    Ok(Ok(wei)) => wei_to_native(wei),
                    Ok(Err(e)) => {
                        warn!(
                            chain = %self.chain,
                            sub_chain = %id,
                            error = %e,
                            "Sub-chain balance fetch failed, counting zero"
                        );
                        0.0
                    }
                    Err(_) => {
                        warn!(
                            chain = %self.chain,
                            sub_chain = %id,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "Sub-chain balance fetch timed out, counting zero"
                        );
                        0.0
                    }
                };
            SubChainBalance {
                id: id.clone(),
                native_balance,
            }
        });

        Ok(consolidate(futures::future::join_all(fetches).await))
    }
}
