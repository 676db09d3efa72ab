//! Bitcoin treasury balance via an Esplora-style explorer API
//!
//! The redemption network has no JSON-RPC endpoint we can hit anonymously,
//! so the balance comes from a public block-explorer address lookup:
//! confirmed balance = funded minus spent transaction outputs.

use async_trait::async_trait;
use eyre::{eyre, Result};

use super::{BalanceSource, GroupBalance};
use crate::chains::Chain;

const SATS_PER_BTC: f64 = 100_000_000.0;

/// Convert satoshis to whole BTC
pub fn sats_to_btc(sats: u64) -> f64 {
    sats as f64 / SATS_PER_BTC
}

pub struct BitcoinBalanceSource {
    http: reqwest::Client,
    api_url: String,
    address: String,
}

impl BitcoinBalanceSource {
    pub fn new(api_url: &str, address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            address: address.to_string(),
        }
    }
}

#[async_trait]
impl BalanceSource for BitcoinBalanceSource {
    fn chain(&self) -> Chain {
        Chain::Bitcoin
    }

    async fn fetch(&self) -> Result<GroupBalance> {
        let url = format!("{}/address/{}", self.api_url, self.address);

        let json: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let stats = &json["chain_stats"];
        let funded = stats["funded_txo_sum"]
            .as_u64()
            .ok_or_else(|| eyre!("Malformed address response: missing funded_txo_sum"))?;
        let spent = stats["spent_txo_sum"]
            .as_u64()
            .ok_or_else(|| eyre!("Malformed address response: missing spent_txo_sum"))?;

        Ok(GroupBalance {
            native_balance: sats_to_btc(funded.saturating_sub(spent)),
            sub_chains: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sats_to_btc() {
        assert_eq!(sats_to_btc(0), 0.0);
        assert_eq!(sats_to_btc(100_000_000), 1.0);
        assert_eq!(sats_to_btc(12_345_678), 0.12345678);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() {
        let source = BitcoinBalanceSource::new(
            "http://127.0.0.1:1",
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
        );
        assert!(source.fetch().await.is_err());
    }
}
