//! Solana treasury balance via JSON-RPC `getBalance`

use async_trait::async_trait;
use eyre::{eyre, Result};

use super::{BalanceSource, GroupBalance};
use crate::chains::Chain;

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Convert lamports to whole SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

pub struct SolanaBalanceSource {
    http: reqwest::Client,
    rpc_url: String,
    address: String,
}

impl SolanaBalanceSource {
    pub fn new(rpc_url: &str, address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.to_string(),
            address: address.to_string(),
        }
    }
}

#[async_trait]
impl BalanceSource for SolanaBalanceSource {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn fetch(&self) -> Result<GroupBalance> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [self.address],
        });

        let json: serde_json::Value = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let lamports = json["result"]["value"]
            .as_u64()
            .ok_or_else(|| eyre!("Malformed getBalance response: {}", json))?;

        Ok(GroupBalance {
            native_balance: lamports_to_sol(lamports),
            sub_chains: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(lamports_to_sol(0), 0.0);
        assert_eq!(lamports_to_sol(1_000_000_000), 1.0);
        assert_eq!(lamports_to_sol(1_500_000_000), 1.5);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_errors() {
        let source = SolanaBalanceSource::new("http://127.0.0.1:1", "11111111111111111111111111111111");
        assert!(source.fetch().await.is_err());
    }
}
