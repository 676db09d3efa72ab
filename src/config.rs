//! Service configuration
//!
//! Loaded from the environment (with a `.env` file if present). Every chain
//! endpoint and treasury address has a compiled-in public default so the
//! monitor runs out of the box; env vars override per deployment.

use std::env;
use std::time::Duration;

use eyre::{eyre, Result};
use url::Url;

use crate::prices::DEFAULT_PRICE_API_URL;

/// Consolidated Ethereum-group endpoints: mainnet plus rollups, summed into
/// one logical balance. Order matches [`crate::chains::ETH_SUB_CHAINS`].
const DEFAULT_ETH_RPC_URLS: &str = "https://eth.llamarpc.com,\
    https://mainnet.base.org,\
    https://arb1.arbitrum.io/rpc,\
    https://mainnet.optimism.io";
const DEFAULT_BSC_RPC_URL: &str = "https://bsc-dataseed.binance.org";
const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_BITCOIN_API_URL: &str = "https://blockstream.info/api";

const DEFAULT_EVM_TREASURY: &str = "0x4C9f66A2dDe6b58C9F3cD604Eb4288cA77D15a2B";
const DEFAULT_SOLANA_TREASURY: &str = "DM1XonYkXJCBbtPHUrkK2wJsx3XqrJumPfPcYkSg6oxP";
const DEFAULT_BITCOIN_TREASURY: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

fn default_refresh_interval_ms() -> u64 {
    60_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_funding_target_usd() -> f64 {
    150_000_000.0
}

fn default_port() -> u16 {
    9102
}

/// Per-chain balance endpoints
#[derive(Debug, Clone)]
pub struct ChainEndpoints {
    /// Consolidated Ethereum group, one URL per sub-chain
    pub eth_rpc_urls: Vec<String>,
    pub bsc_rpc_url: String,
    pub solana_rpc_url: String,
    pub bitcoin_api_url: String,
}

/// Treasury addresses per address scheme
#[derive(Debug, Clone)]
pub struct TreasuryAddresses {
    /// Shared across the Ethereum group and BSC
    pub evm: String,
    pub solana: String,
    pub bitcoin: String,
}

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance ID for multi-instance deployments
    pub instance_id: String,
    pub bind_address: String,
    pub port: u16,
    pub refresh_interval_ms: u64,
    /// Hard per-source timeout during aggregation
    pub fetch_timeout_ms: u64,
    pub funding_target_usd: f64,
    pub price_api_url: String,
    /// Bridge-status backend; the proxy endpoint is disabled when unset
    pub bridge_api_url: Option<String>,
    pub endpoints: ChainEndpoints,
    pub addresses: TreasuryAddresses,
}

/// Parse a comma-separated endpoint list into individual trimmed URLs
pub fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Built-in defaults, no environment consulted
    pub fn defaults() -> Self {
        Self {
            instance_id: default_instance_id(),
            bind_address: "0.0.0.0".to_string(),
            port: default_port(),
            refresh_interval_ms: default_refresh_interval_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            funding_target_usd: default_funding_target_usd(),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            bridge_api_url: None,
            endpoints: ChainEndpoints {
                eth_rpc_urls: parse_endpoints(DEFAULT_ETH_RPC_URLS),
                bsc_rpc_url: DEFAULT_BSC_RPC_URL.to_string(),
                solana_rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
                bitcoin_api_url: DEFAULT_BITCOIN_API_URL.to_string(),
            },
            addresses: TreasuryAddresses {
                evm: DEFAULT_EVM_TREASURY.to_string(),
                solana: DEFAULT_SOLANA_TREASURY.to_string(),
                bitcoin: DEFAULT_BITCOIN_TREASURY.to_string(),
            },
        }
    }

    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        let defaults = Self::defaults();
        let config = Self {
            instance_id: env::var("INSTANCE_ID").unwrap_or(defaults.instance_id),
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            refresh_interval_ms: env::var("REFRESH_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_interval_ms),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_ms),
            funding_target_usd: env::var("FUNDING_TARGET_USD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.funding_target_usd),
            price_api_url: env::var("PRICE_API_URL").unwrap_or(defaults.price_api_url),
            bridge_api_url: env::var("BRIDGE_API_URL").ok().filter(|s| !s.is_empty()),
            endpoints: ChainEndpoints {
                eth_rpc_urls: env::var("ETH_RPC_URLS")
                    .map(|raw| parse_endpoints(&raw))
                    .unwrap_or(defaults.endpoints.eth_rpc_urls),
                bsc_rpc_url: env::var("BSC_RPC_URL").unwrap_or(defaults.endpoints.bsc_rpc_url),
                solana_rpc_url: env::var("SOLANA_RPC_URL")
                    .unwrap_or(defaults.endpoints.solana_rpc_url),
                bitcoin_api_url: env::var("BITCOIN_API_URL")
                    .unwrap_or(defaults.endpoints.bitcoin_api_url),
            },
            addresses: TreasuryAddresses {
                evm: env::var("EVM_TREASURY_ADDRESS").unwrap_or(defaults.addresses.evm),
                solana: env::var("SOLANA_TREASURY_ADDRESS").unwrap_or(defaults.addresses.solana),
                bitcoin: env::var("BITCOIN_TREASURY_ADDRESS")
                    .unwrap_or(defaults.addresses.bitcoin),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms < 1000 {
            return Err(eyre!("REFRESH_INTERVAL_MS must be at least 1000"));
        }

        if self.fetch_timeout_ms == 0 {
            return Err(eyre!("FETCH_TIMEOUT_MS cannot be zero"));
        }

        if self.funding_target_usd <= 0.0 {
            return Err(eyre!("FUNDING_TARGET_USD must be positive"));
        }

        if self.endpoints.eth_rpc_urls.is_empty() {
            return Err(eyre!("ETH_RPC_URLS cannot be empty"));
        }

        for url in self
            .endpoints
            .eth_rpc_urls
            .iter()
            .chain([
                &self.endpoints.bsc_rpc_url,
                &self.endpoints.solana_rpc_url,
                &self.endpoints.bitcoin_api_url,
                &self.price_api_url,
            ])
            .chain(self.bridge_api_url.iter())
        {
            Url::parse(url).map_err(|e| eyre!("Invalid endpoint URL {}: {}", url, e))?;
        }

        // EVM treasury address: 0x + 40 hex chars
        let evm = &self.addresses.evm;
        if evm.len() != 42
            || !evm.starts_with("0x")
            || !evm[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(eyre!(
                "EVM_TREASURY_ADDRESS must be a valid hex address (42 chars with 0x prefix)"
            ));
        }

        // Base58 Solana addresses are 32-44 chars
        let sol_len = self.addresses.solana.len();
        if !(32..=44).contains(&sol_len) {
            return Err(eyre!(
                "SOLANA_TREASURY_ADDRESS must be a base58 address (32-44 chars)"
            ));
        }

        if self.addresses.bitcoin.is_empty() {
            return Err(eyre!("BITCOIN_TREASURY_ADDRESS cannot be empty"));
        }

        Ok(())
    }
}

fn default_instance_id() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| format!("treasury-monitor-{}", std::process::id()))
}
