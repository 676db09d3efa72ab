//! Static chain registry and sale allocation tables
//!
//! The registry is compiled in and immutable: which chains the sale runs on,
//! how the consolidated Ethereum group is composed, and how much of the token
//! supply (and USD raise cap) each mint chain carries. The redemption network
//! holds treasury funds but mints nothing, so it has no allocation entry.

use std::collections::HashMap;
use std::fmt;

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// Sub-chains consolidated into the logical Ethereum balance.
/// One balance endpoint per entry; the group reports the sum.
pub const ETH_SUB_CHAINS: [&str; 4] = ["ethereum", "base", "arbitrum", "optimism"];

/// A chain the treasury holds funds on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
    Bsc,
    Bitcoin,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Ethereum, Chain::Solana, Chain::Bsc, Chain::Bitcoin];

    /// Lowercase identifier used in URLs, metrics labels, and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
            Chain::Bsc => "bsc",
            Chain::Bitcoin => "bitcoin",
        }
    }

    /// Parse a lowercase chain identifier
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "ethereum" => Ok(Chain::Ethereum),
            "solana" => Ok(Chain::Solana),
            "bsc" => Ok(Chain::Bsc),
            "bitcoin" => Ok(Chain::Bitcoin),
            other => Err(eyre!("Unknown chain identifier: {}", other)),
        }
    }

    /// Native asset ticker symbol
    pub fn symbol(&self) -> &'static str {
        self.spec().symbol
    }

    /// Identifier used by the spot-price API
    pub fn price_id(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
            Chain::Bsc => "binancecoin",
            Chain::Bitcoin => "bitcoin",
        }
    }

    /// Static registry entry for this chain
    pub fn spec(&self) -> &'static ChainSpec {
        // CHAINS is ordered like Chain::ALL
        &CHAINS[*self as usize]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static per-chain registry entry
#[derive(Debug, Clone)]
pub struct ChainSpec {
    pub chain: Chain,
    pub display_name: &'static str,
    pub symbol: &'static str,
    /// Brand color, hex
    pub color: &'static str,
    /// Icon slug for the presentation layer
    pub icon: &'static str,
    pub enabled: bool,
    /// Tokens are claimed here rather than minted; excluded from allocation tables
    pub redemption_only: bool,
    /// Consolidated sub-chains (empty for single-endpoint chains)
    pub sub_chains: &'static [&'static str],
}

/// The full chain registry, ordered like [`Chain::ALL`]
pub static CHAINS: [ChainSpec; 4] = [
    ChainSpec {
        chain: Chain::Ethereum,
        display_name: "Ethereum",
        symbol: "ETH",
        color: "#627EEA",
        icon: "eth",
        enabled: true,
        redemption_only: false,
        sub_chains: &ETH_SUB_CHAINS,
    },
    ChainSpec {
        chain: Chain::Solana,
        display_name: "Solana",
        symbol: "SOL",
        color: "#9945FF",
        icon: "sol",
        enabled: true,
        redemption_only: false,
        sub_chains: &[],
    },
    ChainSpec {
        chain: Chain::Bsc,
        display_name: "BNB Chain",
        symbol: "BNB",
        color: "#F0B90B",
        icon: "bnb",
        enabled: true,
        redemption_only: false,
        sub_chains: &[],
    },
    ChainSpec {
        chain: Chain::Bitcoin,
        display_name: "Bitcoin",
        symbol: "BTC",
        color: "#F7931A",
        icon: "btc",
        enabled: true,
        redemption_only: true,
        sub_chains: &[],
    },
];

/// All enabled chains
pub fn all_chains() -> impl Iterator<Item = &'static ChainSpec> {
    CHAINS.iter().filter(|c| c.enabled)
}

/// Enabled chains that participate in minting (redemption networks excluded)
pub fn mint_chains() -> impl Iterator<Item = &'static ChainSpec> {
    all_chains().filter(|c| !c.redemption_only)
}

/// Fraction of total token supply allocated to a chain's sale.
/// Business parameters; the fractions are not required to sum to 1.
pub fn allocation_fraction(chain: Chain) -> f64 {
    match chain {
        Chain::Ethereum => 0.35,
        Chain::Solana => 0.30,
        Chain::Bsc => 0.15,
        Chain::Bitcoin => 0.0,
    }
}

/// Maximum USD raise for a chain's sale. Zero for redemption networks.
pub fn max_raise_usd(chain: Chain) -> f64 {
    match chain {
        Chain::Ethereum => 50_000_000.0,
        Chain::Solana => 40_000_000.0,
        Chain::Bsc => 20_000_000.0,
        Chain::Bitcoin => 0.0,
    }
}

/// Immutable snapshot of USD raised per chain.
///
/// Passed explicitly into every curve evaluation; replaced as a whole,
/// never partially mutated. The default snapshot carries the published
/// sale figures.
#[derive(Debug, Clone)]
pub struct RaisedSnapshot {
    raised: HashMap<Chain, f64>,
}

impl RaisedSnapshot {
    pub fn new(raised: impl IntoIterator<Item = (Chain, f64)>) -> Self {
        Self {
            raised: raised.into_iter().collect(),
        }
    }

    /// USD raised so far on a chain; zero for chains with no entry
    pub fn raised_usd(&self, chain: Chain) -> f64 {
        self.raised.get(&chain).copied().unwrap_or(0.0)
    }
}

impl Default for RaisedSnapshot {
    fn default() -> Self {
        Self::new([
            (Chain::Ethereum, 18_200_000.0),
            (Chain::Solana, 9_400_000.0),
            (Chain::Bsc, 3_100_000.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ordered_like_all() {
        for (i, chain) in Chain::ALL.iter().enumerate() {
            assert_eq!(CHAINS[i].chain, *chain);
            assert_eq!(chain.spec().chain, *chain);
        }
    }

    #[test]
    fn test_chain_id_round_trip() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_id(chain.as_str()).unwrap(), chain);
        }
        assert!(Chain::from_id("dogecoin").is_err());
    }

    #[test]
    fn test_mint_chains_exclude_redemption_network() {
        let mint: Vec<Chain> = mint_chains().map(|c| c.chain).collect();
        assert!(!mint.contains(&Chain::Bitcoin));
        assert_eq!(mint.len(), 3);
    }

    #[test]
    fn test_redemption_network_has_no_allocation() {
        assert_eq!(allocation_fraction(Chain::Bitcoin), 0.0);
        assert_eq!(max_raise_usd(Chain::Bitcoin), 0.0);
    }

    #[test]
    fn test_mint_chains_have_positive_caps() {
        for spec in mint_chains() {
            assert!(allocation_fraction(spec.chain) > 0.0);
            assert!(max_raise_usd(spec.chain) > 0.0);
        }
    }

    #[test]
    fn test_every_chain_has_price_id() {
        for chain in Chain::ALL {
            assert!(!chain.price_id().is_empty());
        }
    }

    #[test]
    fn test_ethereum_group_has_four_sub_chains() {
        assert_eq!(Chain::Ethereum.spec().sub_chains.len(), 4);
        assert!(Chain::Solana.spec().sub_chains.is_empty());
    }

    #[test]
    fn test_raised_snapshot_defaults_to_zero_for_missing_chain() {
        let snapshot = RaisedSnapshot::default();
        assert_eq!(snapshot.raised_usd(Chain::Bitcoin), 0.0);
        assert!(snapshot.raised_usd(Chain::Ethereum) > 0.0);
    }
}
