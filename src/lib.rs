//! Treasury Monitor - Library interface
//!
//! Read-only monitoring service for the multi-chain token sale treasury:
//!
//! - **Chains** - Static chain registry, sale allocation tables, raised-amount snapshots
//! - **Curve** - Pure bonding-curve price calculator
//! - **Prices** - Batch USD spot-price lookup with an offline fallback table
//! - **Sources** - Per-chain treasury balance fetchers (EVM, Solana, Bitcoin)
//! - **Aggregator** - Concurrent fan-out producing a consolidated treasury snapshot
//! - **Refresher** - Periodic refresh task exposing the latest snapshot to consumers
//! - **Server** - HTTP API for health, metrics, and snapshot reads

pub mod aggregator;
pub mod bridge;
pub mod chains;
pub mod config;
pub mod curve;
pub mod metrics;
pub mod prices;
pub mod refresher;
pub mod server;
pub mod sources;

pub use aggregator::{ChainBalance, TreasuryAggregator, TreasuryState};
pub use chains::{Chain, ChainSpec, RaisedSnapshot};
pub use config::Config;
pub use curve::PriceCurve;
pub use refresher::{TreasuryHandle, TreasuryRefresher, TreasuryView};
pub use sources::{BalanceSource, GroupBalance, SubChainBalance};
