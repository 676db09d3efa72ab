//! Bonding-curve price calculator
//!
//! Pure functions mapping (chain, USD raised) to the current unit price:
//! a linear interpolation between a floor and a ceiling price, parameterized
//! by sale progress on that chain. No I/O, no state; every input comes in as
//! an explicit argument so the math is independently testable.

use crate::chains::{self, Chain, RaisedSnapshot};

pub const DEFAULT_FLOOR_PRICE_USD: f64 = 0.01;
pub const DEFAULT_CEILING_PRICE_USD: f64 = 1.00;

/// Linear bonding curve between a floor and a ceiling unit price
#[derive(Debug, Clone, Copy)]
pub struct PriceCurve {
    pub floor_usd: f64,
    pub ceiling_usd: f64,
}

impl Default for PriceCurve {
    fn default() -> Self {
        Self {
            floor_usd: DEFAULT_FLOOR_PRICE_USD,
            ceiling_usd: DEFAULT_CEILING_PRICE_USD,
        }
    }
}

impl PriceCurve {
    /// Current unit price given USD raised against a raise cap.
    ///
    /// `price = floor + (ceiling - floor) * min(raised / max, 1)`.
    /// A zero or unknown cap collapses to the ceiling (fully priced);
    /// raising past the cap clamps, never extrapolates above the ceiling.
    pub fn price(&self, raised_usd: f64, max_raise_usd: f64) -> f64 {
        if max_raise_usd <= 0.0 {
            return self.ceiling_usd;
        }
        let progress = (raised_usd / max_raise_usd).clamp(0.0, 1.0);
        self.floor_usd + (self.ceiling_usd - self.floor_usd) * progress
    }

    /// Tokens purchasable for a USD amount at the current price.
    /// Returns 0 when the price is 0 rather than dividing by zero.
    pub fn tokens_for_usd(&self, raised_usd: f64, max_raise_usd: f64, usd_amount: f64) -> f64 {
        let price = self.price(raised_usd, max_raise_usd);
        if price <= 0.0 {
            return 0.0;
        }
        usd_amount / price
    }

    /// Current unit price for a mint chain given a raised-amount snapshot
    pub fn price_for_chain(&self, chain: Chain, raised: &RaisedSnapshot) -> f64 {
        self.price(raised.raised_usd(chain), chains::max_raise_usd(chain))
    }

    /// Tokens purchasable on a chain for a USD amount
    pub fn tokens_for_chain(&self, chain: Chain, raised: &RaisedSnapshot, usd_amount: f64) -> f64 {
        self.tokens_for_usd(
            raised.raised_usd(chain),
            chains::max_raise_usd(chain),
            usd_amount,
        )
    }
}

/// Sale progress in percent, clamped to [0, 100]. Zero when the cap is zero.
pub fn progress_percent(raised_usd: f64, max_raise_usd: f64) -> f64 {
    if max_raise_usd <= 0.0 {
        return 0.0;
    }
    (raised_usd / max_raise_usd).clamp(0.0, 1.0) * 100.0
}

/// Sale progress for a chain given a raised-amount snapshot
pub fn chain_progress_percent(chain: Chain, raised: &RaisedSnapshot) -> f64 {
    progress_percent(raised.raised_usd(chain), chains::max_raise_usd(chain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> PriceCurve {
        PriceCurve {
            floor_usd: 0.01,
            ceiling_usd: 1.00,
        }
    }

    #[test]
    fn test_half_raised_scenario() {
        // raised $50M of a $100M cap: price = 0.01 + 0.99 * 0.5
        let price = curve().price(50_000_000.0, 100_000_000.0);
        assert!((price - 0.505).abs() < 1e-12);
        assert_eq!(progress_percent(50_000_000.0, 100_000_000.0), 50.0);
    }

    #[test]
    fn test_zero_cap_collapses_to_ceiling() {
        assert_eq!(curve().price(123.0, 0.0), 1.00);
        assert_eq!(progress_percent(123.0, 0.0), 0.0);
    }

    #[test]
    fn test_raised_past_cap_clamps_to_ceiling() {
        let c = curve();
        assert_eq!(c.price(150_000_000.0, 100_000_000.0), 1.00);
        assert_eq!(progress_percent(150_000_000.0, 100_000_000.0), 100.0);
        assert_eq!(c.price(100_000_000.0, 100_000_000.0), 1.00);
    }

    #[test]
    fn test_nothing_raised_sits_at_floor() {
        assert_eq!(curve().price(0.0, 100_000_000.0), 0.01);
        assert_eq!(progress_percent(0.0, 100_000_000.0), 0.0);
    }

    #[test]
    fn test_price_monotonically_non_decreasing_in_raised() {
        let c = curve();
        let max = 80_000_000.0;
        let mut last = f64::MIN;
        for step in 0..=20 {
            let raised = max * step as f64 / 10.0; // runs past the cap
            let price = c.price(raised, max);
            assert!(price >= last, "price dipped at raised={}", raised);
            last = price;
        }
    }

    #[test]
    fn test_tokens_for_zero_usd_is_zero() {
        assert_eq!(curve().tokens_for_usd(10_000.0, 100_000.0, 0.0), 0.0);
    }

    #[test]
    fn test_tokens_decrease_as_price_rises() {
        let c = curve();
        let max = 100_000_000.0;
        let early = c.tokens_for_usd(0.0, max, 1000.0);
        let mid = c.tokens_for_usd(max / 2.0, max, 1000.0);
        let late = c.tokens_for_usd(max, max, 1000.0);
        assert!(early > mid && mid > late);
        // at the floor: $1000 / $0.01
        assert!((early - 100_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_price_never_divides() {
        let degenerate = PriceCurve {
            floor_usd: 0.0,
            ceiling_usd: 0.0,
        };
        assert_eq!(degenerate.tokens_for_usd(0.0, 100.0, 50.0), 0.0);
    }

    #[test]
    fn test_chain_wrappers_use_allocation_tables() {
        let c = PriceCurve::default();
        let raised = RaisedSnapshot::new([(Chain::Ethereum, 25_000_000.0)]);
        // $25M of the $50M Ethereum cap: halfway up the curve
        assert!((c.price_for_chain(Chain::Ethereum, &raised) - 0.505).abs() < 1e-12);
        assert_eq!(chain_progress_percent(Chain::Ethereum, &raised), 50.0);
        // redemption network: zero cap, ceiling price, zero progress
        assert_eq!(c.price_for_chain(Chain::Bitcoin, &raised), 1.00);
        assert_eq!(chain_progress_percent(Chain::Bitcoin, &raised), 0.0);
    }
}
