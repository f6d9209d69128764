//! Long/short portfolio buckets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Buy and sell buckets built from one ranked score vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Symbols scoring strictly above the upper threshold.
    pub buy: BTreeSet<Symbol>,
    /// Symbols scoring strictly below the lower threshold.
    pub sell: BTreeSet<Symbol>,
    /// Upper threshold (the `100 - top_pct` percentile).
    pub upper_threshold: f64,
    /// Lower threshold (the `bottom_pct` percentile).
    pub lower_threshold: f64,
}

impl Portfolio {
    /// Portfolio with no positions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            buy: BTreeSet::new(),
            sell: BTreeSet::new(),
            upper_threshold: f64::NAN,
            lower_threshold: f64::NAN,
        }
    }

    /// Whether the symbol is held long.
    #[must_use]
    pub fn is_long(&self, symbol: &str) -> bool {
        self.buy.contains(symbol)
    }

    /// Whether the symbol is held short.
    #[must_use]
    pub fn is_short(&self, symbol: &str) -> bool {
        self.sell.contains(symbol)
    }

    /// Total number of positions.
    #[must_use]
    pub fn n_positions(&self) -> usize {
        self.buy.len() + self.sell.len()
    }
}
